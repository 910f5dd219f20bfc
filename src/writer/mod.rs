//! Writing PDF documents.
//!
//! A [`Writer`] holds a table of indirect objects, numbered from 1. It can be created empty,
//! filled from a [`Reader`], and extended by cloning objects from other documents. The table is
//! then written out either as a complete new file or, for a writer created by
//! [`Writer::incremental()`], as an update appended to the original file.

mod serialize;
mod clone;
mod dedup;

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, Seek, Write};

use sha2::{Digest, Sha256};

use crate::base::*;
use crate::base::types::*;
use crate::codecs::{self, Filter};
use crate::config::WriteOptions;
use crate::crypto::SecurityHandler;
use crate::reader::Reader;

pub use clone::CloneOptions;
use serialize::{content_hash, write_indirect, write_object};

pub struct Writer {
    doc: DocId,
    objects: Vec<Option<Object>>,
    gens: Vec<ObjGen>,
    root: Option<ObjRef>,
    info: Option<ObjRef>,
    id: Option<[Vec<u8>; 2]>,
    encrypt: Option<Object>,
    security: Option<Box<dyn SecurityHandler>>,
    translations: HashMap<DocId, HashMap<(ObjNum, ObjGen), ObjNum>>,
    options: WriteOptions,
    version: (u8, u8),
    snapshot: Option<Snapshot>,
}

/// The state of a document at the time it was loaded for an incremental update.
struct Snapshot {
    hashes: Vec<Option<[u8; 32]>>,
    original: Vec<u8>,
    startxref: Offset,
    start: Offset,
    size: ObjNum,
}

impl Writer {
    /// Creates a document containing only a catalog and an empty page tree.
    pub fn new() -> Writer {
        Self::with_options(WriteOptions::default())
    }

    pub fn with_options(options: WriteOptions) -> Writer {
        let mut writer = Writer::empty(DocId::new(), options);
        let root = ObjRef::in_doc(writer.doc, 1, 0);
        let pages = ObjRef::in_doc(writer.doc, 2, 0);
        writer.add_object(Object::Dict(Dict::from(vec![
            (Name::from("Type"), Object::new_name(b"Catalog")),
            (Name::from("Pages"), Object::Ref(pages)),
        ])));
        writer.add_object(Object::Dict(Dict::from(vec![
            (Name::from("Type"), Object::new_name(b"Pages")),
            (Name::from("Kids"), Object::Array(vec![])),
            (Name::from("Count"), Object::new_int(0)),
        ])));
        writer.root = Some(root);
        writer
    }

    fn empty(doc: DocId, options: WriteOptions) -> Writer {
        Writer {
            doc,
            objects: Vec::new(),
            gens: Vec::new(),
            root: None,
            info: None,
            id: None,
            encrypt: None,
            security: None,
            translations: HashMap::new(),
            options,
            version: (1, 7),
            snapshot: None,
        }
    }

    /// Copies all objects of a document, keeping their numbers and generations, for writing it as
    /// a new file.
    ///
    /// Cross-reference streams and object streams are not copied, the objects contained in the
    /// latter are. The writer shares the [`DocId`] of the reader, so references found in the
    /// copied objects stay valid.
    pub fn from_reader<T: BufRead + Seek>(reader: &Reader<T>) -> Result<Writer, Error> {
        let mut writer = Writer::empty(reader.doc(), WriteOptions::default());
        writer.version = reader.version();
        for (objref, res) in reader.objects() {
            let obj = res?;
            if objref.num == 0 {
                log::warn!("Skipping object number 0.");
                continue;
            }
            if obj.has_type(b"XRef") || obj.has_type(b"ObjStm") {
                continue;
            }
            writer.set_object(&objref, (*obj).clone())?;
        }
        let trailer = reader.trailer();
        writer.root = writer.trailer_ref(trailer.lookup(b"Root"));
        writer.info = writer.trailer_ref(trailer.lookup(b"Info"));
        writer.id = parse_id(trailer.lookup(b"ID"));
        writer.encrypt = trailer.get(b"Encrypt").cloned();
        log::debug!("Copied {} objects", writer.objects.iter().flatten().count());
        Ok(writer)
    }

    /// Like [`Writer::from_reader()`], but [`Writer::write()`] will append an incremental update
    /// to the original file instead of writing a new one. Only objects which are new or changed
    /// at that point are written.
    ///
    /// Fails if the cross-reference table of `reader` had to be reconstructed, as there is no
    /// valid section the update could refer to.
    pub fn incremental<T: BufRead + Seek>(reader: &Reader<T>) -> Result<Writer, Error> {
        let startxref = reader.startxref()
            .ok_or_else(|| Error::WriteIntegrity("incremental update of a file with a broken cross-reference chain".into()))?;
        let mut writer = Self::from_reader(reader)?;
        // Object and cross-reference streams are not copied but their numbers stay in use.
        let size = reader.xref().size;
        let reserved = size.saturating_sub(1) as usize;
        if writer.objects.len() < reserved {
            writer.objects.resize(reserved, None);
            writer.gens.resize(reserved, 0);
        }
        let hashes = writer.objects.iter()
            .map(|obj| obj.as_ref().and_then(|obj| content_hash(obj, writer.doc)))
            .collect();
        writer.snapshot = Some(Snapshot {
            hashes,
            original: reader.raw_bytes()?.to_vec(),
            startxref,
            start: reader.header().start,
            size: reader.xref().size,
        });
        Ok(writer)
    }

    fn trailer_ref(&mut self, obj: &Object) -> Option<ObjRef> {
        match obj {
            Object::Ref(objref) => Some(*objref),
            Object::Null => None,
            obj => Some(self.add_object(obj.clone()))
        }
    }

    pub fn doc(&self) -> DocId {
        self.doc
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: WriteOptions) {
        self.options = options;
    }

    /// The version written in the header.
    pub fn version(&self) -> (u8, u8) {
        self.options.version.unwrap_or(self.version)
    }

    pub fn is_incremental(&self) -> bool {
        self.snapshot.is_some()
    }

    fn slot(&self, objref: &ObjRef) -> Option<usize> {
        if !objref.belongs_to(self.doc) || objref.num == 0 {
            return None;
        }
        let ix = (objref.num - 1) as usize;
        (self.gens.get(ix) == Some(&objref.gen)).then_some(ix)
    }

    fn local_ref(&self, num: ObjNum) -> ObjRef {
        let gen = self.gens.get((num - 1) as usize).copied().unwrap_or(0);
        ObjRef::in_doc(self.doc, num, gen)
    }

    /// Appends an object to the table and returns a reference to it.
    pub fn add_object(&mut self, obj: Object) -> ObjRef {
        self.objects.push(Some(obj));
        self.gens.push(0);
        ObjRef::in_doc(self.doc, self.objects.len() as ObjNum, 0)
    }

    pub fn get_object(&self, objref: &ObjRef) -> Option<&Object> {
        self.objects[self.slot(objref)?].as_ref()
    }

    pub fn get_object_mut(&mut self, objref: &ObjRef) -> Option<&mut Object> {
        let ix = self.slot(objref)?;
        self.objects[ix].as_mut()
    }

    /// Places an object under the number and generation of `objref`, replacing whatever was
    /// there. The table grows as needed.
    pub fn set_object(&mut self, objref: &ObjRef, obj: Object) -> Result<(), Error> {
        if !objref.belongs_to(self.doc) {
            return Err(Error::WriteIntegrity(format!("reference {objref} belongs to another document")));
        }
        if objref.num == 0 {
            return Err(Error::WriteIntegrity("object number 0 is reserved".into()));
        }
        let ix = (objref.num - 1) as usize;
        if ix >= self.objects.len() {
            self.objects.resize(ix + 1, None);
            self.gens.resize(ix + 1, 0);
        }
        self.objects[ix] = Some(obj);
        self.gens[ix] = objref.gen;
        Ok(())
    }

    /// Removes an object from the table. Its number becomes free.
    pub fn remove_object(&mut self, objref: &ObjRef) -> Option<Object> {
        let ix = self.slot(objref)?;
        self.objects[ix].take()
    }

    /// Iterates over all objects in the table.
    pub fn objects(&self) -> impl Iterator<Item = (ObjRef, &Object)> + '_ {
        self.objects.iter()
            .zip(&self.gens)
            .enumerate()
            .filter_map(|(ix, (obj, &gen))| Some((ObjRef::in_doc(self.doc, ix as ObjNum + 1, gen), obj.as_ref()?)))
    }

    /// The document catalog.
    pub fn root(&self) -> Option<ObjRef> {
        self.root
    }

    pub fn set_root(&mut self, root: ObjRef) {
        self.root = Some(root);
    }

    /// The document information dictionary.
    pub fn info(&self) -> Option<ObjRef> {
        self.info
    }

    pub fn set_info(&mut self, info: Option<ObjRef>) {
        self.info = info;
    }

    /// The file identifier, `/ID` in the trailer.
    pub fn id(&self) -> Option<&[Vec<u8>; 2]> {
        self.id.as_ref()
    }

    /// Sets the file identifier. If none is set, a full write derives one from the contents.
    pub fn set_id(&mut self, id: Option<[Vec<u8>; 2]>) {
        self.id = id;
    }

    /// Installs a security handler, which is used to encrypt every object on output. `encrypt`
    /// becomes the `/Encrypt` entry of the trailer; if it is a reference, the object it points to
    /// is written unencrypted.
    pub fn set_security_handler(&mut self, handler: Box<dyn SecurityHandler>, encrypt: Object) {
        self.security = Some(handler);
        self.encrypt = Some(encrypt);
    }

    /// Appends a page to the page tree under the document catalog, updating `/Kids` and `/Count`
    /// there and `/Parent` in the page.
    pub fn add_page(&mut self, page: ObjRef) -> Result<(), Error> {
        let root = self.root
            .ok_or_else(|| Error::WriteIntegrity("no document catalog".into()))?;
        let pages_ref = self.get_object(&root)
            .and_then(Object::dict)
            .and_then(|dict| dict.lookup(b"Pages").as_objref())
            .copied()
            .ok_or_else(|| Error::WriteIntegrity("document catalog without a page tree".into()))?;
        let page_dict = self.get_object_mut(&page)
            .and_then(Object::as_dict_mut)
            .ok_or_else(|| Error::WriteIntegrity(format!("{page} is not a page dictionary")))?;
        if !page_dict.contains_key(b"Type") {
            page_dict.insert("Type", Object::new_name(b"Page"));
        }
        page_dict.insert("Parent", Object::Ref(pages_ref));
        let pages = self.get_object_mut(&pages_ref)
            .and_then(Object::as_dict_mut)
            .ok_or_else(|| Error::WriteIntegrity(format!("page tree root {pages_ref} is not a dictionary")))?;
        match pages.get_mut(b"Kids") {
            Some(Object::Array(kids)) => kids.push(Object::Ref(page)),
            _ => { pages.insert("Kids", Object::Array(vec![Object::Ref(page)])); }
        }
        let count = pages.lookup(b"Count").num_value::<i64>().unwrap_or(0);
        pages.insert("Count", Object::new_int(count + 1));
        Ok(())
    }

    /// Writes the document. A writer created by [`Writer::incremental()`] appends an update to
    /// the original file, any other writes a complete file.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        match &self.snapshot {
            Some(snapshot) => self.write_incremental(snapshot, out),
            None => self.write_full(out)
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    fn check_root(&self) -> Result<ObjRef, Error> {
        match self.root {
            Some(root) if self.get_object(&root).is_some() => Ok(root),
            Some(root) => Err(Error::WriteIntegrity(format!("document catalog {root} missing"))),
            None => Err(Error::WriteIntegrity("no document catalog".into()))
        }
    }

    fn check_security(&self) -> Result<(), Error> {
        if self.encrypt.is_some() && self.security.is_none() {
            Err(Error::EncryptionRequired)
        } else {
            Ok(())
        }
    }

    fn encrypted<'a>(&self, obj: &'a Object, num: ObjNum, gen: ObjGen) -> Result<Cow<'a, Object>, Error> {
        match (&self.security, &self.encrypt) {
            (Some(handler), Some(encrypt)) if encrypt.as_objref().map_or(true, |objref| objref.num != num) =>
                Ok(Cow::Owned(handler.encrypt_object(obj.clone(), num, gen)?)),
            _ => Ok(Cow::Borrowed(obj))
        }
    }

    fn trailer_entries(&self, dict: &mut Dict, root: ObjRef, id: Option<&[Vec<u8>; 2]>) {
        dict.insert("Root", Object::Ref(root));
        if let Some(info) = self.info {
            dict.insert("Info", Object::Ref(info));
        }
        if let Some([first, second]) = id {
            dict.insert("ID", Object::Array(vec![
                Object::ByteString(first.clone()),
                Object::ByteString(second.clone())
            ]));
        }
        if let Some(encrypt) = &self.encrypt {
            dict.insert("Encrypt", encrypt.clone());
        }
    }

    /// Writes a complete file with a classical cross-reference table. Every object keeps its
    /// number but gets generation 0.
    pub fn write_full<W: Write>(&self, out: &mut W) -> Result<(), Error> {
        let root = self.check_root()?;
        self.check_security()?;
        let doc = self.doc;
        let mut map = |objref: &ObjRef| {
            if objref.belongs_to(doc) {
                Ok((objref.num, 0))
            } else {
                Err(foreign(objref))
            }
        };

        let (major, minor) = self.version();
        let mut buf = Vec::new();
        writeln!(buf, "%PDF-{major}.{minor}")?;
        buf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(self.objects.len());
        for (ix, obj) in self.objects.iter().enumerate() {
            let Some(obj) = obj else {
                offsets.push(None);
                continue;
            };
            let num = ix as ObjNum + 1;
            offsets.push(Some(buf.len() as Offset));
            let obj = self.encrypted(obj, num, 0)?;
            write_indirect(&mut buf, num, 0, &obj, &mut map)?;
        }

        let id = match &self.id {
            Some(id) => id.clone(),
            None => {
                let digest = Sha256::digest(&buf);
                [digest[..16].to_vec(), digest[..16].to_vec()]
            }
        };

        let startxref = buf.len();
        let free = offsets.iter()
            .enumerate()
            .filter(|(_, offset)| offset.is_none())
            .map(|(ix, _)| ix as ObjNum + 1)
            .collect::<Vec<_>>();
        let mut next_free = free.iter().copied().skip(1);
        writeln!(buf, "xref\n0 {}", offsets.len() + 1)?;
        write!(buf, "{:010} 65535 f \n", free.first().copied().unwrap_or(0))?;
        for offset in &offsets {
            match offset {
                Some(offset) => write!(buf, "{offset:010} 00000 n \n")?,
                None => write!(buf, "{:010} 00000 f \n", next_free.next().unwrap_or(0))?
            }
        }

        let mut trailer = Dict::new();
        trailer.insert("Size", Object::new_int(offsets.len() as i64 + 1));
        self.trailer_entries(&mut trailer, root, Some(&id));
        buf.extend_from_slice(b"trailer\n");
        write_object(&mut buf, &Object::Dict(trailer), &mut map)?;
        write!(buf, "\nstartxref\n{startxref}\n%%EOF\n")?;
        log::debug!("Writing {} objects, {} free", offsets.len() - free.len(), free.len());
        out.write_all(&buf)?;
        Ok(())
    }

    fn write_incremental<W: Write>(&self, snapshot: &Snapshot, out: &mut W) -> Result<(), Error> {
        let root = self.check_root()?;
        self.check_security()?;
        let doc = self.doc;
        let mut map = |objref: &ObjRef| {
            if objref.belongs_to(doc) {
                Ok((objref.num, objref.gen))
            } else {
                Err(foreign(objref))
            }
        };

        let mut buf = snapshot.original.clone();
        if !buf.ends_with(b"\n") && !buf.ends_with(b"\r") {
            buf.push(b'\n');
        }
        let start = snapshot.start as usize;

        let mut entries = BTreeMap::new();
        for ix in 0..self.objects.len().max(snapshot.hashes.len()) {
            let num = ix as ObjNum + 1;
            let before = snapshot.hashes.get(ix).copied().flatten();
            let gen = self.gens.get(ix).copied().unwrap_or(0);
            match self.objects.get(ix).and_then(Option::as_ref) {
                Some(obj) => {
                    if before.is_some() && content_hash(obj, doc) == before {
                        continue;
                    }
                    entries.insert(num, Record::Used { gen, offset: (buf.len() - start) as Offset });
                    let obj = self.encrypted(obj, num, gen)?;
                    write_indirect(&mut buf, num, gen, &obj, &mut map)?;
                },
                None if before.is_some() => {
                    entries.insert(num, Record::Free { gen: gen.saturating_add(1), next: 0 });
                },
                None => ()
            }
        }
        log::debug!("Incremental update of {} objects", entries.len());

        let xref_num = (self.objects.len() as ObjNum + 1).max(snapshot.size);
        let xref_offset = (buf.len() - start) as Offset;
        entries.insert(xref_num, Record::Used { gen: 0, offset: xref_offset });
        let (index, width, data) = xref_stream_data(&entries);

        let mut dict = Dict::new();
        dict.insert("Type", Object::new_name(b"XRef"));
        dict.insert("Size", Object::new_int(xref_num as i64 + 1));
        dict.insert("Index", Object::Array(index.into_iter().map(|n| Object::new_int(n as i64)).collect()));
        dict.insert("W", Object::Array(vec![Object::new_int(1), Object::new_int(width as i64), Object::new_int(2)]));
        dict.insert("Prev", Object::new_int(snapshot.startxref as i64));
        self.trailer_entries(&mut dict, root, self.id.as_ref());
        let data = if self.options.compress_xref_stream {
            dict.insert("Filter", Object::new_name(b"FlateDecode"));
            codecs::encode(&data, &[Filter::Flate(Dict::new())])?
        } else {
            data
        };
        write_indirect(&mut buf, xref_num, 0, &Object::Stream(Stream::new(dict, data)), &mut map)?;
        write!(buf, "startxref\n{xref_offset}\n%%EOF\n")?;
        out.write_all(&buf)?;
        Ok(())
    }
}

impl Default for Writer {
    fn default() -> Writer {
        Writer::new()
    }
}

impl Resolver for Writer {
    fn resolve_ref(&self, objref: &ObjRef) -> Result<Object, Error> {
        if !objref.belongs_to(self.doc) {
            return Err(Error::ObjectNotFound(*objref));
        }
        Ok(self.get_object(objref).cloned().unwrap_or(Object::Null))
    }
}

fn foreign(objref: &ObjRef) -> Error {
    Error::WriteIntegrity(format!("reference {objref} belongs to another document"))
}

fn parse_id(obj: &Object) -> Option<[Vec<u8>; 2]> {
    match obj.as_array()?.as_slice() {
        [first, second] => Some([first.as_string()?.to_vec(), second.as_string()?.to_vec()]),
        _ => None
    }
}

/// Builds the `/Index` array, the width of the second field and the binary records of a
/// cross-reference stream.
fn xref_stream_data(entries: &BTreeMap<ObjNum, Record>) -> (Vec<ObjNum>, usize, Vec<u8>) {
    let fields = entries.iter()
        .map(|(&num, rec)| match *rec {
            Record::Free { gen, next } => (num, 0u8, next as u64, gen),
            Record::Used { gen, offset } => (num, 1, offset, gen),
            Record::Compr { num_within, index } => (num, 2, num_within as u64, index as ObjGen)
        })
        .collect::<Vec<_>>();
    let max = fields.iter().map(|&(_, _, field, _)| field).max().unwrap_or(0);
    let width = (u64::BITS - max.leading_zeros()).div_ceil(8).max(1) as usize;

    let mut index = Vec::new();
    let mut data = Vec::with_capacity(fields.len() * (width + 3));
    let mut run: Option<(ObjNum, ObjNum)> = None;
    for (num, tpe, field, gen) in fields {
        data.push(tpe);
        data.extend_from_slice(&field.to_be_bytes()[8 - width..]);
        data.extend_from_slice(&gen.to_be_bytes());
        run = match run {
            Some((first, count)) if first + count == num => Some((first, count + 1)),
            Some((first, count)) => {
                index.extend([first, count]);
                Some((num, 1))
            },
            None => Some((num, 1))
        };
    }
    if let Some((first, count)) = run {
        index.extend([first, count]);
    }
    (index, width, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadOptions;

    #[test]
    fn test_new() {
        let writer = Writer::new();
        let root = writer.root().unwrap();
        assert_eq!(root.num, 1);
        let catalog = writer.get_object(&root).unwrap();
        assert!(catalog.has_type(b"Catalog"));
        let pages = catalog.dict().unwrap().lookup(b"Pages").as_objref().unwrap();
        assert!(writer.get_object(pages).unwrap().has_type(b"Pages"));
    }

    #[test]
    fn test_object_table() {
        let mut writer = Writer::new();
        let objref = writer.add_object(Object::new_int(5));
        assert_eq!(objref.num, 3);
        assert_eq!(writer.get_object(&objref), Some(&Object::new_int(5)));
        assert_eq!(writer.get_object(&ObjRef::new(3, 0)), Some(&Object::new_int(5)));
        assert_eq!(writer.get_object(&ObjRef::new(3, 1)), None);
        assert_eq!(writer.get_object(&ObjRef::in_doc(DocId::new(), 3, 0)), None);

        *writer.get_object_mut(&objref).unwrap() = Object::Bool(true);
        assert_eq!(writer.resolve_ref(&objref).unwrap(), Object::Bool(true));

        writer.set_object(&ObjRef::new(6, 2), Object::Null).unwrap();
        assert_eq!(writer.objects().count(), 4);
        assert_eq!(writer.get_object(&ObjRef::new(6, 2)), Some(&Object::Null));
        assert!(writer.get_object(&ObjRef::new(5, 0)).is_none());
        assert!(matches!(writer.set_object(&ObjRef::new(0, 0), Object::Null), Err(Error::WriteIntegrity(_))));

        assert_eq!(writer.remove_object(&objref), Some(Object::Bool(true)));
        assert_eq!(writer.remove_object(&objref), None);
        assert_eq!(writer.resolve_ref(&objref).unwrap(), Object::Null);
    }

    #[test]
    fn test_add_page() {
        let mut writer = Writer::new();
        let page = writer.add_object(Object::Dict(Dict::new()));
        writer.add_page(page).unwrap();
        let page2 = writer.add_object(Object::Dict(Dict::new()));
        writer.add_page(page2).unwrap();
        let pages = writer.get_object(&ObjRef::new(2, 0)).unwrap().dict().unwrap();
        assert_eq!(pages.lookup(b"Count"), &Object::new_int(2));
        assert_eq!(pages.lookup(b"Kids"), &Object::Array(vec![Object::Ref(page), Object::Ref(page2)]));
        let page = writer.get_object(&page).unwrap();
        assert!(page.has_type(b"Page"));
        assert_eq!(page.dict().unwrap().lookup(b"Parent").as_objref().map(|r| r.num), Some(2));

        let bad = writer.add_object(Object::new_int(1));
        assert!(matches!(writer.add_page(bad), Err(Error::WriteIntegrity(_))));
    }

    #[test]
    fn test_write_full() {
        let mut writer = Writer::new();
        let removed = writer.add_object(Object::new_int(1));
        writer.add_object(Object::new_string(b"kept"));
        writer.remove_object(&removed);
        writer.set_id(Some([b"ab".to_vec(), b"cd".to_vec()]));
        let out = writer.to_bytes().unwrap();
        assert!(out.starts_with(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n1 0 obj\n"));
        assert!(out.ends_with(b"%%EOF\n"));
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("xref\n0 5\n0000000003 65535 f \n"));
        assert!(text.contains("0000000000 00000 f \n"));
        assert!(text.contains("/Size 5 /Root 1 0 R /ID [<6162> <6364>]"));

        let reader = Reader::from_bytes(out, ReadOptions::strict()).unwrap();
        assert_eq!(reader.startxref().map(|_| ()), Some(()));
        assert!(reader.root().unwrap().has_type(b"Catalog"));
        assert_eq!(reader.get_object(&ObjRef::new(4, 0)).unwrap().as_string(), Some(&b"kept"[..]));
        assert_eq!(*reader.get_object(&ObjRef::new(3, 0)).unwrap(), Object::Null);
        assert_eq!(reader.page_count().unwrap(), 0);
    }

    #[test]
    fn test_generated_id() {
        let writer = Writer::new();
        let out1 = writer.to_bytes().unwrap();
        let out2 = Writer::new().to_bytes().unwrap();
        assert_eq!(out1, out2);
        let reader = Reader::from_bytes(out1, ReadOptions::strict()).unwrap();
        let id = parse_id(reader.trailer().lookup(b"ID")).unwrap();
        assert_eq!(id[0].len(), 16);
        assert_eq!(id[0], id[1]);
    }

    #[test]
    fn test_foreign_ref() {
        let mut writer = Writer::new();
        writer.add_object(Object::Ref(ObjRef::in_doc(DocId::new(), 1, 0)));
        assert!(matches!(writer.to_bytes(), Err(Error::WriteIntegrity(_))));
    }

    #[test]
    fn test_missing_root() {
        let mut writer = Writer::new();
        writer.remove_object(&ObjRef::new(1, 0));
        assert!(matches!(writer.to_bytes(), Err(Error::WriteIntegrity(_))));
    }

    #[test]
    fn test_xref_stream_data() {
        let entries = BTreeMap::from([
            (2, Record::Used { gen: 0, offset: 0x1234 }),
            (3, Record::Free { gen: 1, next: 0 }),
            (7, Record::Used { gen: 0, offset: 9 }),
        ]);
        let (index, width, data) = xref_stream_data(&entries);
        assert_eq!(index, [2, 2, 7, 1]);
        assert_eq!(width, 2);
        assert_eq!(data, [1, 0x12, 0x34, 0, 0, 0, 0, 0, 0, 1, 1, 0, 9, 0, 0]);
    }
}
