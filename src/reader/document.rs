use std::io::{BufRead, Seek};
use std::rc::Rc;

use crate::base::*;
use crate::base::types::*;
use crate::codecs::{self, DecodeOptions};
use crate::parser::ObjParser;
use crate::parser::tk::Tokenizer;
use crate::utils;

use super::{Reader, rebuild};

/// A decoded object stream.
pub(crate) struct ObjStm {
    /// Object numbers and their offsets relative to `/First`.
    entries: Vec<(ObjNum, usize)>,
    /// The decoded data starting at `/First`.
    source: Vec<u8>,
}

impl ObjStm {
    /// Decodes an object stream and parses its header.
    pub fn new(obj: &Object, options: &DecodeOptions) -> Result<ObjStm, Error> {
        let Object::Stream(stm) = obj else {
            return Err(Error::Parse("object stream not found"));
        };
        if !obj.has_type(b"ObjStm") {
            log::warn!("Object stream without /Type /ObjStm.");
        }
        let count: usize = stm.dict.lookup(b"N").num_value()
            .ok_or(Error::Parse("malformed object stream (/N)"))?;
        let first: usize = stm.dict.lookup(b"First").num_value()
            .ok_or(Error::Parse("malformed object stream (/First)"))?;
        let data = match stm.decoded() {
            Some(data) => data.to_vec(),
            None => {
                let filters = codecs::parse_filters(&stm.dict, &(), options)?;
                codecs::decode(stm.data(), &filters, options)?
            }
        };
        Self::from_decoded(data, count, first)
    }

    fn from_decoded(mut data: Vec<u8>, count: usize, first: usize) -> Result<ObjStm, Error> {
        if first > data.len() {
            return Err(Error::Parse("malformed object stream (/First)"));
        }
        let mut header = &data[..first];
        let mut entries = Vec::with_capacity(std::cmp::min(count, first / 4));
        for _ in 0..count {
            let num = utils::parse_num(&header.read_token_nonempty()?)
                .ok_or(Error::Parse("malformed object stream header"))?;
            let offset = utils::parse_num(&header.read_token_nonempty()?)
                .ok_or(Error::Parse("malformed object stream header"))?;
            entries.push((num, offset));
        }
        let source = data.split_off(first);
        Ok(ObjStm { entries, source })
    }

    pub fn numbers(&self) -> impl Iterator<Item = ObjNum> + '_ {
        self.entries.iter().map(|&(num, _)| num)
    }

    /// Parses the object `num`, expected at position `index`.
    pub fn get(&self, num: ObjNum, index: ObjIndex, doc: DocId, max_depth: usize) -> Result<Object, Error> {
        let index = match self.entries.get(index as usize) {
            Some(&(found, _)) if found == num => index as usize,
            _ => {
                let pos = self.entries.iter().position(|&(found, _)| found == num)
                    .ok_or(Error::ObjectNotFound(ObjRef::in_doc(doc, num, 0)))?;
                log::warn!("Object {num} found at index {pos} of object stream instead of {index}.");
                pos
            }
        };
        let start = self.entries[index].1;
        let end = self.entries.get(index + 1)
            .map(|&(_, offset)| offset)
            .filter(|&offset| offset > start && offset <= self.source.len())
            .unwrap_or(self.source.len());
        let source = self.source.get(start..end)
            .ok_or(Error::Parse("object stream offset out of range"))?;
        ObjParser::with_doc(source, doc, max_depth).read_obj()
    }
}

impl<T: BufRead + Seek> Reader<T> {
    /// Returns the indirect object `objref`, loading and caching it on first access.
    ///
    /// Free or missing objects resolve to [`Object::Null`], except for a missing one in strict 
    /// mode, which is an error. References belonging to another document are never resolved.
    pub fn get_object(&self, objref: &ObjRef) -> Result<Rc<Object>, Error> {
        if !objref.belongs_to(self.doc()) {
            return Err(Error::ObjectNotFound(*objref));
        }
        if let Some(obj) = self.cache.borrow().get(objref) {
            return Ok(obj);
        }
        let key = (objref.num, objref.gen);
        if !self.loading.borrow_mut().insert(key) {
            return Err(Error::Parse("object refers to itself while being loaded"));
        }
        let res = self.load_object(objref);
        self.loading.borrow_mut().remove(&key);
        let obj = self.cache.borrow_mut().insert(objref, res?, self.options.strict)?;
        log::trace!("Loaded object {objref} ({} cached)", self.cache.borrow().len());
        Ok(obj)
    }

    fn load_object(&self, objref: &ObjRef) -> Result<Object, Error> {
        let oref = ObjRef::in_doc(self.doc(), objref.num, objref.gen);
        match self.xref.locate(oref.num) {
            Some(Record::Used { gen, offset }) => {
                if gen != oref.gen {
                    return self.missing(&oref, "generation number mismatch");
                }
                let obj = self.read_uncompressed(offset, &oref)?;
                self.decrypt_loaded(obj, &oref)
            },
            Some(Record::Compr { num_within, index }) => {
                if oref.gen != 0 {
                    return self.missing(&oref, "generation number mismatch");
                }
                // Strings in compressed objects were decrypted with the object stream.
                let objstm = self.objstm(num_within)?;
                objstm.get(oref.num, index, self.doc(), self.options.max_depth)
            },
            Some(Record::Free { .. }) => Ok(Object::Null),
            None if self.options.strict => Err(Error::ObjectNotFound(oref)),
            None => {
                log::warn!("Object {oref} not in cross-reference table, scanning the file.");
                let obj = self.scan_for_object(&oref)?;
                self.decrypt_loaded(obj, &oref)
            }
        }
    }

    fn missing(&self, oref: &ObjRef, reason: &str) -> Result<Object, Error> {
        if self.options.strict {
            Err(Error::ObjectNotFound(*oref))
        } else {
            log::warn!("Object {oref}: {reason}, resolving as null.");
            Ok(Object::Null)
        }
    }

    fn read_uncompressed(&self, offset: Offset, oref: &ObjRef) -> Result<Object, Error> {
        let err = match self.parser.read_obj_at(offset, self) {
            Ok((found, obj)) if found.num == oref.num && found.gen == oref.gen => return Ok(obj),
            Ok((found, _)) => format!("found {found}"),
            Err(err) => err.to_string()
        };
        if self.options.strict {
            return Err(Error::MalformedXref("object not found at its recorded offset"));
        }
        log::warn!("Object {oref} not found at offset {offset} ({err}), scanning the file.");
        self.scan_for_object(oref)
    }

    fn scan_for_object(&self, oref: &ObjRef) -> Result<Object, Error> {
        let start = self.parser.header().start as usize;
        let body = self.raw_bytes()?.get(start..).unwrap_or_default();
        match rebuild::find_object(body, oref.num)? {
            Some((gen, offset)) if gen == oref.gen => {
                let (_, obj) = self.parser.read_obj_at(offset, self)?;
                log::warn!("Object {oref} recovered at offset {offset}.");
                Ok(obj)
            },
            _ => {
                log::warn!("Object {oref} not found, resolving as null.");
                Ok(Object::Null)
            }
        }
    }

    fn objstm(&self, num: ObjNum) -> Result<Rc<ObjStm>, Error> {
        if let Some(objstm) = self.objstms.borrow().get(&num) {
            return Ok(Rc::clone(objstm));
        }
        let obj = self.get_object(&ObjRef::in_doc(self.doc(), num, 0))?;
        if let Object::Stream(stm) = &*obj {
            self.stream_data(stm)?;
        }
        let objstm = Rc::new(ObjStm::new(&obj, &self.decode_options())?);
        self.objstms.borrow_mut().insert(num, Rc::clone(&objstm));
        Ok(objstm)
    }

    fn decrypt_loaded(&self, obj: Object, oref: &ObjRef) -> Result<Object, Error> {
        let encrypt = self.trailer().lookup(b"Encrypt");
        if encrypt.is_null() || obj.has_type(b"XRef") {
            return Ok(obj);
        }
        if let Object::Ref(enc_ref) = encrypt {
            if enc_ref.num == oref.num && enc_ref.gen == oref.gen {
                return Ok(obj);
            }
        }
        let security = self.security.borrow();
        match security.as_deref() {
            Some(handler) if handler.is_decrypted() => handler.decrypt_object(obj, oref.num, oref.gen),
            _ => Err(Error::EncryptionRequired)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadOptions;

    #[test]
    fn test_objstm() {
        let objstm = ObjStm::from_decoded(b"2 0 3 1 4 2614".to_vec(), 3, 11).unwrap();
        assert_eq!(objstm.numbers().collect::<Vec<_>>(), vec![2, 3, 4]);
        let doc = DocId::new();
        assert_eq!(objstm.get(2, 0, doc, 10).unwrap(), Object::new_int(6));
        assert_eq!(objstm.get(3, 1, doc, 10).unwrap(), Object::new_int(1));
        assert_eq!(objstm.get(4, 2, doc, 10).unwrap(), Object::new_int(4));
        // Wrong index, found by number
        assert_eq!(objstm.get(4, 0, doc, 10).unwrap(), Object::new_int(4));
        assert!(matches!(objstm.get(5, 0, doc, 10), Err(Error::ObjectNotFound(_))));
        assert!(ObjStm::from_decoded(b"2 0 3".to_vec(), 2, 5).is_err());
        assert!(ObjStm::from_decoded(b"2 0".to_vec(), 1, 10).is_err());
    }

    const SIMPLE: &str = "%PDF-1.4
1 0 obj
<</Type/Catalog/Pages 2 0 R>>
endobj
2 0 obj
<</Type/Pages/Kids[]/Count 0>>
endobj
3 0 obj
<</Length 4 0 R>>
stream
abc
endstream
endobj
4 0 obj
3
endobj
xref
0 5
0000000000 65535 f 
0000000009 00000 n 
0000000054 00000 n 
0000000100 00000 n 
0000000154 00000 n 
trailer
<</Size 5/Root 1 0 R>>
startxref
171
%%EOF
";

    #[test]
    fn test_get_object() {
        let rdr = Reader::from_bytes(SIMPLE, ReadOptions::strict()).unwrap();
        let doc = rdr.doc();
        let root = rdr.root().unwrap();
        assert_eq!(root.dict().unwrap().lookup(b"Pages"), &Object::Ref(ObjRef::in_doc(doc, 2, 0)));
        // Indirect /Length
        let stm = rdr.get_object(&ObjRef::in_doc(doc, 3, 0)).unwrap();
        assert_eq!(stm.as_stream().unwrap().data(), b"abc");
        assert_eq!(rdr.stream_data(stm.as_stream().unwrap()).unwrap(), b"abc");
        // Cached
        let again = rdr.get_object(&ObjRef::new(3, 0)).unwrap();
        assert!(Rc::ptr_eq(&stm, &again));
        // Free
        assert_eq!(*rdr.get_object(&ObjRef::new(0, 65535)).unwrap(), Object::Null);
        // Missing
        assert!(matches!(rdr.get_object(&ObjRef::new(7, 0)), Err(Error::ObjectNotFound(_))));
        assert!(matches!(rdr.get_object(&ObjRef::new(3, 1)), Err(Error::ObjectNotFound(_))));
        // Foreign
        assert!(matches!(rdr.get_object(&ObjRef::in_doc(DocId::new(), 1, 0)), Err(Error::ObjectNotFound(_))));

        let rdr = Reader::from_bytes(SIMPLE, ReadOptions::default()).unwrap();
        assert_eq!(*rdr.get_object(&ObjRef::new(7, 0)).unwrap(), Object::Null);
        assert_eq!(*rdr.get_object(&ObjRef::new(3, 1)).unwrap(), Object::Null);
        assert_eq!(rdr.objects().count(), 4);
    }

    #[test]
    fn test_wrong_offset() {
        let data = SIMPLE.replace("0000000054 00000 n", "0000000050 00000 n");
        let rdr = Reader::from_bytes(data.clone(), ReadOptions::default()).unwrap();
        let pages = rdr.get_object(&ObjRef::new(2, 0)).unwrap();
        assert!(pages.has_type(b"Pages"));
        let rdr = Reader::from_bytes(data, ReadOptions::strict()).unwrap();
        assert!(matches!(rdr.get_object(&ObjRef::new(2, 0)), Err(Error::MalformedXref(_))));
    }
}
