use std::io::{Seek, SeekFrom, Read, BufRead};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::cell::RefCell;

use crate::base::*;
use crate::base::types::*;
use crate::config::ReadOptions;
use crate::codecs;
use crate::utils;

use super::bp::ByteProvider;
use super::cc::CharClass;
use super::op::ObjParser;

/// The main interface to a file-level PDF parsing.
///
/// All offsets taken and returned by the methods of `FileParser` are relative to the `%PDF` 
/// header, like those stored in cross-reference tables.
pub struct FileParser<T: BufRead + Seek> {
    reader: RefCell<T>,
    header: Header,
    len: Offset,
    doc: DocId,
    options: ReadOptions,
}

/// A top-level structure found at a given offset.
pub enum Structural {
    Object(ObjRef, Object),
    XRefSec(XRef)
}

// What read_at() found before the stream data needs to be read.
enum Head {
    Done(Structural),
    Stream(ObjRef, Dict, Offset)
}

impl<T: BufRead + Seek> FileParser<T> {
    /// Creates a `FileParser` instance with the provided `BufRead`.
    ///
    /// Locates the PDF header within the first 1024 bytes, determining the PDF version and its 
    /// byte offset within the stream. A missing header is an error in strict mode, otherwise it is 
    /// assumed at offset 0 with version 1.4. An empty source is always an error.
    pub fn new(mut reader: T, doc: DocId, options: &ReadOptions) -> Result<Self, Error> {
        let len = reader.seek(SeekFrom::End(0))?;
        if len == 0 {
            return Err(Error::EmptyInput);
        }
        let header = match Self::find_header(&mut reader, len)? {
            Some(header) => {
                log::info!("PDF version {}.{}", header.version.0, header.version.1);
                if header.start != 0 {
                    log::info!("Offset start @ {}", header.start);
                }
                header
            },
            None if options.strict => return Err(Error::MalformedHeader("%PDF header not found")),
            None => {
                log::warn!("%PDF header not found, assuming version 1.4 at offset 0.");
                Header { start: 0, version: (1, 4) }
            }
        };
        Ok(Self { reader: RefCell::new(reader), header, len, doc, options: options.clone() })
    }

    fn find_header(reader: &mut T, len: Offset) -> Result<Option<Header>, Error> {
        const HEADER_FIXED: &[u8] = b"%PDF-";
        const HEADER_FIXED_LEN: usize = HEADER_FIXED.len();
        const HEADER_FULL_LEN: usize = HEADER_FIXED_LEN + 3;

        let mut data = vec![0u8; std::cmp::min(len, 1024) as usize];
        reader.seek(SeekFrom::Start(0))?;
        reader.read_exact(&mut data)?;
        let header = data.windows(HEADER_FULL_LEN)
            .enumerate()
            .filter(|(_, w)| w[0..HEADER_FIXED_LEN] == *HEADER_FIXED)
            .find_map(|(ix, w)| match w[HEADER_FIXED_LEN..] {
                [maj @ b'0'..=b'9', b'.', min @ b'0'..=b'9'] =>
                    Some(Header { start: ix as Offset, version: (maj - b'0', min - b'0') }),
                _ => None
            });
        Ok(header)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn doc(&self) -> DocId {
        self.doc
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    fn start(&self) -> Offset {
        self.header.start
    }

    /// The total length of the source, including anything preceding `%PDF`.
    pub fn len(&self) -> Offset {
        self.len
    }

    /// Reads the entire source, including anything preceding `%PDF`.
    pub fn read_all(&self) -> Result<Vec<u8>, Error> {
        let mut reader = self.reader.borrow_mut();
        reader.seek(SeekFrom::Start(0))?;
        let mut data = Vec::with_capacity(self.len as usize);
        reader.read_to_end(&mut data)?;
        Ok(data)
    }

    fn read_tail(&self) -> Result<Vec<u8>, Error> {
        let mut reader = self.reader.borrow_mut();
        let buf_size = std::cmp::min(self.len, 1024);
        reader.seek(SeekFrom::End(-(buf_size as i64)))?;
        let mut data = vec![0; buf_size as usize];
        reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Checks for the `%%EOF` marker in the last 1024 bytes.
    pub fn has_eof_marker(&self) -> Result<bool, Error> {
        Ok(utils::find(&self.read_tail()?, b"%%EOF").is_some())
    }

    /// Tries to locate the cross-reference entry point (`startxref`).
    ///
    /// The last 1024 bytes of the byte stream are inspected.
    pub fn entrypoint(&self) -> Result<Offset, Error> {
        let data = self.read_tail()?;
        const SXREF: &[u8] = b"startxref";
        let sxref = data.windows(SXREF.len())
            .rposition(|w| w == SXREF)
            .ok_or(Error::MalformedXref("startxref not found"))?;
        let rest = &data[(sxref + SXREF.len())..];
        let rest = match rest.iter().position(|c| CharClass::of(*c) != CharClass::Space) {
            Some(pos) => &rest[pos..],
            None => return Err(Error::MalformedXref("malformed startxref"))
        };
        let digits = rest.iter().position(|c| !c.is_ascii_digit()).unwrap_or(rest.len());
        utils::parse_num(&rest[..digits]).ok_or(Error::MalformedXref("malformed startxref"))
    }

    /// Checks that `pos` plausibly starts a cross-reference section: it must be preceded by 
    /// whitespace and start either with `xref` or with a digit (an xref stream object).
    pub fn points_to_xref(&self, pos: Offset) -> Result<bool, Error> {
        let abs = pos + self.start();
        if abs == 0 || abs >= self.len {
            return Ok(false);
        }
        let mut reader = self.reader.borrow_mut();
        reader.seek(SeekFrom::Start(abs - 1))?;
        let mut buf = [0u8; 5];
        let read = reader.read(&mut buf)?;
        let buf = &buf[..read];
        Ok(match buf {
            [prev, rest @ ..] if CharClass::of(*prev) == CharClass::Space =>
                rest.starts_with(b"xref") || rest.first().is_some_and(u8::is_ascii_digit),
            _ => false
        })
    }

    /// Reads an indirect object or a cross-reference section at the specified location.
    ///
    /// An indirect `/Length` of a stream is resolved using `resolver`. The internal reader is not 
    /// borrowed while that happens, so `resolver` may use this `FileParser` again.
    pub fn read_at(&self, pos: Offset, resolver: &dyn Resolver) -> Result<Structural, Error> {
        let (oref, dict, data_start) = match self.read_head(pos)? {
            Head::Done(st) => return Ok(st),
            Head::Stream(oref, dict, data_start) => (oref, dict, data_start)
        };
        let len = match dict.lookup(b"Length") {
            Object::Ref(objref) => match resolver.resolve_ref(objref) {
                Ok(obj) => obj.num_value(),
                Err(err) => {
                    log::warn!("Could not resolve /Length of {oref}: {err}");
                    None
                }
            },
            obj => obj.num_value()
        };
        let data = self.read_stream_data(data_start, len)?;
        Ok(Structural::Object(oref, Object::Stream(Stream::new(dict, data))))
    }

    fn read_head(&self, pos: Offset) -> Result<Head, Error> {
        let mut reader = self.reader.borrow_mut();
        reader.seek(SeekFrom::Start(pos + self.start()))?;
        let mut op = ObjParser::with_doc(&mut *reader, self.doc, self.options.max_depth);
        let tk = op.next_token()?;
        if tk == b"xref" {
            let xref = self.read_xref_table(&mut op)?;
            return Ok(Head::Done(Structural::XRefSec(xref)));
        }
        let num = utils::parse_int_strict(&tk)
            .ok_or(Error::Parse("invalid object number"))?;
        let gen = utils::parse_int_strict(&op.next_token()?)
            .ok_or(Error::Parse("invalid generation number"))?;
        let oref = ObjRef::in_doc(self.doc, num, gen);
        if op.next_token()? != b"obj" {
            return Err(Error::Parse("unexpected token"));
        }
        let obj = op.read_obj()?;
        let tk = match op.next_token() {
            Ok(tk) => tk,
            Err(Error::StreamTruncated) if !self.options.strict => {
                log::warn!("Object {oref} not terminated by endobj.");
                return Ok(Head::Done(Structural::Object(oref, obj)));
            },
            Err(err) => return Err(err)
        };
        match &tk[..] {
            b"endobj" =>
                Ok(Head::Done(Structural::Object(oref, obj))),
            b"stream" => {
                let Object::Dict(dict) = obj else {
                    return Err(Error::Parse("stream keyword not preceded by a dictionary"))
                };
                if !op.is_clean() {
                    return Err(Error::Parse("stream keyword not preceded by a dictionary"));
                }
                let reader = op.into_inner();
                match reader.peek() {
                    Some(b'\n') => { reader.consume(1); },
                    Some(b'\r') => {
                        reader.consume(1);
                        if reader.next_if(|c| c == b'\n').is_none() {
                            log::warn!("stream keyword of {oref} followed by a bare CR.");
                        }
                    },
                    _ => log::warn!("stream keyword of {oref} not followed by EOL.")
                }
                let data_start = reader.stream_position()?;
                Ok(Head::Stream(oref, dict, data_start))
            },
            _ if self.options.strict => Err(Error::Parse("endobj not found")),
            _ => {
                log::warn!("Object {oref} not terminated by endobj.");
                Ok(Head::Done(Structural::Object(oref, obj)))
            }
        }
    }

    // Returns whether `endstream` follows, possibly after whitespace.
    fn at_endstream(reader: &mut T) -> Result<bool, Error> {
        reader.skip_ws();
        let mut buf = [0u8; 9];
        match reader.read_exact(&mut buf) {
            Ok(()) => Ok(&buf == b"endstream"),
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
            Err(err) => Err(err.into())
        }
    }

    /// Reads stream data starting at the absolute position `data_start`.
    ///
    /// The declared length is trusted if `endstream` follows. If not, a length smaller by one is 
    /// tried, and finally (in permissive mode) the data is taken up to the next `endstream`.
    fn read_stream_data(&self, data_start: Offset, len: Option<u64>) -> Result<Vec<u8>, Error> {
        let mut reader = self.reader.borrow_mut();
        match len {
            Some(len) if data_start + len <= self.len => {
                reader.seek(SeekFrom::Start(data_start))?;
                let mut data = vec![0; len as usize];
                reader.read_exact(&mut data)?;
                if Self::at_endstream(&mut reader)? {
                    return Ok(data);
                }
                if len > 0 {
                    reader.seek(SeekFrom::Start(data_start + len - 1))?;
                    if Self::at_endstream(&mut reader)? {
                        log::warn!("Stream /Length {len} overcounts by one byte.");
                        data.pop();
                        return Ok(data);
                    }
                }
                if self.options.strict {
                    return Err(Error::StreamLengthMismatch(len));
                }
                log::warn!("Stream /Length {len} does not match, reading until endstream.");
            },
            Some(len) if self.options.strict => return Err(Error::StreamLengthMismatch(len)),
            Some(len) => log::warn!("Stream /Length {len} exceeds the file, reading until endstream."),
            None if self.options.strict => return Err(Error::Parse("stream with invalid or missing /Length")),
            None => log::warn!("Stream with invalid or missing /Length found, reading until endstream.")
        }
        reader.seek(SeekFrom::Start(data_start))?;
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest)?;
        let end = utils::find(&rest, b"endstream").ok_or(Error::StreamTruncated)?;
        rest.truncate(end);
        if rest.ends_with(b"\r\n") {
            rest.truncate(end - 2);
        } else if rest.ends_with(b"\n") || rest.ends_with(b"\r") {
            rest.truncate(end - 1);
        }
        Ok(rest)
    }

    /// Attempts to read an indirect object at the specified location.
    pub fn read_obj_at(&self, pos: Offset, resolver: &dyn Resolver) -> Result<(ObjRef, Object), Error> {
        match self.read_at(pos, resolver)? {
            Structural::Object(oref, obj) => Ok((oref, obj)),
            _ => Err(Error::Parse("expected object, found xref section"))
        }
    }

    /// Attempts to read a cross-reference table section or a cross-reference stream object at the 
    /// specified location.
    pub fn read_xref_at(&self, pos: Offset) -> Result<XRef, Error> {
        match self.read_at(pos, &())? {
            Structural::XRefSec(xref) => Ok(xref),
            Structural::Object(oref, obj) => self.read_xref_stream(oref, obj)
        }
    }

    fn insert_record(&self, map: &mut BTreeMap<ObjNum, Record>, num: ObjNum, rec: Record) -> Result<(), Error> {
        match map.entry(num) {
            Entry::Vacant(entry) => { entry.insert(rec); },
            Entry::Occupied(_) if self.options.strict =>
                return Err(Error::MalformedXref("duplicate object number")),
            Entry::Occupied(_) => log::warn!("Duplicate object number {num} in xref section")
        };
        Ok(())
    }

    fn read_xref_table<R: BufRead>(&self, op: &mut ObjParser<R>) -> Result<XRef, Error> {
        let mut map = BTreeMap::new();
        let err = || Error::MalformedXref("malformed xref table");
        let mut first_section = true;
        loop {
            let tk = op.next_token()?;
            if tk == b"trailer" { break; }
            let start = utils::parse_num::<ObjNum>(&tk).ok_or_else(err)?;
            let count = utils::parse_num::<ObjNum>(&op.next_token()?).ok_or_else(err)?;
            let reader = op.reader();
            reader.skip_ws();
            let mut delta = 0;
            let mut line = [0u8; 18];
            for ix in 0..count {
                reader.read_exact(&mut line)?;
                // The 20-byte record ends with one of " \n", " \r", "\r\n"; tolerate "\n" too.
                for _ in 0..2 {
                    reader.next_if(|c| matches!(c, b' ' | b'\r' | b'\n'));
                }
                if line[10] != b' ' || line[16] != b' ' {
                    return Err(err());
                }
                let v = utils::parse_num::<u64>(&line[0..10]).ok_or_else(err)?;
                let gen = utils::parse_num::<ObjGen>(&line[11..16]).ok_or_else(err)?;
                let rec = match line[17] {
                    b'n' => Record::Used{gen, offset: v},
                    b'f' => Record::Free{gen, next: v.try_into().map_err(|_| err())?},
                    _ => return Err(err())
                };
                if ix == 0 && first_section && start != 0 && rec == Record::default() {
                    if self.options.strict {
                        return Err(Error::MalformedXref("xref table not zero-indexed"));
                    }
                    log::warn!("Xref table starts at {start} with the head of the free list, renumbering from 0.");
                    delta = start;
                }
                self.insert_record(&mut map, start + ix - delta, rec)?;
            }
            first_section = false;
        }
        let trailer = match op.read_obj()? {
            Object::Dict(dict) => dict,
            _ => return Err(Error::MalformedXref("malformed trailer"))
        };
        let size = match trailer.lookup(b"Size").num_value() {
            Some(size) => size,
            None if self.options.strict => return Err(Error::MalformedXref("malformed trailer (missing /Size)")),
            None => {
                log::warn!("Trailer without /Size.");
                map.keys().next_back().map_or(0, |num| num + 1)
            }
        };
        Ok(XRef { tpe: XRefType::Table, map, dict: trailer, size })
    }

    fn read_xref_stream(&self, oref: ObjRef, obj: Object) -> Result<XRef, Error> {
        let Object::Stream(stm) = obj else {
            return Err(Error::MalformedXref("no xref section at offset"))
        };
        let dict = &stm.dict;
        if !obj_is_xref(dict) {
            return Err(Error::MalformedXref("malformed xref stream (/Type)"))
        }
        let size: ObjNum = dict.lookup(b"Size").num_value()
            .ok_or(Error::MalformedXref("malformed xref stream (/Size)"))?;
        let index = match dict.lookup(b"Index") {
            Object::Array(arr) =>
                arr.iter()
                    .map(|obj| obj.num_value::<ObjNum>().ok_or(Error::MalformedXref("malformed xref stream (/Index)")))
                    .collect::<Result<Vec<_>, _>>()?,
            Object::Null => vec![0, size],
            _ => return Err(Error::MalformedXref("malformed xref stream (/Index)"))
        };
        if index.len() % 2 != 0 {
            return Err(Error::MalformedXref("malformed xref stream (/Index)"));
        }

        let [w1, w2, w3] = match dict.lookup(b"W") {
            Object::Array(arr) =>
                arr.iter()
                    .map(|obj| match obj {
                        &Object::Number(Number::Int(num)) if (0..=8).contains(&num) => Ok(num as usize),
                        _ => Err(Error::MalformedXref("malformed xref stream (/W)"))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(Error::MalformedXref("malformed xref stream (/W)"))
        }.try_into().map_err(|_| Error::MalformedXref("malformed xref stream (/W)"))?;
        if w2 == 0 {
            return Err(Error::MalformedXref("malformed xref stream (/W)"))
        }

        let options = codecs::DecodeOptions::from(&self.options);
        let filters = codecs::parse_filters(dict, &(), &options)?;
        let data = codecs::decode(stm.data(), &filters, &options)?;
        let mut fields = data.chunks(w1 + w2 + w3);
        let read = |field: &[u8]| field.iter().fold(0u64, |acc, c| (acc << 8) | u64::from(*c));
        let err = || Error::MalformedXref("malformed xref stream record");

        let mut map = BTreeMap::new();
        'outer: for ch in index.chunks_exact(2) {
            let (start, len) = (ch[0], ch[1]);
            for num in start..start.saturating_add(len) {
                let Some(rec) = fields.next().filter(|rec| rec.len() == w1 + w2 + w3) else {
                    if self.options.strict {
                        return Err(Error::MalformedXref("xref stream data too short"));
                    }
                    log::warn!("Xref stream {oref} shorter than its /Index declares.");
                    break 'outer;
                };
                let tpe = if w1 > 0 { read(&rec[..w1]) } else { 1 };
                let f2 = read(&rec[w1..(w1 + w2)]);
                let f3 = read(&rec[(w1 + w2)..]);
                let rec = match tpe {
                    0 if self.options.include_free_entries =>
                        Record::Free{gen: f3.try_into().map_err(|_| err())?, next: f2.try_into().map_err(|_| err())?},
                    0 => continue,
                    1 => Record::Used{gen: f3.try_into().map_err(|_| err())?, offset: f2},
                    2 => Record::Compr{num_within: f2.try_into().map_err(|_| err())?, index: f3.try_into().map_err(|_| err())?},
                    _ => {
                        log::warn!("Unknown xref record type {tpe} for object {num}, ignoring.");
                        continue
                    }
                };
                self.insert_record(&mut map, num, rec)?;
            }
        }
        let (dict, _) = stm.into_parts();
        Ok(XRef { tpe: XRefType::Stream(oref), map, dict, size })
    }
}

fn obj_is_xref(dict: &Dict) -> bool {
    dict.lookup(b"Type").as_name().is_some_and(|name| name == b"XRef")
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parser(data: &[u8]) -> FileParser<Cursor<&[u8]>> {
        FileParser::new(Cursor::new(data), DocId::new(), &ReadOptions::default()).unwrap()
    }

    fn strict_parser(data: &[u8]) -> FileParser<Cursor<&[u8]>> {
        FileParser::new(Cursor::new(data), DocId::new(), &ReadOptions::strict()).unwrap()
    }

    #[test]
    fn test_header() {
        let fp = parser(b"%PDF-1.7\n%%EOF");
        assert_eq!(fp.header(), &Header { start: 0, version: (1, 7) });

        let fp = parser(b"garbage\n%PDF-2.0\n");
        assert_eq!(fp.header(), &Header { start: 8, version: (2, 0) });

        let fp = parser(b"no header here");
        assert_eq!(fp.header(), &Header { start: 0, version: (1, 4) });
        assert!(matches!(
            FileParser::new(Cursor::new(b"no header here"), DocId::new(), &ReadOptions::strict()),
            Err(Error::MalformedHeader(_))));

        assert!(matches!(
            FileParser::new(Cursor::new(b""), DocId::new(), &ReadOptions::default()),
            Err(Error::EmptyInput)));
    }

    #[test]
    fn test_entrypoint() {
        let fp = parser(b"%PDF-1.4\nxref\n0 1\n0000000000 65535 f \ntrailer<</Size 1>>\nstartxref\n9\n%%EOF\n");
        assert_eq!(fp.entrypoint().unwrap(), 9);
        assert!(fp.has_eof_marker().unwrap());
        assert!(fp.points_to_xref(9).unwrap());
        assert!(!fp.points_to_xref(10).unwrap());
        assert!(!fp.points_to_xref(1000).unwrap());

        let fp = parser(b"%PDF-1.4\nstartxref 123");
        assert_eq!(fp.entrypoint().unwrap(), 123);
        assert!(!fp.has_eof_marker().unwrap());

        let fp = parser(b"%PDF-1.4\nnothing");
        assert!(matches!(fp.entrypoint(), Err(Error::MalformedXref(_))));
    }

    #[test]
    fn test_read_xref_table() {
        let data = b"%PDF-1.4\nxref\n0 3\n0000000000 65535 f \n0000000017 00000 n\r\n0000000081 00000 n\n\
            5 1\n0000000100 00002 n \ntrailer\n<</Size 6/Root 1 0 R>>";
        let fp = parser(data);
        let xref = fp.read_xref_at(9).unwrap();
        assert_eq!(xref.tpe, XRefType::Table);
        assert_eq!(xref.size, 6);
        assert_eq!(xref.map.get(&0), Some(&Record::Free { gen: 65535, next: 0 }));
        assert_eq!(xref.map.get(&1), Some(&Record::Used { gen: 0, offset: 17 }));
        assert_eq!(xref.map.get(&2), Some(&Record::Used { gen: 0, offset: 81 }));
        assert_eq!(xref.map.get(&5), Some(&Record::Used { gen: 2, offset: 100 }));
        assert_eq!(xref.map.get(&3), None);
        assert_eq!(xref.dict.lookup(b"Root"), &Object::Ref(ObjRef::in_doc(fp.doc(), 1, 0)));
    }

    #[test]
    fn test_xref_not_zero_indexed() {
        let data = b"%PDF-1.4\nxref\n1 3\n0000000000 65535 f \n0000000017 00000 n \n0000000081 00000 n \n\
            trailer\n<</Size 3>>";
        let xref = parser(data).read_xref_at(9).unwrap();
        assert_eq!(xref.map.get(&1), Some(&Record::Used { gen: 0, offset: 17 }));
        assert_eq!(xref.map.get(&2), Some(&Record::Used { gen: 0, offset: 81 }));
        assert_eq!(xref.map.get(&3), None);
        assert!(matches!(strict_parser(data).read_xref_at(9), Err(Error::MalformedXref(_))));
    }

    #[test]
    fn test_xref_duplicates() {
        let data = b"%PDF-1.4\nxref\n0 2\n0000000000 65535 f \n0000000017 00000 n \n\
            1 1\n0000000099 00000 n \ntrailer\n<</Size 2>>";
        let xref = parser(data).read_xref_at(9).unwrap();
        assert_eq!(xref.map.get(&1), Some(&Record::Used { gen: 0, offset: 17 }));
        assert!(matches!(strict_parser(data).read_xref_at(9), Err(Error::MalformedXref(_))));
    }

    #[test]
    fn test_read_xref_stream() {
        let records: &[u8] = &[
            0, 0, 0, 0xFF,
            1, 0, 15, 0,
            2, 0, 5, 1,
            1, 0, 40, 0,
        ];
        let mut data = format!("%PDF-1.5\n4 0 obj\n<</Type/XRef/Size 5/Index[0 2 3 2]/W[1 2 1]/Length {}>>\nstream\n",
            records.len()).into_bytes();
        data.extend_from_slice(records);
        data.extend_from_slice(b"\nendstream\nendobj\n");
        let fp = parser(&data);
        let xref = fp.read_xref_at(9).unwrap();
        assert_eq!(xref.tpe, XRefType::Stream(ObjRef::in_doc(fp.doc(), 4, 0)));
        assert_eq!(xref.map.get(&0), None);
        assert_eq!(xref.map.get(&1), Some(&Record::Used { gen: 0, offset: 15 }));
        assert_eq!(xref.map.get(&3), Some(&Record::Compr { num_within: 5, index: 1 }));
        assert_eq!(xref.map.get(&4), Some(&Record::Used { gen: 0, offset: 40 }));

        let fp = FileParser::new(Cursor::new(&data[..]), DocId::new(),
            &ReadOptions::default().with_free_entries(true)).unwrap();
        let xref = fp.read_xref_at(9).unwrap();
        assert_eq!(xref.map.get(&0), Some(&Record::Free { gen: 255, next: 0 }));
    }

    #[test]
    fn test_read_obj_at() {
        let data = b"%PDF-1.4\n1 0 obj\n<</Length 5>>\nstream\nHello\nendstream\nendobj\n\
            2 0 obj\n(text)\nendobj\n";
        let fp = parser(data);
        let (oref, obj) = fp.read_obj_at(9, &()).unwrap();
        assert_eq!(oref, ObjRef::in_doc(fp.doc(), 1, 0));
        let stm = obj.into_stream().unwrap();
        assert_eq!(stm.data(), b"Hello");

        let (oref, obj) = fp.read_obj_at(61, &()).unwrap();
        assert_eq!((oref.num, oref.gen), (2, 0));
        assert_eq!(obj, Object::new_string(b"text"));

        assert!(fp.read_obj_at(10, &()).is_err());
    }

    #[test]
    fn test_stream_length_recovery() {
        // EOL before endstream counts towards /Length here.
        let data = b"%PDF-1.4\n1 0 obj\n<</Length 6>>\nstream\nHello\nendstream\nendobj\n";
        let (_, obj) = parser(data).read_obj_at(9, &()).unwrap();
        assert_eq!(obj.into_stream().unwrap().data(), b"Hello\n");

        // Overcounts by one.
        let data = b"%PDF-1.4\n1 0 obj\n<</Length 6>>\nstream\nHelloendstream\nendobj\n";
        let (_, obj) = parser(data).read_obj_at(9, &()).unwrap();
        assert_eq!(obj.into_stream().unwrap().data(), b"Hello");

        // Completely wrong.
        let data = b"%PDF-1.4\n1 0 obj\n<</Length 2>>\nstream\nHello\nendstream\nendobj\n";
        let (_, obj) = parser(data).read_obj_at(9, &()).unwrap();
        assert_eq!(obj.into_stream().unwrap().data(), b"Hello");
        assert!(matches!(strict_parser(data).read_obj_at(9, &()), Err(Error::StreamLengthMismatch(2))));

        // Missing.
        let data = b"%PDF-1.4\n1 0 obj\n<<>>\nstream\r\nHello\r\nendstream\nendobj\n";
        let (_, obj) = parser(data).read_obj_at(9, &()).unwrap();
        assert_eq!(obj.into_stream().unwrap().data(), b"Hello");

        // Indirect, but no resolver.
        let data = b"%PDF-1.4\n1 0 obj\n<</Length 2 0 R>>\nstream\nHello\nendstream\nendobj\n";
        let (_, obj) = parser(data).read_obj_at(9, &()).unwrap();
        assert_eq!(obj.into_stream().unwrap().data(), b"Hello");
    }
}
