//! Reading PDF documents.
//!
//! A [`Reader`] locates the cross-reference information of a file (repairing it if needed) and 
//! then loads indirect objects on demand, caching each of them.

mod cache;
mod chain;
mod rebuild;
mod document;
mod pages;

use std::io::{BufRead, Seek, Cursor};
use std::collections::{BTreeMap, BTreeSet};
use std::cell::{RefCell, OnceCell};
use std::rc::Rc;

use crate::base::*;
use crate::base::types::*;
use crate::config::ReadOptions;
use crate::codecs::{self, DecodeOptions, Jbig2Decoder};
use crate::crypto::{PasswordStatus, SecurityHandler};
use crate::parser::FileParser;

use cache::ObjectCache;
use document::ObjStm;

pub struct Reader<T: BufRead + Seek> {
    parser: FileParser<T>,
    options: ReadOptions,
    xref: XRef,
    startxref: Option<Offset>,
    cache: RefCell<ObjectCache>,
    loading: RefCell<BTreeSet<(ObjNum, ObjGen)>>,
    objstms: RefCell<BTreeMap<ObjNum, Rc<ObjStm>>>,
    raw: OnceCell<Vec<u8>>,
    security: RefCell<Option<Box<dyn SecurityHandler>>>,
    jbig2: Option<Box<dyn Jbig2Decoder>>,
}

impl<T: BufRead + Seek> Reader<T> {
    /// Opens a document with the default (permissive) [`ReadOptions`].
    pub fn new(source: T) -> Result<Self, Error> {
        Self::with_options(source, ReadOptions::default())
    }

    pub fn with_options(source: T, options: ReadOptions) -> Result<Self, Error> {
        let parser = FileParser::new(source, DocId::new(), &options)?;
        let mut reader = Reader {
            parser,
            options,
            xref: XRef { tpe: XRefType::Rebuilt, map: BTreeMap::new(), dict: Dict::new(), size: 0 },
            startxref: None,
            cache: Default::default(),
            loading: Default::default(),
            objstms: Default::default(),
            raw: OnceCell::new(),
            security: RefCell::new(None),
            jbig2: None,
        };
        if !reader.parser.has_eof_marker()? {
            if reader.options.strict {
                return Err(Error::MalformedXref("%%EOF marker not found"));
            }
            log::warn!("%%EOF marker not found near the end of file.");
        }
        let (startxref, xref) = chain::load(&reader)?;
        log::debug!("{} objects in cross-reference table", xref.map.len());
        reader.startxref = startxref;
        reader.xref = xref;
        Ok(reader)
    }

    pub fn doc(&self) -> DocId {
        self.parser.doc()
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    pub fn header(&self) -> &Header {
        self.parser.header()
    }

    /// The PDF version declared in the header.
    pub fn version(&self) -> (u8, u8) {
        self.parser.header().version
    }

    /// The offset given by the final `startxref`, or `None` if the cross-reference table had to 
    /// be reconstructed.
    pub fn startxref(&self) -> Option<Offset> {
        self.startxref
    }

    /// The cross-reference table merged from all sections (newest entries taking precedence).
    pub fn xref(&self) -> &XRef {
        &self.xref
    }

    /// The trailer dictionary merged from all sections.
    pub fn trailer(&self) -> &Dict {
        &self.xref.dict
    }

    /// The document catalog.
    pub fn root(&self) -> Result<Rc<Object>, Error> {
        match self.trailer().lookup(b"Root") {
            Object::Ref(objref) => self.get_object(objref),
            Object::Dict(dict) => Ok(Rc::new(Object::Dict(dict.clone()))),
            _ => Err(Error::MalformedXref("trailer without /Root"))
        }
    }

    /// The document information dictionary, if any.
    pub fn info(&self) -> Result<Option<Rc<Object>>, Error> {
        match self.trailer().lookup(b"Info") {
            Object::Ref(objref) => self.get_object(objref).map(Some),
            Object::Null => Ok(None),
            obj => Ok(Some(Rc::new(obj.clone())))
        }
    }

    pub fn is_encrypted(&self) -> bool {
        !self.trailer().lookup(b"Encrypt").is_null()
    }

    pub fn set_security_handler(&mut self, handler: Box<dyn SecurityHandler>) {
        self.security = RefCell::new(Some(handler));
    }

    /// Verifies a password using the installed security handler.
    pub fn decrypt(&self, password: &[u8]) -> Result<PasswordStatus, Error> {
        let mut security = self.security.borrow_mut();
        let handler = security.as_mut().ok_or(Error::EncryptionRequired)?;
        match handler.verify(password) {
            PasswordStatus::NotDecrypted => Err(Error::WrongPassword),
            status => {
                log::info!("Password accepted ({status:?})");
                Ok(status)
            }
        }
    }

    /// Replaces the default JBIG2 decoder ([`Jbig2Process`](crate::codecs::Jbig2Process)).
    pub fn set_jbig2_decoder(&mut self, decoder: Box<dyn Jbig2Decoder>) {
        self.jbig2 = Some(decoder);
    }

    fn decode_options(&self) -> DecodeOptions<'_> {
        DecodeOptions { jbig2: self.jbig2.as_deref(), ..DecodeOptions::from(&self.options) }
    }

    /// The entire source, including anything preceding `%PDF`.
    pub fn raw_bytes(&self) -> Result<&[u8], Error> {
        if let Some(data) = self.raw.get() {
            return Ok(data);
        }
        let data = self.parser.read_all()?;
        Ok(self.raw.get_or_init(|| data))
    }

    /// Returns the decoded data of a stream. The result is cached within `stm`.
    pub fn stream_data<'s>(&self, stm: &'s Stream) -> Result<&'s [u8], Error> {
        if let Some(data) = stm.decoded() {
            return Ok(data);
        }
        let options = self.decode_options();
        let filters = codecs::parse_filters(&stm.dict, self, &options)?;
        let data = codecs::decode(stm.data(), &filters, &options)?;
        Ok(stm.cache_decoded(data))
    }

    /// Resolves `obj` if it is a reference, otherwise returns a copy.
    pub fn resolve(&self, obj: &Object) -> Result<Object, Error> {
        match obj {
            Object::Ref(objref) => Ok((*self.get_object(objref)?).clone()),
            obj => Ok(obj.clone())
        }
    }

    /// Iterates over all objects in use according to the cross-reference table.
    pub fn objects(&self) -> impl Iterator<Item = (ObjRef, Result<Rc<Object>, Error>)> + '_ {
        let doc = self.doc();
        self.xref.map.iter()
            .filter_map(move |(&num, rec)| match *rec {
                Record::Used { gen, .. } => Some(ObjRef::in_doc(doc, num, gen)),
                Record::Compr { .. } => Some(ObjRef::in_doc(doc, num, 0)),
                Record::Free { .. } => None
            })
            .map(|objref| (objref, self.get_object(&objref)))
    }
}

impl Reader<Cursor<Vec<u8>>> {
    /// Opens a document held in memory.
    pub fn from_bytes(data: impl Into<Vec<u8>>, options: ReadOptions) -> Result<Self, Error> {
        Self::with_options(Cursor::new(data.into()), options)
    }
}

impl<T: BufRead + Seek> Resolver for Reader<T> {
    fn resolve_ref(&self, objref: &ObjRef) -> Result<Object, Error> {
        Ok((*self.get_object(objref)?).clone())
    }

    fn decode_stream(&self, stm: &Stream) -> Result<Vec<u8>, Error> {
        self.stream_data(stm).map(<[u8]>::to_vec)
    }
}
