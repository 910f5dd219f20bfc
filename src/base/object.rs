use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU32, Ordering};

use super::name::Name;
use super::dict::Dict;
use super::number::Number;
use super::string::{format_literal, format_hex};
use super::stream::Stream;
use super::types::*;

/// The base type of all PDF objects.
#[derive(Debug, PartialEq, Clone, Default)]
pub enum Object {
    /// Null object (`null`). Also used as a fall-back for missing or unresolvable values.
    #[default]
    Null,
    /// Bool (`true` or `false`)
    Bool(bool),
    /// Numbers (integer or real)
    Number(Number),
    /// String written in the literal syntax (`(text)`).
    TextString(Vec<u8>),
    /// String written in the hexadecimal syntax (`<74657874>`).
    ByteString(Vec<u8>),
    /// Name (like `/Length`)
    Name(Name),
    /// Array (`[1 2 3]`)
    Array(Vec<Object>),
    /// Dictionary (`<< /Root 1 0 R >>`)
    Dict(Dict),
    /// Stream (`<< ... >> stream ... endstream`)
    Stream(Stream),
    /// Indirect object reference (`3 0 R`)
    Ref(ObjRef)
}

impl Object {
    /// A utility method to create [`Object::TextString`] from a byte slice.
    pub fn new_string(s: &[u8]) -> Object {
        Object::TextString(s.to_owned())
    }

    /// A utility method to create [`Object::Name`] from a byte slice. Don't pass the initial 
    /// `'/'` unless the name is actually supposed to start with `#2F`.
    pub fn new_name(s: &[u8]) -> Object {
        Object::Name(Name::from(s))
    }

    pub fn new_int(val: i64) -> Object {
        Object::Number(Number::Int(val))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            &Object::Bool(val) => Some(val),
            _ => None
        }
    }

    /// Returns the bytes of a string regardless of the syntax it was written in.
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::TextString(val) | Object::ByteString(val) => Some(val),
            _ => None
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Object::Name(val) => Some(val),
            _ => None
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(val) => Some(val),
            _ => None
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dict(val) => Some(val),
            _ => None
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Object::Dict(val) => Some(val),
            _ => None
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(val) => Some(val),
            _ => None
        }
    }

    pub fn as_objref(&self) -> Option<&ObjRef> {
        match self {
            Object::Ref(val) => Some(val),
            _ => None
        }
    }

    /// The dictionary of a [`Object::Dict`] or of a [`Object::Stream`].
    pub fn dict(&self) -> Option<&Dict> {
        match self {
            Object::Dict(dict) => Some(dict),
            Object::Stream(stm) => Some(&stm.dict),
            _ => None
        }
    }

    pub fn dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Object::Dict(dict) => Some(dict),
            Object::Stream(stm) => Some(&mut stm.dict),
            _ => None
        }
    }

    pub fn into_string(self) -> Option<Vec<u8>> {
        match self {
            Object::TextString(val) | Object::ByteString(val) => Some(val),
            _ => None
        }
    }

    pub fn into_name(self) -> Option<Name> {
        match self {
            Object::Name(val) => Some(val),
            _ => None
        }
    }

    pub fn into_array(self) -> Option<Vec<Object>> {
        match self {
            Object::Array(val) => Some(val),
            _ => None
        }
    }

    pub fn into_dict(self) -> Option<Dict> {
        match self {
            Object::Dict(val) => Some(val),
            _ => None
        }
    }

    pub fn into_stream(self) -> Option<Stream> {
        match self {
            Object::Stream(val) => Some(val),
            _ => None
        }
    }

    pub fn into_objref(self) -> Option<ObjRef> {
        match self {
            Object::Ref(val) => Some(val),
            _ => None
        }
    }

    /// For `Object::Number(Number::Int(number))`, extracts the `number` and casts it into the 
    /// required type. Returns `None` both for other types of objects and for value too large for the 
    /// type `T`.
    pub fn num_value<T: TryFrom<i64>>(&self) -> Option<T> {
        match self {
            &Object::Number(Number::Int(num)) => num.try_into().ok(),
            _ => None
        }
    }

    /// Like [`Object::num_value()`] but accepts reals too.
    pub fn real_value(&self) -> Option<f64> {
        match self {
            Object::Number(num) => Some(num.as_f64()),
            _ => None
        }
    }

    /// Checks whether this is a dictionary or a stream with the given `/Type`.
    pub fn has_type(&self, tpe: &[u8]) -> bool {
        self.dict().is_some_and(|dict| dict.lookup(b"Type").as_name().is_some_and(|name| name == &tpe))
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Null => f.write_str("null"),
            Object::Bool(true) => f.write_str("true"),
            Object::Bool(false) => f.write_str("false"),
            Object::Number(num) => write!(f, "{num}"),
            Object::TextString(s) => format_literal(f, s),
            Object::ByteString(s) => format_hex(f, s),
            Object::Name(name) => write!(f, "{}", name),
            Object::Array(arr) => {
                f.write_str("[ ")?;
                for obj in arr {
                    write!(f, "{obj} ")?;
                }
                f.write_str("]")
            },
            Object::Dict(dict) => write!(f, "{}", dict),
            Object::Stream(stm) => write!(f, "{} [stream]", stm.dict),
            Object::Ref(ObjRef{num, gen, ..}) => write!(f, "{num} {gen} R"),
        }
    }
}

impl From<Dict> for Object {
    fn from(dict: Dict) -> Object {
        Object::Dict(dict)
    }
}

impl From<ObjRef> for Object {
    fn from(objref: ObjRef) -> Object {
        Object::Ref(objref)
    }
}

impl From<Stream> for Object {
    fn from(stm: Stream) -> Object {
        Object::Stream(stm)
    }
}


/// Identity of a document owning indirect objects.
///
/// Every reader and writer allocates a fresh `DocId`, so that references coming from different 
/// documents never compare equal even if their numbers coincide.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, PartialOrd, Ord)]
pub struct DocId(u32);

static NEXT_DOC_ID: AtomicU32 = AtomicU32::new(1);

impl DocId {
    /// The identity of references created outside of any document, e.g. by [`ObjRef::new()`].
    pub const DETACHED: DocId = DocId(0);

    /// Allocates a process-unique identity.
    pub fn new() -> DocId {
        DocId(NEXT_DOC_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for DocId {
    fn default() -> DocId {
        DocId::DETACHED
    }
}

/// An indirect object reference.
///
/// Two references are equal only if their object numbers, generation numbers and owning documents 
/// all match.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct ObjRef {
    pub doc: DocId,
    pub num: ObjNum,
    pub gen: ObjGen
}

impl ObjRef {
    /// Creates a reference not bound to any document.
    pub fn new(num: ObjNum, gen: ObjGen) -> ObjRef {
        ObjRef { doc: DocId::DETACHED, num, gen }
    }

    pub fn in_doc(doc: DocId, num: ObjNum, gen: ObjGen) -> ObjRef {
        ObjRef { doc, num, gen }
    }

    /// Whether this reference may be resolved in the document `doc`.
    pub fn belongs_to(&self, doc: DocId) -> bool {
        self.doc == doc || self.doc == DocId::DETACHED
    }
}

impl Display for ObjRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.num, self.gen)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Object::Number(Number::Real(-1.))), "-1.0");
        assert_eq!(format!("{}", Object::new_string(b"")), "()");
        assert_eq!(format!("{}", Object::new_string(b"\0\r\n\\")), "(\\000\\r\\n\\\\)");
        assert_eq!(format!("{}", Object::new_string(b"()")), "(\\(\\))");
        assert_eq!(format!("{}", Object::new_string(b"a\nb c")), "(a\\nb c)");
        assert_eq!(format!("{}", Object::ByteString(vec![0x01, 0xAB])), "<01AB>");
        assert_eq!(format!("{}", Object::new_name(b" A#/$*(%\n")), "/#20A#23#2F$*#28#25#0A");
        assert_eq!(format!("{}", Object::Array(vec![
                Object::new_int(549),
                #[allow(clippy::approx_constant)]
                Object::Number(Number::Real(3.14)),
                Object::Bool(false),
                Object::new_string(b"Ralph"),
                Object::new_name(b"SomeName"),
                Object::Null
        ])), "[ 549 3.14 false (Ralph) /SomeName null ]");
        assert_eq!(format!("{}", Object::Array(vec![Object::Array(vec![Object::Bool(true)])])), "[ [ true ] ]");
        assert_eq!(format!("{}", Object::Dict(Dict::from(vec![
            (Name::from("Type"), Object::new_name(b"Example")),
            (Name::from("Version"), Object::Number(Number::Real(0.01))),
            (Name::from("Subdictionary"), Object::Dict(Dict::from(vec![
                (Name::from("Item1"), Object::Number(Number::Real(0.4))),
                (Name::from("LastItem"), Object::new_string(b"not !")),
            ])))
        ]))), "<< /Type /Example /Version 0.01 /Subdictionary << /Item1 0.4 /LastItem (not !) >> >>");
        assert_eq!(format!("{}", Object::Dict(Dict::from(vec![
            (Name::from("Length"), Object::Ref(ObjRef::new(8, 0)))]))), "<< /Length 8 0 R >>");
    }

    #[test]
    fn test_ref_identity() {
        let doc1 = DocId::new();
        let doc2 = DocId::new();
        assert_ne!(doc1, doc2);
        assert_ne!(ObjRef::in_doc(doc1, 1, 0), ObjRef::in_doc(doc2, 1, 0));
        assert_ne!(ObjRef::in_doc(doc1, 1, 0), ObjRef::in_doc(doc1, 1, 1));
        assert_eq!(ObjRef::in_doc(doc1, 4, 0), ObjRef::in_doc(doc1, 4, 0));
        assert!(ObjRef::new(4, 0).belongs_to(doc1));
        assert!(!ObjRef::in_doc(doc2, 4, 0).belongs_to(doc1));
    }

    #[test]
    fn test_accessors() {
        let obj = Object::new_int(42);
        assert_eq!(obj.num_value::<u8>(), Some(42));
        assert_eq!(Object::new_int(-1).num_value::<u32>(), None);
        assert_eq!(obj.real_value(), Some(42.));
        assert_eq!(Object::ByteString(b"ab".to_vec()).as_string(), Some(&b"ab"[..]));
        let dict = Object::Dict(Dict::from(vec![(Name::from("Type"), Object::new_name(b"Page"))]));
        assert!(dict.has_type(b"Page"));
        assert!(!dict.has_type(b"Pages"));
    }
}
