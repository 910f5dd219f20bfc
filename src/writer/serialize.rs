use std::io::Write;

use sha2::{Digest, Sha256};

use crate::base::*;
use crate::base::types::*;

/// Writes `obj` in PDF syntax. Every indirect reference is passed through `map`, which either
/// returns the number and generation to be written or rejects the reference.
///
/// Streams are written with a direct `/Length` equal to the size of their payload, regardless of
/// the value found in the dictionary.
pub(crate) fn write_object<F>(out: &mut Vec<u8>, obj: &Object, map: &mut F) -> Result<(), Error>
    where F: FnMut(&ObjRef) -> Result<(ObjNum, ObjGen), Error>
{
    match obj {
        Object::Array(arr) => {
            out.push(b'[');
            for (ix, item) in arr.iter().enumerate() {
                if ix > 0 {
                    out.push(b' ');
                }
                write_object(out, item, map)?;
            }
            out.push(b']');
        },
        Object::Dict(dict) => write_dict(out, dict, None, map)?,
        Object::Stream(stm) => {
            write_dict(out, &stm.dict, Some(stm.data().len()), map)?;
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(stm.data());
            out.extend_from_slice(b"\nendstream");
        },
        Object::Ref(objref) => {
            let (num, gen) = map(objref)?;
            write!(out, "{num} {gen} R")?;
        },
        _ => write!(out, "{obj}")?
    }
    Ok(())
}

fn write_dict<F>(out: &mut Vec<u8>, dict: &Dict, length: Option<usize>, map: &mut F) -> Result<(), Error>
    where F: FnMut(&ObjRef) -> Result<(ObjNum, ObjGen), Error>
{
    out.extend_from_slice(b"<<");
    let mut length = length;
    for (key, value) in dict {
        write!(out, "{key} ")?;
        match length {
            Some(len) if key == b"Length" => {
                write!(out, "{len}")?;
                length = None;
            },
            _ => write_object(out, value, map)?
        }
        out.push(b' ');
    }
    if let Some(len) = length {
        write!(out, "/Length {len} ")?;
    }
    out.extend_from_slice(b">>");
    Ok(())
}

/// Writes a complete indirect object, `num gen obj ... endobj`.
pub(crate) fn write_indirect<F>(out: &mut Vec<u8>, num: ObjNum, gen: ObjGen, obj: &Object, map: &mut F)
    -> Result<(), Error>
    where F: FnMut(&ObjRef) -> Result<(ObjNum, ObjGen), Error>
{
    writeln!(out, "{num} {gen} obj")?;
    write_object(out, obj, map)?;
    out.extend_from_slice(b"\nendobj\n");
    Ok(())
}

/// SHA-256 of the serialization of `obj`, with references written as they are.
///
/// Returns `None` if `obj` contains a reference not belonging to `doc`, as such an object has no
/// canonical serialization.
pub(crate) fn content_hash(obj: &Object, doc: DocId) -> Option<[u8; 32]> {
    let mut buf = Vec::new();
    write_object(&mut buf, obj, &mut |objref| {
        if objref.belongs_to(doc) {
            Ok((objref.num, objref.gen))
        } else {
            Err(Error::WriteIntegrity(format!("reference {objref} from another document")))
        }
    }).ok()?;
    Some(Sha256::digest(&buf).into())
}
