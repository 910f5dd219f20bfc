//! Encryption capability.
//!
//! This crate does not implement any security handler itself. A [`SecurityHandler`] is installed 
//! into a [`Reader`](crate::reader::Reader) or a [`Writer`](crate::writer::Writer) by the caller, 
//! which then uses it for every indirect object read or written.

use crate::base::*;
use crate::base::types::*;

/// Result of a password check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStatus {
    /// The password was not accepted.
    NotDecrypted,
    /// Accepted as the user password.
    User,
    /// Accepted as the owner password.
    Owner,
}

pub trait SecurityHandler {
    /// Checks a password and, if accepted, derives the key for subsequent operations.
    fn verify(&mut self, password: &[u8]) -> PasswordStatus;

    /// Whether a key is available, i.e. a password has been accepted.
    fn is_decrypted(&self) -> bool;

    /// Decrypts all strings and stream data of the indirect object `num gen`.
    fn decrypt_object(&self, obj: Object, num: ObjNum, gen: ObjGen) -> Result<Object, Error>;

    /// Encrypts all strings and stream data of the indirect object `num gen`.
    fn encrypt_object(&self, obj: Object, num: ObjNum, gen: ObjGen) -> Result<Object, Error>;
}

/// Applies `func` to every string within `obj` and to the data of a stream, leaving everything 
/// else unchanged. Meant as a building block for [`SecurityHandler`] implementations.
pub fn apply_to_strings<F>(obj: Object, func: &mut F) -> Result<Object, Error>
    where F: FnMut(Vec<u8>) -> Result<Vec<u8>, Error>
{
    Ok(match obj {
        Object::TextString(s) => Object::TextString(func(s)?),
        Object::ByteString(s) => Object::ByteString(func(s)?),
        Object::Array(arr) => Object::Array(arr.into_iter()
            .map(|obj| apply_to_strings(obj, func))
            .collect::<Result<Vec<_>, _>>()?),
        Object::Dict(dict) => Object::Dict(apply_to_dict(dict, func)?),
        Object::Stream(stm) => {
            let (dict, data) = stm.into_parts();
            Object::Stream(Stream::new(apply_to_dict(dict, func)?, func(data)?))
        },
        obj => obj
    })
}

fn apply_to_dict<F>(dict: Dict, func: &mut F) -> Result<Dict, Error>
    where F: FnMut(Vec<u8>) -> Result<Vec<u8>, Error>
{
    let mut out = Dict::new();
    for (key, value) in dict {
        out.insert(key, apply_to_strings(value, func)?);
    }
    Ok(out)
}
