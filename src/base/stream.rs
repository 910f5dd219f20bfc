use std::cell::OnceCell;

use super::*;

/// A PDF stream object: a dictionary and the raw (still encoded) payload.
///
/// The decoded form of the payload is computed on demand and cached in the instance (see 
/// [`Reader::stream_data()`](crate::reader::Reader::stream_data)).
#[derive(Debug, Clone)]
pub struct Stream {
    /// The stream dictionary.
    pub dict: Dict,
    data: Vec<u8>,
    decoded: OnceCell<Vec<u8>>,
}

impl Stream {
    pub fn new(dict: Dict, data: Vec<u8>) -> Stream {
        Stream { dict, data, decoded: OnceCell::new() }
    }

    /// The raw payload, as found between `stream` and `endstream`.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replaces the raw payload. Updates `/Length` and drops any cached decoded data.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.dict.insert("Length", Object::new_int(data.len() as i64));
        self.data = data;
        self.decoded = OnceCell::new();
    }

    /// The decoded payload, if it has been computed already.
    pub fn decoded(&self) -> Option<&[u8]> {
        self.decoded.get().map(Vec::as_slice)
    }

    pub(crate) fn cache_decoded(&self, data: Vec<u8>) -> &[u8] {
        self.decoded.get_or_init(|| data)
    }

    pub fn into_parts(self) -> (Dict, Vec<u8>) {
        (self.dict, self.data)
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Stream) -> bool {
        self.dict == other.dict && self.data == other.data
    }
}
