//! Stream filters.
//!
//! Decoding works on whole buffers: each filter takes the output of the previous one, in the 
//! order they are listed in `/Filter`. Output size of the decompressing filters is bounded by 
//! [`DecodeOptions::max_output`].

mod asciihex;
mod ascii85;
mod flate;
mod predictor;
mod lzw;
mod runlength;
mod ccitt;
mod jbig2;

use std::borrow::Cow;

use crate::base::*;
use crate::config::ReadOptions;

pub use jbig2::{Jbig2Decoder, Jbig2Process};

/// A stream filter together with its decode parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    AsciiHex,
    Ascii85,
    Lzw(Dict),
    Flate(Dict),
    RunLength,
    CcittFax(Dict),
    Dct,
    Jpx,
    Jbig2 {
        params: Dict,
        /// Decoded contents of the `/JBIG2Globals` stream, if any.
        globals: Option<Vec<u8>>
    },
    Crypt(Dict),
}

impl Filter {
    /// The full name under which this filter appears in `/Filter`.
    pub fn name(&self) -> Name {
        Name::from(match self {
            Filter::AsciiHex => "ASCIIHexDecode",
            Filter::Ascii85 => "ASCII85Decode",
            Filter::Lzw(_) => "LZWDecode",
            Filter::Flate(_) => "FlateDecode",
            Filter::RunLength => "RunLengthDecode",
            Filter::CcittFax(_) => "CCITTFaxDecode",
            Filter::Dct => "DCTDecode",
            Filter::Jpx => "JPXDecode",
            Filter::Jbig2 { .. } => "JBIG2Decode",
            Filter::Crypt(_) => "Crypt",
        })
    }

    /// Returns `true` if [`decode()`] turns the data into their unfiltered form. Image filters 
    /// whose output is still an encoded image (or a wrapper around it) return `false`.
    pub fn is_lossless_decodable(&self) -> bool {
        matches!(self, Filter::AsciiHex | Filter::Ascii85 | Filter::Lzw(_) | Filter::Flate(_) | Filter::RunLength)
    }

    fn from_name<R: Resolver + ?Sized>(name: Name, mut params: Dict, stm_dict: &Dict, resolver: &R,
        options: &DecodeOptions) -> Result<Filter, Error>
    {
        Ok(match name.as_bytes() {
            b"ASCIIHexDecode" | b"AHx" => Filter::AsciiHex,
            b"ASCII85Decode" | b"A85" => Filter::Ascii85,
            b"LZWDecode" | b"LZW" => Filter::Lzw(params),
            b"FlateDecode" | b"Fl" => Filter::Flate(params),
            b"RunLengthDecode" | b"RL" => Filter::RunLength,
            b"CCITTFaxDecode" | b"CCF" => {
                if !params.contains_key(b"Rows") {
                    let height = stm_dict.get(b"Height").or_else(|| stm_dict.get(b"H"));
                    if let Some(height) = height {
                        if let Ok(height @ Object::Number(_)) = resolver.resolve_obj(height.clone()) {
                            params.insert("Rows", height);
                        }
                    }
                }
                Filter::CcittFax(params)
            },
            b"DCTDecode" | b"DCT" => Filter::Dct,
            b"JPXDecode" => Filter::Jpx,
            b"JBIG2Decode" => {
                let globals = match params.remove(b"JBIG2Globals") {
                    None | Some(Object::Null) => None,
                    Some(obj) => match resolver.resolve_obj(obj)? {
                        Object::Stream(stm) => {
                            let filters = parse_filters(&stm.dict, resolver, options)?;
                            if filters.iter().any(|f| matches!(f, Filter::Jbig2 { .. })) {
                                return Err(Error::Decode("JBIG2 globals stream encoded using JBIG2"));
                            }
                            Some(decode(stm.data(), &filters, options)?)
                        },
                        _ => return Err(Error::Parse("malformed /JBIG2Globals"))
                    }
                };
                Filter::Jbig2 { params, globals }
            },
            b"Crypt" => Filter::Crypt(params),
            _ => return Err(Error::UnsupportedFilter(name))
        })
    }
}

/// Limits and external capabilities used by [`decode()`].
#[derive(Clone, Copy)]
pub struct DecodeOptions<'a> {
    /// Maximum size of the output of a single Flate, LZW or JBIG2 filter.
    pub max_output: usize,
    /// The JBIG2 decoder to use. If `None`, [`Jbig2Process`] is used.
    pub jbig2: Option<&'a dyn Jbig2Decoder>,
}

impl Default for DecodeOptions<'_> {
    fn default() -> Self {
        DecodeOptions { max_output: 75_000_000, jbig2: None }
    }
}

impl From<&ReadOptions> for DecodeOptions<'_> {
    fn from(options: &ReadOptions) -> Self {
        DecodeOptions { max_output: options.max_decoded_size, jbig2: None }
    }
}

impl<'a> DecodeOptions<'a> {
    pub fn with_max_output(self, max_output: usize) -> Self {
        DecodeOptions { max_output, ..self }
    }

    pub fn with_jbig2(self, jbig2: &'a dyn Jbig2Decoder) -> Self {
        DecodeOptions { jbig2: Some(jbig2), ..self }
    }
}

fn parse_err() -> Error {
    Error::Parse("malformed /Filter or /DecodeParms")
}

/// Reads `/Filter` and `/DecodeParms` of a stream dictionary.
///
/// Indirect references within either are resolved using `resolver`. The inline image 
/// abbreviations (`/F`, `/DP` and the short filter names) are accepted as well.
pub fn parse_filters<R: Resolver + ?Sized>(dict: &Dict, resolver: &R, options: &DecodeOptions)
    -> Result<Vec<Filter>, Error>
{
    let filter = dict.get(b"Filter").or_else(|| dict.get(b"F")).cloned().unwrap_or_default();
    let names = match resolver.resolve_obj(filter)? {
        Object::Null => return Ok(Vec::new()),
        Object::Name(name) => vec![name],
        Object::Array(arr) => arr.into_iter()
            .map(|obj| resolver.resolve_obj(obj)?.into_name().ok_or_else(parse_err))
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(parse_err())
    };
    let parms = dict.get(b"DecodeParms").or_else(|| dict.get(b"DP")).cloned().unwrap_or_default();
    let to_dict = |obj: Object| -> Result<Dict, Error> {
        match resolver.resolve_deep(obj)? {
            Object::Dict(dict) => Ok(dict),
            Object::Null => Ok(Dict::new()),
            _ => Err(parse_err())
        }
    };
    let mut parms = match resolver.resolve_obj(parms)? {
        Object::Array(arr) => arr.into_iter()
            .map(to_dict)
            .collect::<Result<Vec<_>, _>>()?,
        obj => vec![to_dict(obj)?]
    }.into_iter();
    names.into_iter()
        .map(|name| Filter::from_name(name, parms.next().unwrap_or_default(), dict, resolver, options))
        .collect()
}

/// Applies a chain of filters to `data`.
pub fn decode(data: &[u8], filters: &[Filter], options: &DecodeOptions) -> Result<Vec<u8>, Error> {
    let mut data = Cow::Borrowed(data);
    for filter in filters {
        data = Cow::Owned(decode_one(&data, filter, options)?);
    }
    Ok(data.into_owned())
}

fn decode_one(data: &[u8], filter: &Filter, options: &DecodeOptions) -> Result<Vec<u8>, Error> {
    let limit = options.max_output;
    match filter {
        Filter::AsciiHex => asciihex::decode(data),
        Filter::Ascii85 => ascii85::decode(data),
        Filter::Lzw(params) => {
            let early = params.lookup(b"EarlyChange").num_value::<i64>().unwrap_or(1) != 0;
            predictor::decode(lzw::decode(data, early, limit)?, params)
        },
        Filter::Flate(params) => predictor::decode(flate::decode(data, limit)?, params),
        Filter::RunLength => runlength::decode(data),
        Filter::CcittFax(params) => Ok(ccitt::wrap_tiff(data, params)),
        Filter::Dct | Filter::Jpx => Ok(data.to_vec()),
        Filter::Jbig2 { params, globals } => {
            let decoder = options.jbig2.unwrap_or(&Jbig2Process);
            let out = decoder.decode(data, globals.as_deref(), params, limit)?;
            if out.len() > limit {
                return Err(Error::DecompressionLimitExceeded { limit });
            }
            Ok(out)
        },
        Filter::Crypt(params) => match params.lookup(b"Name") {
            Object::Null => Ok(data.to_vec()),
            Object::Name(name) if name == b"Identity" => Ok(data.to_vec()),
            _ => Err(Error::UnsupportedFilter(filter.name()))
        }
    }
}

/// Encodes `data` so that decoding with `filters` gives it back.
///
/// Only the filters for which [`Filter::is_lossless_decodable()`] holds can be encoded.
pub fn encode(data: &[u8], filters: &[Filter]) -> Result<Vec<u8>, Error> {
    let mut data = data.to_vec();
    for filter in filters.iter().rev() {
        data = match filter {
            Filter::AsciiHex => asciihex::encode(&data),
            Filter::Ascii85 => ascii85::encode(&data),
            Filter::Lzw(params) => {
                if params.lookup(b"EarlyChange").num_value::<i64>() == Some(0) {
                    return Err(Error::UnsupportedFilter(filter.name()));
                }
                lzw::encode(&predictor::encode(data, params)?)
            },
            Filter::Flate(params) => flate::encode(&predictor::encode(data, params)?)?,
            Filter::RunLength => runlength::encode(&data),
            _ => return Err(Error::UnsupportedFilter(filter.name()))
        };
    }
    Ok(data)
}
