use std::io::Write;

use flate2::{Compression, Decompress, FlushDecompress, Status};
use flate2::write::ZlibEncoder;

use crate::base::Error;

/// Inflates `data`, producing at most `limit` bytes.
///
/// Some producers append junk after the compressed stream or cut it short. If the data does not 
/// inflate cleanly, up to 8 trailing bytes are trimmed, then a headerless deflate stream is 
/// tried, and finally whatever can be inflated before the first error is returned.
pub(super) fn decode(data: &[u8], limit: usize) -> Result<Vec<u8>, Error> {
    let err = match inflate(data, true, limit) {
        Ok(out) => return Ok(out),
        Err(err @ Error::DecompressionLimitExceeded { .. }) => return Err(err),
        Err(err) => err
    };
    for trim in 1..=std::cmp::min(8, data.len()) {
        match inflate(&data[..(data.len() - trim)], true, limit) {
            Ok(out) => {
                log::warn!("Flate data inflated after trimming {trim} trailing bytes.");
                return Ok(out);
            },
            Err(err @ Error::DecompressionLimitExceeded { .. }) => return Err(err),
            Err(_) => ()
        }
    }
    match inflate(data, false, limit) {
        Ok(out) => {
            log::warn!("Flate data without zlib header.");
            return Ok(out);
        },
        Err(err @ Error::DecompressionLimitExceeded { .. }) => return Err(err),
        Err(_) => ()
    }
    log::warn!("Flate data corrupt ({err}), recovering what is possible.");
    resilient_inflate(data, limit)
}

fn inflate(data: &[u8], zlib_header: bool, limit: usize) -> Result<Vec<u8>, Error> {
    let mut dec = Decompress::new(zlib_header);
    let mut out = Vec::with_capacity(std::cmp::min(data.len().saturating_mul(4), limit.saturating_add(1)).max(64));
    loop {
        if out.len() == out.capacity() {
            if out.len() > limit {
                return Err(Error::DecompressionLimitExceeded { limit });
            }
            let grow = std::cmp::min(out.capacity(), limit.saturating_add(1) - out.len());
            out.reserve_exact(grow.max(1));
        }
        let (in_before, out_before) = (dec.total_in(), dec.total_out());
        let input = data.get(in_before as usize..).unwrap_or_default();
        let status = dec.decompress_vec(input, &mut out, FlushDecompress::None)
            .map_err(|_| Error::Decode("invalid Flate data"))?;
        if out.len() > limit {
            return Err(Error::DecompressionLimitExceeded { limit });
        }
        match status {
            Status::StreamEnd => return Ok(out),
            _ if dec.total_in() == in_before && dec.total_out() == out_before
                && out.len() < out.capacity() =>
                return Err(Error::Decode("truncated Flate data")),
            _ => ()
        }
    }
}

// Feeds the data one byte at a time, keeping everything produced before the first error.
fn resilient_inflate(data: &[u8], limit: usize) -> Result<Vec<u8>, Error> {
    let mut dec = Decompress::new(true);
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let pos = dec.total_in() as usize;
        if pos >= data.len() {
            break;
        }
        let out_before = dec.total_out();
        let Ok(status) = dec.decompress(&data[pos..=pos], &mut buf, FlushDecompress::None) else {
            break
        };
        let produced = (dec.total_out() - out_before) as usize;
        out.extend_from_slice(&buf[..produced]);
        if out.len() > limit {
            return Err(Error::DecompressionLimitExceeded { limit });
        }
        if status == Status::StreamEnd || (produced == 0 && dec.total_in() as usize == pos) {
            break;
        }
    }
    Ok(out)
}

pub(super) fn encode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data)?;
    Ok(enc.finish()?)
}
