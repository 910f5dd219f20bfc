use crate::base::{Dict, Object};

const SHORT: u16 = 3;
const LONG: u16 = 4;
const TAG_COUNT: u16 = 8;
const HEADER_LEN: u32 = 8 + 2 + 12 * TAG_COUNT as u32 + 4;

/// Wraps CCITT-encoded data in a single-strip little-endian TIFF file so that it can be handed to 
/// a general image decoder. The bitstream itself is not decoded.
pub(super) fn wrap_tiff(data: &[u8], params: &Dict) -> Vec<u8> {
    let k: i64 = params.lookup(b"K").num_value().unwrap_or(0);
    let columns: u32 = params.lookup(b"Columns").num_value().unwrap_or(1728);
    let rows: u32 = params.lookup(b"Rows").num_value().unwrap_or(0);
    let black_is_1 = params.lookup(b"BlackIs1") == &Object::Bool(true);
    let compression = if k < 0 { 4 } else { 3 };
    let photometric = if black_is_1 { 1 } else { 0 };

    let mut out = Vec::with_capacity(HEADER_LEN as usize + data.len());
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());
    out.extend_from_slice(&TAG_COUNT.to_le_bytes());
    let tags: [(u16, u16, u32); TAG_COUNT as usize] = [
        (256, LONG, columns),          // ImageWidth
        (257, LONG, rows),             // ImageLength
        (258, SHORT, 1),               // BitsPerSample
        (259, SHORT, compression),     // Compression
        (262, SHORT, photometric),     // PhotometricInterpretation
        (273, LONG, HEADER_LEN),       // StripOffsets
        (278, LONG, rows),             // RowsPerStrip
        (279, LONG, data.len() as u32) // StripByteCounts
    ];
    for (tag, tpe, value) in tags {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&tpe.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        // A SHORT value is left-justified in the 4-byte field, which in little endian is the 
        // same as writing it as a LONG.
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(data);
    out
}
