use std::fmt::Formatter;

pub(crate) fn format_literal(f: &mut Formatter<'_>, s: &[u8]) -> std::fmt::Result {
    f.write_str("(")?;
    for c in s {
        match c {
            b'\x0a' => f.write_str("\\n"),
            b'\x0d' => f.write_str("\\r"),
            b'\x09' => f.write_str("\\t"),
            b'\x08' => f.write_str("\\b"),
            b'\x0c' => f.write_str("\\f"),
            b'(' => f.write_str("\\("),
            b')' => f.write_str("\\)"),
            b'\\' => f.write_str("\\\\"),
            b'\x20' ..= b'\x7E' => write!(f, "{}", *c as char),
            _ => write!(f, "\\{c:03o}")
        }?
    }
    f.write_str(")")
}

pub(crate) fn format_hex(f: &mut Formatter<'_>, s: &[u8]) -> std::fmt::Result {
    f.write_str("<")?;
    for c in s {
        write!(f, "{c:02X}")?;
    }
    f.write_str(">")
}

/// Decodes a PDF text string into a Rust `String`.
///
/// Strings starting with a byte order mark are decoded as UTF-16BE (`FE FF`) or UTF-8
/// (`EF BB BF`), everything else is treated as Latin-1.
pub fn decode_text(s: &[u8]) -> String {
    match s {
        [0xFE, 0xFF, rest @ ..] => {
            let units = rest.chunks(2)
                .map(|ch| match *ch {
                    [hi, lo] => u16::from_be_bytes([hi, lo]),
                    [hi] => u16::from_be_bytes([hi, 0]),
                    _ => unreachable!()
                })
                .collect::<Vec<_>>();
            String::from_utf16_lossy(&units)
        },
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => s.iter().map(|&c| c as char).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b"plain"), "plain");
        assert_eq!(decode_text(b"\xFE\xFF\x00A\x00\xE9"), "A\u{e9}");
        assert_eq!(decode_text(b"\xEF\xBB\xBFna\xC3\xAFve"), "na\u{ef}ve");
        assert_eq!(decode_text(b"caf\xE9"), "caf\u{e9}");
    }
}
