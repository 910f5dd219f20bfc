use crate::base::Error;
use crate::parser::cc::CharClass;

pub(super) fn decode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let start = data.iter().position(|c| CharClass::of(*c) != CharClass::Space).unwrap_or(data.len());
    let data = data[start..].strip_prefix(b"<~").unwrap_or(&data[start..]);
    let mut out = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut len = 0;
    for &c in data {
        match c {
            b'~' => break,
            b'z' if len == 0 => out.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[len] = c - b'!';
                len += 1;
                if len == 5 {
                    out.extend_from_slice(&group_value(&group)?.to_be_bytes());
                    len = 0;
                }
            },
            _ if CharClass::of(c) == CharClass::Space => continue,
            _ => return Err(Error::Decode("invalid character in ASCII85 data"))
        }
    }
    match len {
        0 => (),
        1 => return Err(Error::Decode("ASCII85 data ends with a lone character")),
        _ => {
            group[len..].fill(b'u' - b'!');
            out.extend_from_slice(&group_value(&group)?.to_be_bytes()[..(len - 1)]);
        }
    }
    Ok(out)
}

fn group_value(group: &[u8; 5]) -> Result<u32, Error> {
    let value = group.iter().fold(0u64, |acc, d| acc * 85 + u64::from(*d));
    u32::try_from(value).map_err(|_| Error::Decode("ASCII85 group out of range"))
}

pub(super) fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 5 / 4 + 2);
    for chunk in data.chunks(4) {
        let mut bytes = [0u8; 4];
        bytes[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(bytes);
        if value == 0 && chunk.len() == 4 {
            out.push(b'z');
            continue;
        }
        let mut digits = [0u8; 5];
        for d in digits.iter_mut().rev() {
            *d = (value % 85) as u8 + b'!';
            value /= 85;
        }
        out.extend_from_slice(&digits[..=chunk.len()]);
    }
    out.extend_from_slice(b"~>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii85() {
        assert_eq!(decode(b"87cURD]i,\"Ebo80~>").unwrap(), b"Hello World!");
        assert_eq!(decode(b"<~87cUR D]i,\"Ebo80~>").unwrap(), b"Hello World!");
        assert_eq!(decode(b"z~>").unwrap(), b"\0\0\0\0");
        assert_eq!(decode(b"@/~>").unwrap(), b"a");
        assert_eq!(decode(b"~>").unwrap(), b"");
        assert!(decode(b"@~>").is_err());
        assert!(decode(b"s8W-\"~>").is_err());
        assert!(decode(b"!!z!!!~>").is_err());

        assert_eq!(encode(b"Hello World!"), b"87cURD]i,\"Ebo80~>");
        assert_eq!(encode(b"\0\0\0\0a"), b"z@/~>");
        let data = (0..=255).collect::<Vec<u8>>();
        assert_eq!(decode(&encode(&data)).unwrap(), data);
    }
}
