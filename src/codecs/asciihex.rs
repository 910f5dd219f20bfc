use crate::base::Error;
use crate::parser::cc::CharClass;
use crate::utils;

pub(super) fn decode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high = None;
    for &c in data {
        if c == b'>' {
            break;
        }
        if CharClass::of(c) == CharClass::Space {
            continue;
        }
        let digit = utils::hex_value(c).ok_or(Error::Decode("invalid character in ASCIIHex data"))?;
        high = match high {
            None => Some(digit),
            Some(msd) => {
                out.push((msd << 4) | digit);
                None
            }
        };
    }
    if let Some(msd) = high {
        out.push(msd << 4);
    }
    Ok(out)
}

pub(super) fn encode(data: &[u8]) -> Vec<u8> {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = Vec::with_capacity(data.len() * 2 + 1);
    for &c in data {
        out.push(DIGITS[(c >> 4) as usize]);
        out.push(DIGITS[(c & 15) as usize]);
    }
    out.push(b'>');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asciihex() {
        assert_eq!(decode(b"61 62 6 3>").unwrap(), b"abc");
        assert_eq!(decode(b"616263").unwrap(), b"abc");
        assert_eq!(decode(b"61626>").unwrap(), b"ab`");
        assert_eq!(decode(b"6\n1>6263").unwrap(), b"a");
        assert_eq!(decode(b">").unwrap(), b"");
        assert!(decode(b"6x>").is_err());

        assert_eq!(encode(b"a\x0F\xFF"), b"610FFF>");
    }
}
