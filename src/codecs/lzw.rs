use std::collections::HashMap;

use crate::base::Error;

const CLEAR: u16 = 256;
const EOD: u16 = 257;
const FIRST_CODE: u16 = 258;
const MAX_CODES: usize = 4096;
const MAX_WIDTH: u32 = 12;

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u32,
    nbits: u32,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        BitReader { data, pos: 0, acc: 0, nbits: 0 }
    }

    fn read(&mut self, width: u32) -> Option<u16> {
        while self.nbits < width {
            let &byte = self.data.get(self.pos)?;
            self.pos += 1;
            self.acc = (self.acc << 8) | u32::from(byte);
            self.nbits += 8;
        }
        self.nbits -= width;
        let code = (self.acc >> self.nbits) as u16;
        self.acc &= (1 << self.nbits) - 1;
        Some(code)
    }
}

#[derive(Default)]
struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    nbits: u32,
}

impl BitWriter {
    fn write(&mut self, code: u16, width: u32) {
        self.acc = (self.acc << width) | u32::from(code);
        self.nbits += width;
        while self.nbits >= 8 {
            self.nbits -= 8;
            self.out.push((self.acc >> self.nbits) as u8);
        }
        self.acc &= (1 << self.nbits) - 1;
    }

    fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.out.push((self.acc << (8 - self.nbits)) as u8);
        }
        self.out
    }
}

struct Table {
    entries: Vec<Vec<u8>>,
    width: u32,
    early: usize,
}

impl Table {
    fn new(early_change: bool) -> Self {
        let mut entries = (0..=255).map(|c| vec![c]).collect::<Vec<_>>();
        entries.push(Vec::new());
        entries.push(Vec::new());
        Table { entries, width: 9, early: early_change.into() }
    }

    fn clear(&mut self) {
        self.entries.truncate(FIRST_CODE as usize);
        self.width = 9;
    }

    fn add(&mut self, entry: Vec<u8>) {
        if self.entries.len() < MAX_CODES {
            self.entries.push(entry);
        }
        if self.entries.len() + self.early >= 1 << self.width && self.width < MAX_WIDTH {
            self.width += 1;
        }
    }
}

pub(super) fn decode(data: &[u8], early_change: bool, limit: usize) -> Result<Vec<u8>, Error> {
    let mut table = Table::new(early_change);
    let mut bits = BitReader::new(data);
    let mut out = Vec::new();
    let mut prev: Option<usize> = None;
    loop {
        let Some(code) = bits.read(table.width) else {
            log::warn!("LZW data without EOD marker.");
            break;
        };
        match code {
            CLEAR => {
                table.clear();
                prev = None;
                continue;
            },
            EOD => break,
            _ => ()
        }
        let code = usize::from(code);
        let entry = match prev {
            _ if code < table.entries.len() => table.entries[code].clone(),
            Some(p) if code == table.entries.len() => {
                let mut entry = table.entries[p].clone();
                entry.push(entry[0]);
                entry
            },
            _ => return Err(Error::Decode("invalid LZW code"))
        };
        if out.len() + entry.len() > limit {
            return Err(Error::DecompressionLimitExceeded { limit });
        }
        out.extend_from_slice(&entry);
        if let Some(p) = prev {
            let mut new = table.entries[p].clone();
            new.push(entry[0]);
            table.add(new);
        }
        prev = Some(code);
    }
    Ok(out)
}

/// Encodes with `/EarlyChange 1`.
pub(super) fn encode(data: &[u8]) -> Vec<u8> {
    let mut bits = BitWriter::default();
    let mut dict = HashMap::<(u16, u8), u16>::new();
    let mut next_code = FIRST_CODE;
    let mut width = 9;
    bits.write(CLEAR, width);
    let mut iter = data.iter().copied();
    let Some(first) = iter.next() else {
        bits.write(EOD, width);
        return bits.finish();
    };
    let mut cur = u16::from(first);
    for c in iter {
        if let Some(&code) = dict.get(&(cur, c)) {
            cur = code;
            continue;
        }
        bits.write(cur, width);
        dict.insert((cur, c), next_code);
        next_code += 1;
        if u32::from(next_code) >= 1 << width && width < MAX_WIDTH {
            width += 1;
        }
        if usize::from(next_code) == MAX_CODES {
            bits.write(CLEAR, width);
            dict.clear();
            next_code = FIRST_CODE;
            width = 9;
        }
        cur = u16::from(c);
    }
    bits.write(cur, width);
    if u32::from(next_code) + 1 >= 1 << width && width < MAX_WIDTH {
        width += 1;
    }
    bits.write(EOD, width);
    bits.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        let input = [0x80, 0x0B, 0x60, 0x50, 0x22, 0x0C, 0x0C, 0x85, 0x01];
        assert_eq!(decode(&input, true, 100).unwrap(), vec![45, 45, 45, 45, 45, 65, 45, 45, 45, 66]);
        assert!(matches!(decode(&input, true, 5), Err(Error::DecompressionLimitExceeded { limit: 5 })));
        assert_eq!(encode(&[45, 45, 45, 45, 45, 65, 45, 45, 45, 66]), input);
    }

    #[test]
    fn test_invalid() {
        // CLEAR, then code 300 which is not in the table
        let mut bits = BitWriter::default();
        bits.write(CLEAR, 9);
        bits.write(300, 9);
        assert!(decode(&bits.finish(), true, 100).is_err());
    }

    #[test]
    fn test_roundtrip() {
        for data in [&b""[..], b"a", b"aaaaaaaaaaaaaaaaaaaaaaaaa", b"TOBEORNOTTOBEORTOBEORNOT"] {
            assert_eq!(decode(&encode(data), true, usize::MAX).unwrap(), data);
        }
        // Long enough to grow the code width to 12 and fill the table several times.
        let mut x = 1u32;
        let data = (0..200_000).map(|_| { x = x.wrapping_mul(69069).wrapping_add(1); (x >> 24) as u8 % 16 }).collect::<Vec<_>>();
        assert_eq!(decode(&encode(&data), true, usize::MAX).unwrap(), data);
        let data = (0..100_000u32).map(|x| (x % 251) as u8).collect::<Vec<_>>();
        assert_eq!(decode(&encode(&data), true, usize::MAX).unwrap(), data);
    }
}
