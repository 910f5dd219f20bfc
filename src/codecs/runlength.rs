use crate::base::Error;

pub(super) fn decode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut pos = 0;
    while pos < data.len() {
        let len = data[pos];
        match len {
            128 => return Ok(out),
            0..=127 => {
                let count = usize::from(len) + 1;
                let lit = data.get((pos + 1)..(pos + 1 + count))
                    .ok_or(Error::Decode("RunLength literal run truncated"))?;
                out.extend_from_slice(lit);
                pos += 1 + count;
            },
            _ => {
                let c = *data.get(pos + 1).ok_or(Error::Decode("RunLength repeat run truncated"))?;
                out.resize(out.len() + 257 - usize::from(len), c);
                pos += 2;
            }
        }
        if &data[pos..] == b"\n" {
            break;
        }
    }
    log::warn!("RunLength data without EOD marker.");
    Ok(out)
}

pub(super) fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 128 + 2);
    let mut pos = 0;
    while pos < data.len() {
        let c = data[pos];
        let run = data[pos..].iter().take(128).take_while(|&&d| d == c).count();
        if run >= 2 {
            out.push((257 - run) as u8);
            out.push(c);
            pos += run;
            continue;
        }
        // Literal run: up to the next pair of equal bytes.
        let mut end = pos + 1;
        while end < data.len() && end - pos < 128 && !(end + 1 < data.len() && data[end] == data[end + 1]) {
            end += 1;
        }
        out.push((end - pos - 1) as u8);
        out.extend_from_slice(&data[pos..end]);
        pos = end;
    }
    out.push(128);
    out
}
