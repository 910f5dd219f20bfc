use std::io::BufRead;

use super::cc::CharClass;

pub trait ByteProvider: BufRead {
    fn peek(&mut self) -> Option<u8> {
        match self.fill_buf() {
            Ok(buf) => buf.first().copied(),
            _ => None
        }
    }

    fn next_or_eof(&mut self) -> std::io::Result<u8> {
        let buf = self.fill_buf()?;
        if !buf.is_empty() {
            let ret = buf[0];
            self.consume(1);
            Ok(ret)
        } else {
            Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof))
        }
    }

    fn next_if(&mut self, cond: impl FnOnce(u8) -> bool) -> Option<u8> {
        let buf = self.fill_buf().ok()?;
        if !buf.is_empty() && cond(buf[0]) {
            let ret = buf[0];
            self.consume(1);
            Some(ret)
        } else {
            None
        }
    }

    fn skip_ws(&mut self) {
        while self.next_if(|c| CharClass::of(c) == CharClass::Space).is_some() { }
    }

    fn read_line(&mut self) -> std::io::Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            let buf = match self.fill_buf() {
                Ok(buf) => buf,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err)
            };
            if buf.is_empty() {
                if line.is_empty() {
                    return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
                } else {
                    break;
                }
            }
            match buf.iter().position(|c| *c == b'\n' || *c == b'\r') {
                Some(pos) => {
                    line.extend_from_slice(&buf[..pos]);
                    let cr = buf[pos] == b'\r';
                    self.consume(pos + 1);
                    if cr {
                        self.next_if(|c| c == b'\n');
                    }
                    break;
                },
                None => {
                    line.extend_from_slice(buf);
                    let len = buf.len();
                    self.consume(len);
                }
            }
        }
        Ok(line)
    }

    fn skip_past_eol(&mut self) -> std::io::Result<()> {
        loop {
            let buf = match self.fill_buf() {
                Ok(buf) => buf,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err)
            };
            if buf.is_empty() {
                return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
            }
            match buf.iter().position(|c| *c == b'\n' || *c == b'\r') {
                Some(pos) => {
                    let cr = buf[pos] == b'\r';
                    self.consume(pos + 1);
                    if cr {
                        self.next_if(|c| c == b'\n');
                    }
                    return Ok(());
                },
                None => {
                    let len = buf.len();
                    self.consume(len);
                }
            }
        }
    }
}

impl<T: BufRead> ByteProvider for T { }
