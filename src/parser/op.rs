use std::io::{BufRead, Cursor};

use crate::base::*;
use crate::base::types::*;
use crate::utils;

use super::bp::ByteProvider;
use super::cc::CharClass;
use super::tk::*;

/// Nesting limit used by [`ObjParser::new()`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Recursive-descent parser of PDF objects.
///
/// Telling `1 0 R` from a sequence of two numbers requires looking two tokens ahead. Tokens read 
/// too far are kept in an internal stack, so the same `ObjParser` needs to be used for reading 
/// everything that follows an object whose end was not delimited (see [`ObjParser::is_clean()`]).
pub struct ObjParser<T: BufRead> {
    reader: T,
    stack: Vec<Token>,
    doc: DocId,
    depth: usize,
    max_depth: usize,
}

impl<T: BufRead> ObjParser<T> {
    pub fn new(reader: T) -> Self {
        Self::with_doc(reader, DocId::DETACHED, DEFAULT_MAX_DEPTH)
    }

    /// Creates an `ObjParser` which attributes indirect references to document `doc` and refuses 
    /// arrays and dictionaries nested deeper than `max_depth`.
    pub fn with_doc(reader: T, doc: DocId, max_depth: usize) -> Self {
        Self { reader, stack: Default::default(), doc, depth: 0, max_depth }
    }

    /// Parses a single object from `reader`.
    ///
    /// Meant for input which ends right after the object or where the object is self-delimiting 
    /// (strings, arrays, dictionaries, names).
    pub fn read_obj_from(reader: T) -> Result<Object, Error> {
        ObjParser::new(reader).read_obj()
    }

    pub fn next_token(&mut self) -> Result<Token, Error> {
        match self.stack.pop() {
            Some(tk) => Ok(tk),
            None => self.reader.read_token_nonempty()
                .map_err(Error::from)
        }
    }

    /// Returns `true` if no tokens are held back, i.e. the underlying reader is positioned exactly 
    /// after the last token handed out.
    pub fn is_clean(&self) -> bool {
        self.stack.is_empty()
    }

    /// Direct access to the underlying reader. Only meaningful if [`Self::is_clean()`].
    pub fn reader(&mut self) -> &mut T {
        &mut self.reader
    }

    pub fn into_inner(self) -> T {
        self.reader
    }

    pub fn read_obj(&mut self) -> Result<Object, Error> {
        let tk = self.next_token()?;
        match &tk[..] {
            b"true" => Ok(Object::Bool(true)),
            b"false" => Ok(Object::Bool(false)),
            b"null" => Ok(Object::Null),
            [b'0'..=b'9', ..] => {
                self.stack.push(tk);
                self.read_number_or_indirect()
            },
            [b'+' | b'-' | b'.', ..] => Self::to_number(&tk),
            b"(" => self.read_lit_string(),
            b"<" => self.read_hex_string(),
            b"/" => self.read_name().map(Object::Name),
            b"[" => self.read_array(),
            b"<<" => self.read_dict(),
            _ => Err(Error::Parse("unexpected token")),
        }
    }

    fn to_number(tk: &[u8]) -> Result<Object, Error> {
        Number::parse(tk)
            .map(Object::Number)
            .ok_or(Error::Parse("malformed number"))
    }

    // EOF while looking ahead just means there is no reference.
    fn lookahead(&mut self) -> Result<Option<Token>, Error> {
        match self.next_token() {
            Ok(tk) => Ok(Some(tk)),
            Err(Error::StreamTruncated) => Ok(None),
            Err(err) => Err(err)
        }
    }

    fn read_number_or_indirect(&mut self) -> Result<Object, Error> {
        let num_tk = self.next_token()?;
        let obj = Self::to_number(&num_tk)?;
        let Some(num) = utils::parse_int_strict::<ObjNum>(&num_tk).filter(|num| *num > 0) else {
            return Ok(obj)
        };
        let Some(gen_tk) = self.lookahead()? else {
            return Ok(obj)
        };
        match utils::parse_int_strict::<ObjGen>(&gen_tk) {
            Some(gen) => {
                match self.lookahead()? {
                    Some(r_tk) if r_tk == b"R" =>
                        return Ok(Object::Ref(ObjRef::in_doc(self.doc, num, gen))),
                    Some(r_tk) => {
                        self.stack.push(r_tk);
                        self.stack.push(gen_tk);
                    },
                    None => self.stack.push(gen_tk)
                }
            },
            None => self.stack.push(gen_tk)
        }
        Ok(obj)
    }

    fn read_lit_string(&mut self) -> Result<Object, Error> {
        let mut ret = Vec::new();
        let mut parens = 0;
        loop {
            match self.reader.next_or_eof()? {
                b'\\' => {
                    let c = match self.reader.next_or_eof()? {
                        b'n' => b'\x0a',
                        b'r' => b'\x0d',
                        b't' => b'\x09',
                        b'b' => b'\x08',
                        b'f' => b'\x0c',
                        c @ (b'0' ..= b'7') => {
                            let d1 = c - b'0';
                            let d2 = self.reader.next_if(|c| (b'0'..=b'7').contains(&c)).map(|c| c - b'0');
                            let d3 = match d2 {
                                Some(_) => self.reader.next_if(|c| (b'0'..=b'7').contains(&c)).map(|c| c - b'0'),
                                None => None
                            };
                            match (d2, d3) {
                                (Some(d2), Some(d3)) => (d1 << 6).wrapping_add(d2 << 3).wrapping_add(d3),
                                (Some(d2), None) => (d1 << 3) + d2,
                                _ => d1
                            }
                        },
                        // line continuation
                        b'\r' => {
                            self.reader.next_if(|c| c == b'\n');
                            continue
                        },
                        b'\n' => continue,
                        c => c
                    };
                    ret.push(c);
                },
                b'\r' => {
                    self.reader.next_if(|c| c == b'\n');
                    ret.push(b'\n');
                },
                c => {
                    if c == b'(' { parens += 1; }
                    if c == b')' {
                        if parens == 0 { break; } else { parens -= 1; }
                    }
                    ret.push(c);
                }
            }
        }
        Ok(Object::TextString(ret))
    }

    fn read_hex_string(&mut self) -> Result<Object, Error> {
        let mut msd = None;
        let mut ret = Vec::new();
        loop {
            let c = self.reader.next_or_eof()?;
            match c {
                b'>' => break,
                b'%' => {
                    while self.reader.next_if(|c| c != b'\n' && c != b'\r').is_some() { }
                    continue
                },
                _ if CharClass::of(c) == CharClass::Space => continue,
                _ => ()
            }
            let dig = utils::hex_value(c).ok_or(Error::Parse("malformed hex string"))?;
            match msd {
                None => msd = Some(dig),
                Some(d) => { ret.push((d << 4) | dig); msd = None; }
            }
        }
        if let Some(d) = msd { ret.push(d << 4); }
        Ok(Object::ByteString(ret))
    }

    fn read_name(&mut self) -> Result<Name, Error> {
        match self.reader.peek() {
            Some(c) if CharClass::of(c) != CharClass::Reg => return Ok(Name(Vec::new())),
            None => return Ok(Name(Vec::new())),
            _ => ()
        };
        let tk = self.next_token()?;
        if !tk.contains(&b'#') {
            return Ok(Name(tk));
        }
        let mut parts = tk.split(|c| *c == b'#');
        let mut ret: Vec<u8> = parts.next().unwrap_or_default().into();
        for part in parts {
            if part.len() < 2 {
                return Err(Error::Parse("malformed name"));
            }
            if &part[0..=1] == b"00" {
                return Err(Error::Parse("illegal name (contains #00)"));
            }
            let d1 = utils::hex_value(part[0]).ok_or(Error::Parse("malformed name"))?;
            let d2 = utils::hex_value(part[1]).ok_or(Error::Parse("malformed name"))?;
            ret.push((d1 << 4) + d2);
            ret.extend_from_slice(&part[2..]);
        }
        Ok(Name(ret))
    }

    fn enter(&mut self) -> Result<(), Error> {
        if self.depth >= self.max_depth {
            return Err(Error::RecursionLimit(self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn read_array(&mut self) -> Result<Object, Error> {
        self.enter()?;
        let mut vec = Vec::new();
        loop {
            let tk = self.next_token()?;
            if tk == b"]" { break; }
            self.stack.push(tk);
            vec.push(self.read_obj()?);
        }
        self.depth -= 1;
        Ok(Object::Array(vec))
    }

    fn read_dict(&mut self) -> Result<Object, Error> {
        self.enter()?;
        let mut dict = Dict::new();
        loop {
            let key = match &self.next_token()?[..] {
                b">>" => break,
                b"/" => self.read_name()?,
                _ => return Err(Error::Parse("malformed dictionary"))
            };
            let value = self.read_obj()?;
            if dict.insert(key.clone(), value).is_some() {
                log::warn!("Duplicate key {key} in dictionary, keeping the last value.");
            }
        }
        self.depth -= 1;
        Ok(Object::Dict(dict))
    }
}

impl<'a> From<&'a [u8]> for ObjParser<Cursor<&'a [u8]>> {
    fn from(input: &'a [u8]) -> Self {
        ObjParser::new(Cursor::new(input))
    }
}

impl<'a> From<&'a str> for ObjParser<Cursor<&'a [u8]>> {
    fn from(input: &'a str) -> Self {
        ObjParser::new(Cursor::new(input.as_bytes()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_obj() {
        let mut parser = ObjParser::from("true false null 123 +17 -98 0 00987 34.5 -3.62 +123.6 4. -.002 0.0 009.87");
        assert_eq!(parser.read_obj().unwrap(), Object::Bool(true));
        assert_eq!(parser.read_obj().unwrap(), Object::Bool(false));
        assert_eq!(parser.read_obj().unwrap(), Object::Null);
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(123));
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(17));
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(-98));
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(0));
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(987));
        assert_eq!(parser.read_obj().unwrap(), Object::Number(Number::Real(34.5)));
        assert_eq!(parser.read_obj().unwrap(), Object::Number(Number::Real(-3.62)));
        assert_eq!(parser.read_obj().unwrap(), Object::Number(Number::Real(123.6)));
        assert_eq!(parser.read_obj().unwrap(), Object::Number(Number::Real(4.)));
        assert_eq!(parser.read_obj().unwrap(), Object::Number(Number::Real(-0.002)));
        assert_eq!(parser.read_obj().unwrap(), Object::Number(Number::Real(0.)));
        assert_eq!(parser.read_obj().unwrap(), Object::Number(Number::Real(9.87)));
        assert!(matches!(parser.read_obj(), Err(Error::StreamTruncated)));

        let mut parser = ObjParser::from("9223372036854775807 9223372036854775808");
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(9223372036854775807));
        assert!(parser.read_obj().is_err());

        let mut parser = ObjParser::from("++1 1..0 .1. 1_ 1a 16#FFFE . 6.023E23 true");
        for _ in 0..8 {
            assert!(parser.read_obj().is_err());
        }
        assert_eq!(parser.read_obj().unwrap(), Object::Bool(true));
    }

    #[test]
    fn test_read_lit_string() {
        let mut parser = ObjParser::from("(string) (new
line) (parens() (*!&}^%etc).) () ((0)) (()");
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"string"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"new\nline"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"parens() (*!&}^%etc)."));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b""));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"(0)"));
        assert!(matches!(parser.read_obj(), Err(Error::StreamTruncated)));

        let mut parser = ObjParser::from("(These \\
two strings \\\r\nare the same.) (These two strings are the same.)");
        assert_eq!(parser.read_obj().unwrap(), parser.read_obj().unwrap());

        let mut parser = ObjParser::from("(1\n) (2\\n) (3\\r) (4\\r\\n) (5\r) (6\r\n)");
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"1\n"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"2\n"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"3\r"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"4\r\n"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"5\n"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"6\n"));

        let mut parser = ObjParser::from("(\\157cta\\154) (\\500) (\\0053\\053\\53) (\\53x) (\\q)");
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"octal"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"@"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"\x053++"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"+x"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_string(b"q"));
    }

    #[test]
    fn test_read_hex_string() {
        let mut parser = ObjParser::from("<4E6F762073686D6F7A206B6120706F702E> <901FA3> <901fa>");
        assert_eq!(parser.read_obj().unwrap(), Object::ByteString(b"Nov shmoz ka pop.".to_vec()));
        assert_eq!(parser.read_obj().unwrap(), Object::ByteString(vec![0x90, 0x1F, 0xA3]));
        assert_eq!(parser.read_obj().unwrap(), Object::ByteString(vec![0x90, 0x1F, 0xA0]));

        let mut parser = ObjParser::from("<61\r\n6 2> <61%comment\n> <6x> <61%unterminated>");
        assert_eq!(parser.read_obj().unwrap(), Object::ByteString(b"ab".to_vec()));
        assert_eq!(parser.read_obj().unwrap(), Object::ByteString(b"a".to_vec()));
        assert!(parser.read_obj().is_err());
        let mut parser = ObjParser::from("<61%unterminated>");
        assert!(matches!(parser.read_obj(), Err(Error::StreamTruncated)));

        let mut parser = ObjParser::from("<</A<41>>>");
        assert_eq!(parser.read_obj().unwrap(), Object::Dict(Dict::from(vec![
            (Name::from("A"), Object::ByteString(b"A".to_vec()))
        ])));
    }

    #[test]
    fn test_read_name() {
        let mut parser = ObjParser::from("/Name1 /A;Name_With-Various***Characters? /1.2 /$$ /@pattern
            /.notdef /Lime#20Green /paired#28#29parentheses /The_Key_of_F#23_Minor /A#42");
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b"Name1"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b"A;Name_With-Various***Characters?"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b"1.2"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b"$$"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b"@pattern"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b".notdef"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b"Lime Green"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b"paired()parentheses"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b"The_Key_of_F#_Minor"));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b"AB"));

        let mut parser = ObjParser::from("//%\n1 /ok /invalid#00byte /#0x /#0 true");
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b""));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b""));
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(1));
        assert_eq!(parser.read_obj().unwrap(), Object::new_name(b"ok"));
        assert!(parser.read_obj().is_err());
        assert!(parser.read_obj().is_err());
        assert!(parser.read_obj().is_err());
        assert_eq!(parser.read_obj().unwrap(), Object::Bool(true));
    }

    #[test]
    fn test_read_array() {
        let mut parser = ObjParser::from("[549 3.14 false (Ralph) /SomeName] [ %\n ] [false%]");
        assert_eq!(parser.read_obj().unwrap(), Object::Array(vec![
                Object::new_int(549),
                #[allow(clippy::approx_constant)]
                Object::Number(Number::Real(3.14)),
                Object::Bool(false),
                Object::new_string(b"Ralph"),
                Object::new_name(b"SomeName")
        ]));
        assert_eq!(parser.read_obj().unwrap(), Object::Array(Vec::new()));
        assert!(parser.read_obj().is_err());
    }

    #[test]
    fn test_read_dict() {
        let mut parser = ObjParser::from("<</Type /Example
    /Subtype /DictionaryExample
    /Version 0.01
    /IntegerItem 12
    /StringItem (a string)
    /Subdictionary <<
        /Item1 0.4
        /Item2 true
        /LastItem (not !)
        /VeryLastItem (OK)
        >>
    >>");
        assert_eq!(parser.read_obj().unwrap(), Object::Dict(Dict::from(vec![
            (Name::from("Type"), Object::new_name(b"Example")),
            (Name::from("Subtype"), Object::new_name(b"DictionaryExample")),
            (Name::from("Version"), Object::Number(Number::Real(0.01))),
            (Name::from("IntegerItem"), Object::new_int(12)),
            (Name::from("StringItem"), Object::new_string(b"a string")),
            (Name::from("Subdictionary"), Object::Dict(Dict::from(vec![
                (Name::from("Item1"), Object::Number(Number::Real(0.4))),
                (Name::from("Item2"), Object::Bool(true)),
                (Name::from("LastItem"), Object::new_string(b"not !")),
                (Name::from("VeryLastItem"), Object::new_string(b"OK"))
            ])))
        ])));

        let mut parser = ObjParser::from("<</A 1 /B>>");
        assert!(parser.read_obj().is_err());
        let mut parser = ObjParser::from("<<1 2>>");
        assert!(parser.read_obj().is_err());
    }

    #[test]
    fn test_read_indirect() {
        let mut parser = ObjParser::from("<</Length 8 0 R>>");
        assert_eq!(parser.read_obj().unwrap(), Object::Dict(Dict::from(vec![
            (Name::from("Length"), Object::Ref(ObjRef::new(8, 0)))
        ])));

        let mut parser = ObjParser::from("1 2 3 R 4 R");
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(1));
        assert_eq!(parser.read_obj().unwrap(), Object::Ref(ObjRef::new(2, 3)));
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(4));
        assert!(parser.read_obj().is_err());

        let mut parser = ObjParser::from("[1 2 3 4 R /X (s)]");
        assert_eq!(parser.read_obj().unwrap(), Object::Array(vec![
            Object::new_int(1), Object::new_int(2), Object::Ref(ObjRef::new(3, 4)),
            Object::new_name(b"X"), Object::new_string(b"s")
        ]));

        let mut parser = ObjParser::from("0 0 R");
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(0));
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(0));
        assert!(parser.read_obj().is_err());

        let mut parser = ObjParser::from("01 0 R");
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(1));
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(0));
        assert!(parser.read_obj().is_err());

        let mut parser = ObjParser::from("1 +1 R");
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(1));
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(1));
        assert!(parser.read_obj().is_err());

        let mut parser = ObjParser::from("5 0");
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(5));
        assert_eq!(parser.read_obj().unwrap(), Object::new_int(0));
        assert!(parser.is_clean());

        let doc = DocId::new();
        let mut parser = ObjParser::with_doc("7 0 R".as_bytes(), doc, 8);
        assert_eq!(parser.read_obj().unwrap(), Object::Ref(ObjRef::in_doc(doc, 7, 0)));
    }

    #[test]
    fn test_depth_limit() {
        let mut parser = ObjParser::with_doc("[[[1]]]".as_bytes(), DocId::DETACHED, 3);
        assert!(parser.read_obj().is_ok());
        let mut parser = ObjParser::with_doc("[[[[1]]]]".as_bytes(), DocId::DETACHED, 3);
        assert!(matches!(parser.read_obj(), Err(Error::RecursionLimit(3))));
        let input = "[".repeat(100_000);
        let mut parser = ObjParser::from(&input[..]);
        assert!(matches!(parser.read_obj(), Err(Error::RecursionLimit(DEFAULT_MAX_DEPTH))));
    }
}
