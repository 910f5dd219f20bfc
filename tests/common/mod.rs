#![allow(dead_code)]

use std::collections::BTreeMap;

pub fn init_logging() {
    let _ = stderrlog::new()
        .verbosity(log::Level::Warn)
        .init();
}

/// Assembles a PDF file, keeping track of object offsets.
pub struct PdfBuilder {
    buf: Vec<u8>,
    offsets: BTreeMap<u32, usize>,
}

impl PdfBuilder {
    pub fn new(version: &str) -> PdfBuilder {
        PdfBuilder { buf: format!("%PDF-{version}\n").into_bytes(), offsets: BTreeMap::new() }
    }

    pub fn offset(&self) -> usize {
        self.buf.len()
    }

    pub fn offset_of(&self, num: u32) -> usize {
        self.offsets[&num]
    }

    pub fn raw(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn object(&mut self, num: u32, body: &str) -> &mut Self {
        self.object_bytes(num, body.as_bytes())
    }

    pub fn object_bytes(&mut self, num: u32, body: &[u8]) -> &mut Self {
        self.offsets.insert(num, self.buf.len());
        self.buf.extend_from_slice(format!("{num} 0 obj\n").as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
        self
    }

    pub fn stream(&mut self, num: u32, dict: &str, data: &[u8]) -> &mut Self {
        let mut body = format!("<<{dict} /Length {}>>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object_bytes(num, &body)
    }

    /// Writes a classical cross-reference section listing `nums` and returns its offset.
    pub fn xref_table(&mut self, nums: &[u32], trailer: &str) -> usize {
        let start = self.buf.len();
        let mut out = String::from("xref\n0 1\n0000000000 65535 f \n");
        for num in nums {
            out += &format!("{num} 1\n{:010} 00000 n \n", self.offsets[num]);
        }
        out += &format!("trailer\n{trailer}\n");
        self.buf.extend_from_slice(out.as_bytes());
        start
    }

    /// Writes an uncompressed cross-reference stream as object `num` and returns its offset.
    /// Entries are `(number, type, field 2, field 3)`; the stream itself is added automatically.
    pub fn xref_stream(&mut self, num: u32, entries: &[(u32, u8, u16, u8)], extra: &str) -> usize {
        let start = self.buf.len();
        let mut entries = entries.to_vec();
        entries.push((num, 1, start as u16, 0));
        let mut index = String::new();
        let mut data = Vec::new();
        for &(n, tpe, f2, f3) in &entries {
            index += &format!("{n} 1 ");
            data.push(tpe);
            data.extend_from_slice(&f2.to_be_bytes());
            data.push(f3);
        }
        let dict = format!("/Type /XRef /Size {} /Index [{index}] /W [1 2 1] {extra}", num + 1);
        self.stream(num, &dict, &data);
        start
    }

    pub fn finish(&self, startxref: usize) -> Vec<u8> {
        let mut out = self.buf.clone();
        out.extend_from_slice(format!("startxref\n{startxref}\n%%EOF\n").as_bytes());
        out
    }
}

/// The smallest complete document: a catalog and an empty page tree.
pub fn minimal() -> Vec<u8> {
    let mut pdf = PdfBuilder::new("1.4");
    pdf.object(1, "<</Type/Catalog/Pages 2 0 R>>")
        .object(2, "<</Type/Pages/Kids[]/Count 0>>");
    let xref = pdf.xref_table(&[1, 2], "<</Size 3/Root 1 0 R>>");
    pdf.finish(xref)
}
