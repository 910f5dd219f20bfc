use std::io::{BufRead, Seek};
use std::collections::HashSet;

use crate::base::*;

use super::Reader;

impl<T: BufRead + Seek> Reader<T> {
    /// Collects references to all page objects in document order.
    ///
    /// The tree is walked iteratively. Nodes deeper than [`ReadOptions::max_depth`] cause 
    /// [`Error::RecursionLimit`]; a node visited twice is skipped with a warning (an error in 
    /// strict mode).
    ///
    /// [`ReadOptions::max_depth`]: crate::config::ReadOptions::max_depth
    pub fn pages(&self) -> Result<Vec<ObjRef>, Error> {
        let root = self.root()?;
        let top = match root.dict().map(|dict| dict.lookup(b"Pages")) {
            Some(Object::Ref(objref)) => *objref,
            _ if self.options.strict => return Err(Error::Parse("catalog without /Pages")),
            _ => {
                log::warn!("Document catalog without /Pages.");
                return Ok(Vec::new());
            }
        };
        let max_depth = self.options.max_depth;
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(top, 0)];
        while let Some((objref, depth)) = stack.pop() {
            if depth > max_depth {
                return Err(Error::RecursionLimit(max_depth));
            }
            if !visited.insert((objref.num, objref.gen)) {
                if self.options.strict {
                    return Err(Error::Parse("cycle in page tree"));
                }
                log::warn!("Page tree node {objref} visited twice, skipping.");
                continue;
            }
            let obj = self.get_object(&objref)?;
            let Some(dict) = obj.as_dict() else {
                log::warn!("Page tree node {objref} is not a dictionary, skipping.");
                continue;
            };
            let is_node = match dict.lookup(b"Type").as_name() {
                Some(name) if name == b"Pages" => true,
                Some(name) if name == b"Page" => false,
                _ => dict.contains_key(b"Kids")
            };
            if !is_node {
                pages.push(objref);
                continue;
            }
            let kids = match self.resolve(dict.lookup(b"Kids"))? {
                Object::Array(kids) => kids,
                _ => {
                    log::warn!("Page tree node {objref} without /Kids.");
                    continue;
                }
            };
            for kid in kids.into_iter().rev() {
                match kid {
                    Object::Ref(kid) => stack.push((kid, depth + 1)),
                    _ => log::warn!("Direct object in /Kids of {objref}, skipping.")
                }
            }
        }
        Ok(pages)
    }

    pub fn page_count(&self) -> Result<usize, Error> {
        Ok(self.pages()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadOptions;

    // Builds a file with the given objects (numbered from 1) and a correct xref table.
    fn build(objects: &[&str]) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (ix, obj) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{obj}\nendobj\n", ix + 1).as_bytes());
        }
        let startxref = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(format!("trailer\n<</Size {}/Root 1 0 R>>\nstartxref\n{startxref}\n%%EOF\n",
            objects.len() + 1).as_bytes());
        out
    }

    #[test]
    fn test_pages() {
        let data = build(&[
            "<</Type/Catalog/Pages 2 0 R>>",
            "<</Type/Pages/Kids[3 0 R 4 0 R 5 0 R]/Count 3>>",
            "<</Type/Page/Parent 2 0 R>>",
            "<</Kids[6 0 R]/Parent 2 0 R>>",
            "<</Type/Page/Parent 2 0 R>>",
            "<</Parent 4 0 R>>",
        ]);
        let rdr = Reader::from_bytes(data, ReadOptions::strict()).unwrap();
        let nums = rdr.pages().unwrap().iter().map(|r| r.num).collect::<Vec<_>>();
        assert_eq!(nums, vec![3, 6, 5]);
        assert_eq!(rdr.page_count().unwrap(), 3);
    }

    #[test]
    fn test_pages_cycle() {
        let data = build(&[
            "<</Type/Catalog/Pages 2 0 R>>",
            "<</Type/Pages/Kids[3 0 R 2 0 R]/Count 1>>",
            "<</Type/Page>>",
        ]);
        let rdr = Reader::from_bytes(data.clone(), ReadOptions::default()).unwrap();
        assert_eq!(rdr.page_count().unwrap(), 1);
        let rdr = Reader::from_bytes(data, ReadOptions::strict()).unwrap();
        assert!(matches!(rdr.pages(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_pages_depth() {
        // A chain of nested nodes deeper than allowed.
        let mut objects = vec!["<</Type/Catalog/Pages 2 0 R>>".to_string()];
        for num in 2..12 {
            objects.push(format!("<</Type/Pages/Kids[{} 0 R]>>", num + 1));
        }
        objects.push("<</Type/Page>>".to_string());
        let objects = objects.iter().map(String::as_str).collect::<Vec<_>>();
        let data = build(&objects);
        let rdr = Reader::from_bytes(data.clone(), ReadOptions::default()).unwrap();
        assert_eq!(rdr.page_count().unwrap(), 1);
        let rdr = Reader::from_bytes(data, ReadOptions::default().with_max_depth(5)).unwrap();
        assert!(matches!(rdr.pages(), Err(Error::RecursionLimit(5))));
    }
}
