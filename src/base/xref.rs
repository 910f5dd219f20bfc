use std::collections::BTreeMap;

use super::*;
use super::types::*;

/// A cross-reference table, or a table section, or a cross-reference stream.
#[derive(Debug, Clone)]
pub struct XRef {
    /// The format in which this table section appears or should appear in a file.
    pub tpe: XRefType,
    /// The mapping itself.
    ///
    /// NB that for accessing records one should generally use the [`Locator`] interface.
    pub map: BTreeMap<ObjNum, Record>,
    /// The trailer dictionary (for [`XRefType::Table`]) or the cross-reference stream dictionary 
    /// (for [`XRefType::Stream`]).
    pub dict: Dict,
    /// The `/Size` entry in the dictionary, for convenience.
    pub size: ObjNum
}

/// The format of a cross-reference table section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XRefType {
    /// Classical table (`xref ... trailer << ... >>`)
    Table,
    /// A cross-reference stream (`<< /Type/XRef ... >> stream ... endstream`)
    Stream(ObjRef),
    /// Reconstructed by scanning the file.
    Rebuilt
}

impl XRef {
    /// Merge two cross-reference table sections into one by filling in missing entries by those 
    /// from `prev`. (An entry present in `self` always has preference.) All other fields of `prev`,
    /// most notably its trailer dictionary, are ignored, except that `size` becomes the larger 
    /// of the two.
    pub fn merge_prev(&mut self, mut prev: XRef) {
        prev.map.append(&mut self.map);
        self.map = prev.map;
        self.size = std::cmp::max(self.size, prev.size);
    }
}


/// A single record in a cross-reference table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record {
    /// An uncompressed object (`n` entry).
    Used {
        /// The generation number.
        gen: ObjGen,
        /// Location of the object in PDF file (w.r.t. `%PDF`).
        offset: Offset,
    },
    /// An object number marked as free (`f` entry).
    Free {
        /// The generation number to be used if this object number is reused for a new object.
        gen: ObjGen,
        /// The next number in the free object list, or zero if `gen` is 65535 (`u16::MAX`).
        next: ObjNum,
    },
    /// An object which is stored compressed within an object stream. The generation number of both 
    /// the compressed object and the containing stream is zero.
    Compr {
        /// The object number of the object stream (generation number is always zero).
        num_within: ObjNum,
        /// 0-based order of this compressed object within the object stream.
        index: ObjIndex,
    },
}

impl Default for Record {
    /// Returns `Record::Free { gen: 65535, next: 0 }.`
    fn default() -> Self {
        Record::Free { gen: 65535, next: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prev() {
        let newer = BTreeMap::from([
            (1, Record::Used { gen: 0, offset: 500 }),
            (3, Record::Compr { num_within: 4, index: 0 }),
        ]);
        let older = BTreeMap::from([
            (1, Record::Used { gen: 0, offset: 10 }),
            (2, Record::Used { gen: 0, offset: 100 }),
        ]);
        let mut xref = XRef { tpe: XRefType::Table, map: newer, dict: Dict::default(), size: 5 };
        xref.merge_prev(XRef { tpe: XRefType::Table, map: older, dict: Dict::default(), size: 3 });
        assert_eq!(xref.map.get(&1), Some(&Record::Used { gen: 0, offset: 500 }));
        assert_eq!(xref.map.get(&2), Some(&Record::Used { gen: 0, offset: 100 }));
        assert_eq!(xref.map.len(), 3);
        assert_eq!(xref.size, 5);
    }
}
