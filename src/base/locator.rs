use super::*;
use super::types::*;

/// Finds the cross-reference record for an object number.
pub trait Locator {
    fn locate(&self, num: ObjNum) -> Option<Record>;
}

impl Locator for () {
    fn locate(&self, _num: ObjNum) -> Option<Record> {
        None
    }
}

impl Locator for XRef {
    fn locate(&self, num: ObjNum) -> Option<Record> {
        self.map.get(&num).copied()
    }
}
