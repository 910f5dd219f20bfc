use std::collections::{HashMap, HashSet};

use crate::base::*;
use crate::base::types::*;

use super::Writer;
use super::serialize::content_hash;

impl Writer {
    /// Merges objects with identical contents and removes objects nothing refers to.
    ///
    /// Objects are compared by the hash of their serialization. All references to a duplicate are
    /// redirected to the first object with the same contents and the duplicate is removed. Then
    /// every object which is not referenced from another object or from the trailer is removed.
    /// The document catalog, the information dictionary and the encryption dictionary are never
    /// removed.
    ///
    /// Both steps are single passes: objects which only become identical or unreferenced through
    /// the changes made here are left for the next call. Returns the number of objects removed.
    pub fn compress_identical_objects(&mut self) -> usize {
        let pinned = self.pinned();

        let mut canonical = HashMap::new();
        let mut replace = HashMap::new();
        for (ix, obj) in self.objects.iter().enumerate() {
            let num = ix as ObjNum + 1;
            let Some(hash) = obj.as_ref().and_then(|obj| content_hash(obj, self.doc)) else {
                continue;
            };
            match canonical.get(&hash) {
                Some(&first) if !pinned.contains(&num) => { replace.insert(num, first); },
                Some(_) => (),
                None => { canonical.insert(hash, num); }
            }
        }

        if !replace.is_empty() {
            let doc = self.doc;
            let gens = &self.gens;
            for obj in self.objects.iter_mut().flatten() {
                rewrite_refs(obj, &mut |objref| {
                    if !objref.belongs_to(doc) {
                        return;
                    }
                    if let Some(&target) = replace.get(&objref.num) {
                        *objref = ObjRef::in_doc(doc, target, gens[(target - 1) as usize]);
                    }
                });
            }
            for &num in replace.keys() {
                self.objects[(num - 1) as usize] = None;
            }
        }
        log::debug!("{} duplicate objects merged", replace.len());

        let mut referenced = HashSet::new();
        for (ix, obj) in self.objects.iter().enumerate() {
            let num = ix as ObjNum + 1;
            let Some(obj) = obj else { continue };
            visit_refs(obj, &mut |objref| {
                if objref.belongs_to(self.doc) && objref.num != num {
                    referenced.insert(objref.num);
                }
            });
        }
        let mut orphans = 0;
        for (ix, obj) in self.objects.iter_mut().enumerate() {
            let num = ix as ObjNum + 1;
            if obj.is_some() && !referenced.contains(&num) && !pinned.contains(&num) {
                *obj = None;
                orphans += 1;
            }
        }
        log::debug!("{orphans} unreferenced objects removed");
        replace.len() + orphans
    }

    /// Object numbers referenced from the trailer.
    fn pinned(&self) -> HashSet<ObjNum> {
        let mut pinned = HashSet::new();
        let trailer_refs = [self.root, self.info, self.encrypt.as_ref().and_then(Object::as_objref).copied()];
        for objref in trailer_refs.into_iter().flatten() {
            if objref.belongs_to(self.doc) {
                pinned.insert(objref.num);
            }
        }
        if let Some(encrypt) = &self.encrypt {
            visit_refs(encrypt, &mut |objref| { pinned.insert(objref.num); });
        }
        pinned
    }
}

fn visit_refs<F: FnMut(&ObjRef)>(obj: &Object, func: &mut F) {
    match obj {
        Object::Ref(objref) => func(objref),
        Object::Array(arr) => arr.iter().for_each(|item| visit_refs(item, func)),
        Object::Dict(dict) => dict.iter().for_each(|(_, value)| visit_refs(value, func)),
        Object::Stream(stm) => stm.dict.iter().for_each(|(_, value)| visit_refs(value, func)),
        _ => ()
    }
}

fn rewrite_refs<F: FnMut(&mut ObjRef)>(obj: &mut Object, func: &mut F) {
    match obj {
        Object::Ref(objref) => func(objref),
        Object::Array(arr) => arr.iter_mut().for_each(|item| rewrite_refs(item, func)),
        Object::Dict(dict) => dict.iter_mut().for_each(|(_, value)| rewrite_refs(value, func)),
        Object::Stream(stm) => stm.dict.iter_mut().for_each(|(_, value)| rewrite_refs(value, func)),
        _ => ()
    }
}
