use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::rc::Rc;

use crate::base::*;
use crate::base::types::*;

/// Loaded indirect objects, keyed by generation and object number.
///
/// An object is normally inserted only once. Inserting a different value under a key already 
/// present is a [`Error::CacheConflict`] in strict mode, otherwise the new value replaces the old 
/// one with a warning.
#[derive(Default)]
pub(crate) struct ObjectCache {
    map: HashMap<(ObjGen, ObjNum), Rc<Object>>,
}

impl ObjectCache {
    pub fn get(&self, objref: &ObjRef) -> Option<Rc<Object>> {
        self.map.get(&(objref.gen, objref.num)).cloned()
    }

    pub fn insert(&mut self, objref: &ObjRef, obj: Object, strict: bool) -> Result<Rc<Object>, Error> {
        match self.map.entry((objref.gen, objref.num)) {
            Entry::Vacant(entry) => Ok(Rc::clone(entry.insert(Rc::new(obj)))),
            Entry::Occupied(entry) if **entry.get() == obj => Ok(Rc::clone(entry.get())),
            Entry::Occupied(_) if strict => Err(Error::CacheConflict(*objref)),
            Entry::Occupied(mut entry) => {
                log::warn!("Replacing cached object {objref}.");
                entry.insert(Rc::new(obj));
                Ok(Rc::clone(entry.get()))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache() {
        let mut cache = ObjectCache::default();
        let oref = ObjRef::new(1, 0);
        assert!(cache.get(&oref).is_none());
        let rc = cache.insert(&oref, Object::new_int(1), true).unwrap();
        assert!(Rc::ptr_eq(&rc, &cache.get(&oref).unwrap()));
        // Same value again is not a conflict
        let rc2 = cache.insert(&oref, Object::new_int(1), true).unwrap();
        assert!(Rc::ptr_eq(&rc, &rc2));
        assert!(matches!(cache.insert(&oref, Object::new_int(2), true), Err(Error::CacheConflict(_))));
        assert_eq!(*cache.insert(&oref, Object::new_int(2), false).unwrap(), Object::new_int(2));
        assert!(cache.get(&ObjRef::new(1, 1)).is_none());
        assert_eq!(cache.len(), 1);
    }
}
