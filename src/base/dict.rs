use std::fmt::{Display, Formatter};

use super::name::Name;
use super::object::Object;

/// Dictionary objects (like `<< /Length 42 >>`).
///
/// Keys keep their insertion order and are unique: [`Dict::insert()`] replaces an existing value 
/// in place.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Dict(Vec<(Name, Object)>);

impl Dict {
    pub fn new() -> Dict {
        Dict::default()
    }

    /// Looks up for a value for a given [`Name`] key. If not present, returns a static reference 
    /// to [`Object::Null`].
    pub fn lookup(&self, key: &[u8]) -> &Object {
        self.get(key).unwrap_or(&Object::Null)
    }

    pub fn get(&self, key: &[u8]) -> Option<&Object> {
        self.0.iter()
            .find(|(name, _obj)| name == &key)
            .map(|(_name, obj)| obj)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Object> {
        self.0.iter_mut()
            .find(|(name, _obj)| name == &key)
            .map(|(_name, obj)| obj)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Sets the value for `key`, returning the previous one if there was any.
    pub fn insert(&mut self, key: impl Into<Name>, value: Object) -> Option<Object> {
        let key = key.into();
        match self.0.iter_mut().find(|(name, _obj)| name == &key) {
            Some((_name, obj)) => Some(std::mem::replace(obj, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        let pos = self.0.iter().position(|(name, _obj)| name == &key)?;
        Some(self.0.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Name, Object)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, (Name, Object)> {
        self.0.iter_mut()
    }

    pub fn into_inner(self) -> Vec<(Name, Object)> {
        self.0
    }
}

impl From<Vec<(Name, Object)>> for Dict {
    /// Builds a dictionary from pairs. Should a key repeat, its last value wins.
    fn from(vec: Vec<(Name, Object)>) -> Dict {
        let mut dict = Dict(Vec::with_capacity(vec.len()));
        for (key, value) in vec {
            dict.insert(key, value);
        }
        dict
    }
}

impl IntoIterator for Dict {
    type Item = (Name, Object);
    type IntoIter = <Vec<(Name, Object)> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dict {
    type Item = &'a (Name, Object);
    type IntoIter = std::slice::Iter<'a, (Name, Object)>;

    fn into_iter(self: &'a Dict) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for Dict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("<< ")?;
        for (key, val) in &self.0 {
            write!(f, "{key} {val} ")?;
        }
        f.write_str(">>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::*;

    #[test]
    fn test_dict() {
        let mut dict = Dict::from(vec![
            (Name::from("NKey"), Object::new_name(b"Nvalue")),
            (Name::from("IKey"), Object::Number(Number::Int(10))),
        ]);
        assert_eq!(dict.lookup(b"NKey"), &Object::new_name(b"Nvalue"));
        assert_eq!(dict.lookup(b"IKey"), &Object::Number(Number::Int(10)));
        assert_eq!(dict.lookup(b"Missing"), &Object::Null);
        assert!(dict.get(b"Missing").is_none());

        assert_eq!(dict.insert("IKey", Object::Bool(true)), Some(Object::Number(Number::Int(10))));
        assert_eq!(dict.insert("New", Object::Null), None);
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>(),
            vec![Name::from("NKey"), Name::from("IKey"), Name::from("New")]);
        assert_eq!(dict.remove(b"NKey"), Some(Object::new_name(b"Nvalue")));
        assert!(!dict.contains_key(b"NKey"));
    }

    #[test]
    fn test_duplicate_keys() {
        let dict = Dict::from(vec![
            (Name::from("A"), Object::Number(Number::Int(1))),
            (Name::from("B"), Object::Number(Number::Int(2))),
            (Name::from("A"), Object::Number(Number::Int(3))),
        ]);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.lookup(b"A"), &Object::Number(Number::Int(3)));
    }
}
