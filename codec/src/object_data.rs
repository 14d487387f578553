//! Serialized object form: [`ObjectData`], [`ReferenceData`] and the
//! ordered field dictionary.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::value::{AccessorValue, Value};

/// Identity of a serialized object inside the Live-Reference database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub identifier: String,
    pub type_tag: String,
}

/// One object's serialized form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    /// Fully-qualified persisted type name.
    pub target_type: String,
    #[serde(default)]
    pub reference: Option<ReferenceData>,
    pub fields: AccessorDictionary,
}

impl ObjectData {
    pub fn new(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            reference: None,
            fields: AccessorDictionary::new(),
        }
    }
}

/// Insertion-ordered map from field name to accessor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessorDictionary(IndexMap<String, Value>);

impl AccessorDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Store `value` under `name`, boxed in the accessor variant for `T`.
    pub fn set<T: AccessorValue>(&mut self, name: impl Into<String>, value: T) {
        self.0.insert(name.into(), value.into_value());
    }

    /// Store an already boxed accessor.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Read `name` as `T`. `Ok(None)` if the field is absent, an error if it
    /// holds another type.
    pub fn get<T: AccessorValue>(&self, name: &str) -> Result<Option<T>, CodecError> {
        self.0.get(name).map(Value::get).transpose()
    }

    /// Read a field that must be present.
    pub fn require<T: AccessorValue>(&self, name: &str) -> Result<T, CodecError> {
        self.get(name)?
            .ok_or_else(|| CodecError::MissingField(name.to_owned()))
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn value_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name)
    }

    /// Remove a field, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Follow a chain of nested object fields.
    ///
    /// Each segment must name a [`Value::Object`] in the current dictionary.
    /// An empty path returns `self`.
    pub fn resolve_path_mut(&mut self, path: &[String]) -> Option<&mut AccessorDictionary> {
        let mut current = self;
        for segment in path {
            match current.0.get_mut(segment.as_str()) {
                Some(Value::Object(data)) => current = &mut data.fields,
                _ => return None,
            }
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn preserves_insertion_order() {
        let mut dict = AccessorDictionary::new();
        dict.set("zeta", 1_i32);
        dict.set("alpha", true);
        dict.set("mid", Vec3::ONE);
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

        dict.remove("zeta");
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["alpha", "mid"]);
    }

    #[test]
    fn typed_reads() {
        let mut dict = AccessorDictionary::new();
        dict.set("name", String::from("crate"));

        assert_eq!(dict.get::<String>("name").unwrap().as_deref(), Some("crate"));
        assert_eq!(dict.get::<String>("missing").unwrap(), None);
        assert!(dict.get::<i32>("name").is_err());
        assert!(matches!(
            dict.require::<i32>("missing"),
            Err(CodecError::MissingField(_))
        ));
    }

    #[test]
    fn resolve_nested_path() {
        let mut inner = ObjectData::new("game::Weapon");
        inner.fields.set("damage", 10_i32);
        let mut outer = ObjectData::new("game::Player");
        outer.fields.set("weapon", inner);
        outer.fields.set("level", 3_u32);

        let path = vec!["weapon".to_owned()];
        let weapon = outer.fields.resolve_path_mut(&path).unwrap();
        weapon.set("owner", String::from("id-1"));

        let weapon = outer.fields.value("weapon").and_then(Value::as_object).unwrap();
        assert_eq!(weapon.fields.get::<String>("owner").unwrap().as_deref(), Some("id-1"));

        assert!(outer.fields.resolve_path_mut(&[]).is_some());
        assert!(outer.fields.resolve_path_mut(&["level".to_owned()]).is_none());
        assert!(outer.fields.resolve_path_mut(&["nope".to_owned()]).is_none());
    }
}
