//! Field reflection: the [`Persistable`] trait the walker is written against.
//!
//! Types normally get it from `#[derive(Persistable)]`, which lists the
//! persisted fields in declaration order (base fields first) and hands out
//! references to them by name.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

use crate::field::Field;
use crate::handle::ObjectHandle;

/// Upcasting helpers for trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Runtime identity of a declared field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Name of the generic type definition: the type name up to its first
    /// `<` (`alloc::vec::Vec` for `alloc::vec::Vec<u8>`).
    ///
    /// Derived from [`std::any::type_name`], whose output may change between
    /// compiler versions. Only compare it within one build.
    pub fn definition(&self) -> &'static str {
        match self.name.find('<') {
            Some(pos) => &self.name[..pos],
            None => self.name,
        }
    }

    pub fn is_generic(&self) -> bool {
        self.name.contains('<')
    }
}

/// A persisted field: its name and declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub type_info: TypeInfo,
}

impl FieldInfo {
    pub fn of<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            type_info: TypeInfo::of::<T>(),
        }
    }

    /// Panics if two persisted fields of `type_name` share a name, as when a
    /// type redeclares a field of its `#[persist(base)]` object. Called by
    /// the derive when the field list is first built.
    pub fn assert_unique(type_name: &str, infos: &[FieldInfo]) {
        let mut seen = HashSet::new();
        for info in infos {
            if !seen.insert(info.name) {
                panic!(
                    "'{type_name}' persists field '{}' twice; rename or skip one of them",
                    info.name
                );
            }
        }
    }
}

/// Borrowed field value.
pub enum FieldRef<'a> {
    /// A field the codec can store itself.
    Codec(&'a dyn Field),
    /// A field only a registered converter can handle.
    Opaque(&'a dyn Any),
}

impl<'a> FieldRef<'a> {
    pub fn as_any(&self) -> &'a dyn Any {
        match *self {
            Self::Codec(field) => (*field).as_any(),
            Self::Opaque(value) => value,
        }
    }
}

/// Mutably borrowed field value.
pub enum FieldMut<'a> {
    Codec(&'a mut dyn Field),
    Opaque(&'a mut dyn Any),
}

impl FieldMut<'_> {
    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        match self {
            Self::Codec(field) => (**field).as_any_mut(),
            Self::Opaque(value) => &mut **value,
        }
    }
}

/// A type the walker can serialize field by field.
pub trait Persistable: AsAny {
    /// Persisted type name, written as `ObjectData::target_type`.
    fn type_name(&self) -> &'static str;

    /// Persisted fields in walk order.
    fn field_infos(&self) -> &'static [FieldInfo];

    fn field(&self, name: &str) -> Option<FieldRef<'_>>;

    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>>;

    /// Handle under which this object is known to the host, if it is a
    /// live instance that others may reference.
    fn live_handle(&self) -> Option<ObjectHandle> {
        None
    }

    fn persisted_name() -> &'static str
    where
        Self: Sized;

    fn persisted_fields() -> &'static [FieldInfo]
    where
        Self: Sized;
}

// ---------------------------------------------------------------------------
// TypeRegistry
// ---------------------------------------------------------------------------

type Constructor = fn() -> Box<dyn Persistable>;

fn construct<T: Persistable + Default>() -> Box<dyn Persistable> {
    Box::new(T::default())
}

/// Constructors for persisted type names, used when a nested object has no
/// existing instance to deserialize into.
#[derive(Default)]
pub struct TypeRegistry {
    constructors: HashMap<&'static str, Constructor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Persistable + Default>(&mut self) {
        self.register_with(T::persisted_name(), construct::<T>);
    }

    pub fn register_with(&mut self, name: &'static str, constructor: Constructor) {
        if self.constructors.insert(name, constructor).is_some() {
            log::warn!("Persisted type '{name}' registered twice, keeping the last");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn construct(&self, name: &str) -> Option<Box<dyn Persistable>> {
        self.constructors.get(name).map(|constructor| constructor())
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
