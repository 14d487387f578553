//! Typed value boxes.
//!
//! [`Value`] is the closed set of accessor variants a field dictionary can
//! carry. Each supported Rust type maps to exactly one variant through
//! [`AccessorValue`], and the process-wide [`AccessorRegistry`] answers the
//! same question at runtime by `TypeId` or type name.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::LazyLock;

use glam::{Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::object_data::ObjectData;

/// A typed accessor value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    List(Vec<Value>),
    /// A nested object (converter output or persistable child).
    Object(Box<ObjectData>),
}

/// Discriminant of [`Value`], with a stable short name per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Bool,
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    String,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    List,
    Object,
}

impl AccessorKind {
    pub const ALL: [AccessorKind; 14] = [
        Self::Bool,
        Self::I32,
        Self::I64,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
        Self::String,
        Self::Vec2,
        Self::Vec3,
        Self::Vec4,
        Self::Quat,
        Self::List,
        Self::Object,
    ];

    /// Stable display name, persisted across sessions.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Quat => "quat",
            Self::List => "list",
            Self::Object => "object",
        }
    }

    pub fn from_short_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.short_name() == name)
    }

    /// An empty accessor of this kind.
    pub fn default_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::U32 => Value::U32(0),
            Self::U64 => Value::U64(0),
            Self::F32 => Value::F32(0.0),
            Self::F64 => Value::F64(0.0),
            Self::String => Value::String(String::new()),
            Self::Vec2 => Value::Vec2(Vec2::ZERO),
            Self::Vec3 => Value::Vec3(Vec3::ZERO),
            Self::Vec4 => Value::Vec4(Vec4::ZERO),
            Self::Quat => Value::Quat(Quat::IDENTITY),
            Self::List => Value::List(Vec::new()),
            Self::Object => Value::Object(Box::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// AccessorValue
// ---------------------------------------------------------------------------

/// A Rust type that one accessor variant stores.
pub trait AccessorValue: Sized + 'static {
    const KIND: AccessorKind;

    fn into_value(self) -> Value;

    /// Read the value back. `None` if `value` holds another variant.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_accessor_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl AccessorValue for $ty {
                const KIND: AccessorKind = AccessorKind::$variant;

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(Clone::clone(inner)),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_accessor_value!(
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Quat => Quat,
);

mod sealed {
    pub trait Sealed {}
}

/// A type that may appear as a [`Value::List`] element. Lists are one level
/// deep: the scalar types and [`ObjectData`], but not other lists.
pub trait ListElement: AccessorValue + sealed::Sealed {}

macro_rules! impl_list_element {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl ListElement for $ty {}
        )*
    };
}

impl_list_element!(
    bool, i32, i64, u32, u64, f32, f64, String, Vec2, Vec3, Vec4, Quat, ObjectData
);

impl<T: ListElement> AccessorValue for Vec<T> {
    const KIND: AccessorKind = AccessorKind::List;

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl AccessorValue for ObjectData {
    const KIND: AccessorKind = AccessorKind::Object;

    fn into_value(self) -> Value {
        Value::Object(Box::new(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(data) => Some(ObjectData::clone(data)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Value accessors
// ---------------------------------------------------------------------------

impl Value {
    /// Box a value in the variant its type maps to.
    pub fn new<T: AccessorValue>(value: T) -> Self {
        value.into_value()
    }

    /// An empty accessor for `T`, or `None` when no variant holds `T`.
    pub fn create_for<T: 'static>() -> Option<Self> {
        AccessorRegistry::global().create_for(TypeId::of::<T>())
    }

    pub fn kind(&self) -> AccessorKind {
        match self {
            Self::Bool(_) => AccessorKind::Bool,
            Self::I32(_) => AccessorKind::I32,
            Self::I64(_) => AccessorKind::I64,
            Self::U32(_) => AccessorKind::U32,
            Self::U64(_) => AccessorKind::U64,
            Self::F32(_) => AccessorKind::F32,
            Self::F64(_) => AccessorKind::F64,
            Self::String(_) => AccessorKind::String,
            Self::Vec2(_) => AccessorKind::Vec2,
            Self::Vec3(_) => AccessorKind::Vec3,
            Self::Vec4(_) => AccessorKind::Vec4,
            Self::Quat(_) => AccessorKind::Quat,
            Self::List(_) => AccessorKind::List,
            Self::Object(_) => AccessorKind::Object,
        }
    }

    /// Whether this accessor is the variant that holds `T`.
    pub fn can_hold<T: 'static>(&self) -> bool {
        AccessorRegistry::global().kind_of(TypeId::of::<T>()) == Some(self.kind())
    }

    /// Read the held value as `T`.
    ///
    /// Asking for a type this accessor does not hold is a programming error
    /// and returns [`CodecError::AccessorTypeMismatch`].
    pub fn get<T: AccessorValue>(&self) -> Result<T, CodecError> {
        T::from_value(self).ok_or(CodecError::AccessorTypeMismatch {
            expected: std::any::type_name::<T>(),
            found: self.kind().short_name(),
        })
    }

    /// Replace the held value. The accessor keeps its variant; a value of
    /// another type is rejected.
    pub fn set<T: AccessorValue>(&mut self, value: T) -> Result<(), CodecError> {
        if T::KIND != self.kind() {
            return Err(CodecError::AccessorTypeMismatch {
                expected: std::any::type_name::<T>(),
                found: self.kind().short_name(),
            });
        }
        *self = value.into_value();
        Ok(())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectData> {
        match self {
            Self::Object(data) => Some(data),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AccessorRegistry
// ---------------------------------------------------------------------------

/// Process-wide map from Rust value types to accessor variants.
///
/// Built once on first use and read-only afterwards.
pub struct AccessorRegistry {
    by_type: HashMap<TypeId, AccessorKind>,
    by_name: HashMap<&'static str, AccessorKind>,
}

static REGISTRY: LazyLock<AccessorRegistry> = LazyLock::new(AccessorRegistry::build);

impl AccessorRegistry {
    pub fn global() -> &'static AccessorRegistry {
        &REGISTRY
    }

    fn build() -> Self {
        let mut registry = Self {
            by_type: HashMap::new(),
            by_name: HashMap::new(),
        };

        macro_rules! register {
            ($($ty:ty),* $(,)?) => {
                $(
                    registry.insert::<$ty>();
                    registry.insert::<Vec<$ty>>();
                )*
            };
        }
        register!(
            bool, i32, i64, u32, u64, f32, f64, String, Vec2, Vec3, Vec4, Quat, ObjectData
        );

        log::debug!("Accessor registry: {} value types", registry.by_type.len());
        registry
    }

    fn insert<T: AccessorValue>(&mut self) {
        self.by_type.insert(TypeId::of::<T>(), T::KIND);
        self.by_name.insert(std::any::type_name::<T>(), T::KIND);
    }

    /// The variant that holds values of `type_id`.
    pub fn kind_of(&self, type_id: TypeId) -> Option<AccessorKind> {
        self.by_type.get(&type_id).copied()
    }

    /// The variant that holds values of the type named `type_name`.
    pub fn kind_of_name(&self, type_name: &str) -> Option<AccessorKind> {
        self.by_name.get(type_name).copied()
    }

    /// Short display name of the variant holding `type_name`.
    pub fn short_name(&self, type_name: &str) -> Option<&'static str> {
        self.kind_of_name(type_name).map(AccessorKind::short_name)
    }

    /// An empty accessor for `type_id`. `None` means no variant holds that
    /// type, which tells the walker to try another strategy.
    pub fn create_for(&self, type_id: TypeId) -> Option<Value> {
        self.kind_of(type_id).map(AccessorKind::default_value)
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}
