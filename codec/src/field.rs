//! Per-field storage: how each field type writes itself into an
//! [`AccessorDictionary`] and reads itself back.
//!
//! Plain values are copied into accessors. [`Asset`] and [`Template`]
//! handles are replaced by catalog identifiers. [`LiveRef`] handles resolve
//! through the Live-Reference database, deferred until the whole graph is
//! walked when the target is not yet known. Nested persistable objects
//! recurse through the walker.

use std::cell::Cell;
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3, Vec4};

use crate::context::SerializationContext;
use crate::database::DatabaseKind;
use crate::handle::{Asset, EngineType, LiveRef, ObjectHandle, Template};
use crate::issue::{Issue, IssueKind, join_path};
use crate::object_data::{AccessorDictionary, ObjectData};
use crate::persistable::{AsAny, Persistable};
use crate::value::{AccessorValue, ListElement, Value};

/// A field type the codec can store without a converter.
pub trait Field: AsAny {
    /// Write this field into `output` under `name`, or leave it out.
    fn serialize_field(
        &self,
        name: &str,
        output: &mut AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    );

    /// Read this field from `input`. Problems are reported on `ctx` and
    /// leave the field unchanged.
    fn deserialize_field(
        &mut self,
        name: &str,
        input: &AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    );
}

fn report_kind_mismatch(
    ctx: &mut SerializationContext<'_>,
    name: &str,
    expected: &str,
    found: &Value,
) {
    ctx.report(
        IssueKind::TypeMismatch,
        name,
        format!("expected {expected}, found {}", found.kind().short_name()),
    );
}

fn read_value<T: AccessorValue>(
    slot: &mut T,
    name: &str,
    input: &AccessorDictionary,
    ctx: &mut SerializationContext<'_>,
) {
    let Some(value) = input.value(name) else {
        return;
    };
    match T::from_value(value) {
        Some(read) => *slot = read,
        None => report_kind_mismatch(ctx, name, T::KIND.short_name(), value),
    }
}

fn read_optional_value<T: AccessorValue>(
    slot: &mut Option<T>,
    name: &str,
    input: &AccessorDictionary,
    ctx: &mut SerializationContext<'_>,
) {
    let Some(value) = input.value(name) else {
        // absence encodes "no value"
        *slot = None;
        return;
    };
    match T::from_value(value) {
        Some(read) => *slot = Some(read),
        None => report_kind_mismatch(ctx, name, T::KIND.short_name(), value),
    }
}

// ---------------------------------------------------------------------------
// Plain values
// ---------------------------------------------------------------------------

macro_rules! impl_value_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Field for $ty {
                fn serialize_field(
                    &self,
                    name: &str,
                    output: &mut AccessorDictionary,
                    _ctx: &mut SerializationContext<'_>,
                ) {
                    output.set(name, Clone::clone(self));
                }

                fn deserialize_field(
                    &mut self,
                    name: &str,
                    input: &AccessorDictionary,
                    ctx: &mut SerializationContext<'_>,
                ) {
                    read_value(self, name, input, ctx);
                }
            }

            impl Field for Option<$ty> {
                fn serialize_field(
                    &self,
                    name: &str,
                    output: &mut AccessorDictionary,
                    _ctx: &mut SerializationContext<'_>,
                ) {
                    if let Some(value) = self {
                        output.set(name, Clone::clone(value));
                    }
                }

                fn deserialize_field(
                    &mut self,
                    name: &str,
                    input: &AccessorDictionary,
                    ctx: &mut SerializationContext<'_>,
                ) {
                    read_optional_value(self, name, input, ctx);
                }
            }
        )*
    };
}

impl_value_field!(
    bool, i32, i64, u32, u64, f32, f64, String, Vec2, Vec3, Vec4, Quat
);

impl<T: ListElement + Clone> Field for Vec<T> {
    fn serialize_field(
        &self,
        name: &str,
        output: &mut AccessorDictionary,
        _ctx: &mut SerializationContext<'_>,
    ) {
        output.set(name, self.clone());
    }

    fn deserialize_field(
        &mut self,
        name: &str,
        input: &AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) {
        read_value(self, name, input, ctx);
    }
}

// ---------------------------------------------------------------------------
// Catalog handles
// ---------------------------------------------------------------------------

fn catalog_identifier(
    ctx: &mut SerializationContext<'_>,
    kind: DatabaseKind,
    handle: ObjectHandle,
    name: &str,
) -> Option<String> {
    let db = ctx.databases().get(kind);
    let lookup = if !db.supports_type(handle.type_tag) {
        Err((
            IssueKind::UnsupportedType,
            format!(
                "{} database does not support '{}'",
                kind.label(),
                handle.type_tag
            ),
        ))
    } else {
        db.try_get_identifier(&handle).map(str::to_owned).ok_or((
            IssueKind::UnresolvedReference,
            format!("{handle} is not in the {} database", kind.label()),
        ))
    };
    match lookup {
        Ok(identifier) => Some(identifier),
        Err((issue, detail)) => {
            ctx.report(issue, name, detail);
            None
        }
    }
}

/// `Some(handle)` to assign (`Some(None)` when the field is absent), `None`
/// to leave the field untouched.
fn catalog_handle<T: EngineType>(
    ctx: &mut SerializationContext<'_>,
    kind: DatabaseKind,
    name: &str,
    input: &AccessorDictionary,
) -> Option<Option<ObjectHandle>> {
    let identifier = match input.value(name) {
        None => return Some(None),
        Some(Value::String(identifier)) => identifier,
        Some(other) => {
            report_kind_mismatch(ctx, name, "string identifier", other);
            return None;
        }
    };
    match ctx.databases().get(kind).try_get_handle(identifier) {
        Some(handle) if handle.is::<T>() => Some(Some(handle)),
        Some(handle) => {
            ctx.report(
                IssueKind::TypeMismatch,
                name,
                format!("'{identifier}' resolves to {handle}, expected {}", T::TYPE_NAME),
            );
            None
        }
        None => {
            ctx.report(
                IssueKind::UnresolvedReference,
                name,
                format!("'{identifier}' is not in the {} database", kind.label()),
            );
            None
        }
    }
}

macro_rules! impl_catalog_field {
    ($name:ident, $kind:expr) => {
        impl<T: EngineType> Field for $name<T> {
            fn serialize_field(
                &self,
                name: &str,
                output: &mut AccessorDictionary,
                ctx: &mut SerializationContext<'_>,
            ) {
                let Some(handle) = self.handle() else {
                    return;
                };
                if let Some(identifier) = catalog_identifier(ctx, $kind, handle, name) {
                    output.insert(name, Value::String(identifier));
                }
            }

            fn deserialize_field(
                &mut self,
                name: &str,
                input: &AccessorDictionary,
                ctx: &mut SerializationContext<'_>,
            ) {
                if let Some(handle) = catalog_handle::<T>(ctx, $kind, name, input) {
                    self.assign(handle);
                }
            }
        }
    };
}

impl_catalog_field!(Asset, DatabaseKind::Asset);
impl_catalog_field!(Template, DatabaseKind::Template);

// ---------------------------------------------------------------------------
// Live references
// ---------------------------------------------------------------------------

/// Write the identifier of `handle` into the document once the walk is over.
fn defer_live_identifier(ctx: &mut SerializationContext<'_>, name: &str, handle: ObjectHandle) {
    let path = ctx.path().to_vec();
    let key = name.to_owned();
    ctx.defer(move |scope| {
        let identifier = scope
            .databases()
            .live_refs
            .try_get_identifier(&handle)
            .map(str::to_owned);
        let Some(identifier) = identifier else {
            scope.report(Issue::new(
                IssueKind::UnresolvedReference,
                join_path(&path, &key),
                format!("{handle} was never registered as a live object"),
            ));
            return;
        };
        match scope.fields_at(&path) {
            Some(fields) => {
                fields.insert(key, Value::String(identifier));
            }
            None => scope.report(Issue::new(
                IssueKind::StructuralCorruption,
                join_path(&path, &key),
                "the serialized document no longer contains this field",
            )),
        }
    });
}

/// Fill `slot` from the Live-Reference database once the walk is over.
fn defer_live_resolution<T: EngineType>(
    ctx: &mut SerializationContext<'_>,
    name: &str,
    identifier: String,
    slot: Rc<Cell<Option<ObjectHandle>>>,
) {
    let path = ctx.field_path(name);
    ctx.defer(move |scope| {
        let resolved = scope.databases().live_refs.try_get_handle(&identifier);
        match resolved {
            Some(handle) if handle.is::<T>() => slot.set(Some(handle)),
            Some(handle) => scope.report(Issue::new(
                IssueKind::TypeMismatch,
                path,
                format!("'{identifier}' resolves to {handle}, expected {}", T::TYPE_NAME),
            )),
            None => scope.report(Issue::new(
                IssueKind::UnresolvedReference,
                path,
                format!("no live object is registered as '{identifier}'"),
            )),
        }
    });
}

impl<T: EngineType> Field for LiveRef<T> {
    fn serialize_field(
        &self,
        name: &str,
        output: &mut AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) {
        let Some(handle) = self.handle() else {
            return;
        };
        let known = ctx
            .databases()
            .live_refs
            .try_get_identifier(&handle)
            .map(str::to_owned);
        match known {
            Some(identifier) => {
                output.insert(name, Value::String(identifier));
            }
            None => defer_live_identifier(ctx, name, handle),
        }
    }

    fn deserialize_field(
        &mut self,
        name: &str,
        input: &AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) {
        match input.value(name) {
            // unresolved on save; keep whatever the instance holds
            None => {}
            Some(Value::String(identifier)) => {
                defer_live_resolution::<T>(ctx, name, identifier.clone(), self.shared_slot());
            }
            Some(other) => report_kind_mismatch(ctx, name, "string identifier", other),
        }
    }
}

// ---------------------------------------------------------------------------
// Nested objects
// ---------------------------------------------------------------------------

/// Serialize a nested persistable object as a [`Value::Object`].
pub fn serialize_object_field(
    object: &dyn Persistable,
    name: &str,
    output: &mut AccessorDictionary,
    ctx: &mut SerializationContext<'_>,
) {
    let data = ctx.serialize_child(name, object);
    output.insert(name, Value::Object(Box::new(data)));
}

/// Deserialize a nested persistable object in place.
pub fn deserialize_object_field(
    object: &mut dyn Persistable,
    name: &str,
    input: &AccessorDictionary,
    ctx: &mut SerializationContext<'_>,
) {
    match input.value(name) {
        None => {}
        Some(Value::Object(data)) => ctx.deserialize_child(name, object, data),
        Some(other) => report_kind_mismatch(ctx, name, "object", other),
    }
}

fn serialize_optional_object_field<T: Persistable>(
    object: &Option<T>,
    name: &str,
    output: &mut AccessorDictionary,
    ctx: &mut SerializationContext<'_>,
) {
    if let Some(object) = object {
        serialize_object_field(object, name, output, ctx);
    }
}

/// Deserialize into the existing value, or construct a fresh `T` through
/// the type registry when the slot is empty.
fn deserialize_optional_object_field<T: Persistable>(
    slot: &mut Option<T>,
    name: &str,
    input: &AccessorDictionary,
    ctx: &mut SerializationContext<'_>,
) {
    let data = match input.value(name) {
        None => {
            *slot = None;
            return;
        }
        Some(Value::Object(data)) => data,
        Some(other) => {
            report_kind_mismatch(ctx, name, "object", other);
            return;
        }
    };
    if let Some(existing) = slot.as_mut() {
        ctx.deserialize_child(name, existing, data);
        return;
    }
    let fresh = construct(ctx, name, data)
        .and_then(|object| object.into_any().downcast::<T>().ok());
    match fresh {
        Some(mut fresh) => {
            ctx.deserialize_child(name, &mut *fresh, data);
            *slot = Some(*fresh);
        }
        None => ctx.report(
            IssueKind::StructuralCorruption,
            name,
            format!(
                "cannot construct '{}' for a field of type '{}'",
                data.target_type,
                T::persisted_name()
            ),
        ),
    }
}

impl<T: Persistable> Field for Option<T> {
    fn serialize_field(
        &self,
        name: &str,
        output: &mut AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) {
        serialize_optional_object_field(self, name, output, ctx);
    }

    fn deserialize_field(
        &mut self,
        name: &str,
        input: &AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) {
        deserialize_optional_object_field(self, name, input, ctx);
    }
}

fn construct(
    ctx: &mut SerializationContext<'_>,
    name: &str,
    data: &ObjectData,
) -> Option<Box<dyn Persistable>> {
    let constructed = ctx.types().construct(&data.target_type);
    if constructed.is_none() {
        ctx.report(
            IssueKind::StructuralCorruption,
            name,
            format!("type '{}' is not registered", data.target_type),
        );
    }
    constructed
}

/// Replace `object` with a freshly constructed instance when the stored
/// type differs from the current one.
fn deserialize_boxed(
    object: &mut Box<dyn Persistable>,
    name: &str,
    data: &ObjectData,
    ctx: &mut SerializationContext<'_>,
) {
    if (**object).type_name() == data.target_type {
        ctx.deserialize_child(name, &mut **object, data);
        return;
    }
    if let Some(mut fresh) = construct(ctx, name, data) {
        ctx.deserialize_child(name, &mut *fresh, data);
        *object = fresh;
    }
}

impl Field for Box<dyn Persistable> {
    fn serialize_field(
        &self,
        name: &str,
        output: &mut AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) {
        serialize_object_field(&**self, name, output, ctx);
    }

    fn deserialize_field(
        &mut self,
        name: &str,
        input: &AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) {
        match input.value(name) {
            None => {}
            Some(Value::Object(data)) => deserialize_boxed(self, name, data, ctx),
            Some(other) => report_kind_mismatch(ctx, name, "object", other),
        }
    }
}

impl Field for Option<Box<dyn Persistable>> {
    fn serialize_field(
        &self,
        name: &str,
        output: &mut AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) {
        if let Some(object) = self {
            serialize_object_field(&**object, name, output, ctx);
        }
    }

    fn deserialize_field(
        &mut self,
        name: &str,
        input: &AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) {
        let data = match input.value(name) {
            None => {
                *self = None;
                return;
            }
            Some(Value::Object(data)) => data,
            Some(other) => {
                report_kind_mismatch(ctx, name, "object", other);
                return;
            }
        };
        match self {
            Some(object) => deserialize_boxed(object, name, data, ctx),
            None => {
                if let Some(mut fresh) = construct(ctx, name, data) {
                    ctx.deserialize_child(name, &mut *fresh, data);
                    *self = Some(fresh);
                }
            }
        }
    }
}
