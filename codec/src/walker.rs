//! The generic object walker.
//!
//! For every persisted field, in declaration order:
//!
//! 1. a converter registered for the declared type (or its generic
//!    definition) writes a nested [`ObjectData`];
//! 2. otherwise the field stores itself through [`Field`](crate::Field):
//!    catalog handles become identifiers, plain values are copied, live
//!    references resolve now or at flush;
//! 3. a converter-only field with no converter is reported as unsupported.

use crate::context::SerializationContext;
use crate::handle::ObjectHandle;
use crate::issue::IssueKind;
use crate::object_data::{AccessorDictionary, ObjectData, ReferenceData};
use crate::persistable::{FieldInfo, FieldMut, FieldRef, Persistable};
use crate::value::Value;

// ---------------------------------------------------------------------------
// Live identity
// ---------------------------------------------------------------------------

/// Identity of `handle` in the Live-Reference database, registering it
/// when the database accepts new entries.
fn register_live(handle: ObjectHandle, ctx: &mut SerializationContext<'_>) -> Option<ReferenceData> {
    let live = &mut ctx.databases_mut().live_refs;
    let identifier = match live.try_get_identifier(&handle) {
        Some(identifier) => identifier.to_owned(),
        None if !live.is_mutable() => return None,
        None => match live.try_add(handle) {
            Some(identifier) => identifier,
            None => {
                ctx.report(
                    IssueKind::IdentifierCollision,
                    "",
                    format!("could not register {handle} as a live object"),
                );
                return None;
            }
        },
    };
    Some(ReferenceData {
        identifier,
        type_tag: handle.type_tag.to_owned(),
    })
}

/// Bind a deserialized object's saved identity to its current handle.
fn attach_live(
    reference: &ReferenceData,
    handle: ObjectHandle,
    ctx: &mut SerializationContext<'_>,
) {
    if reference.type_tag != handle.type_tag {
        ctx.report(
            IssueKind::TypeMismatch,
            "",
            format!(
                "saved identity '{}' is a '{}', the instance is {handle}",
                reference.identifier, reference.type_tag
            ),
        );
        return;
    }
    let live = &mut ctx.databases_mut().live_refs;
    if !live.is_mutable() {
        log::debug!(
            "Live references are frozen, not attaching '{}' to {handle}",
            reference.identifier
        );
        return;
    }
    if !live.try_insert(&reference.identifier, handle) {
        ctx.report(
            IssueKind::IdentifierCollision,
            "",
            format!(
                "'{}' is already bound to another live object",
                reference.identifier
            ),
        );
    }
}

// ---------------------------------------------------------------------------
// Serialize
// ---------------------------------------------------------------------------

pub(crate) fn serialize_object(
    object: &dyn Persistable,
    ctx: &mut SerializationContext<'_>,
) -> ObjectData {
    let mut data = ObjectData::new(object.type_name());
    if let Some(handle) = object.live_handle() {
        data.reference = register_live(handle, ctx);
    }

    for info in object.field_infos() {
        match object.field(info.name) {
            Some(field) => serialize_field(info, field, &mut data.fields, ctx),
            None => log::debug!(
                "'{}' lists field '{}' but does not expose it",
                object.type_name(),
                info.name
            ),
        }
    }
    data
}

fn serialize_field(
    info: &FieldInfo,
    field: FieldRef<'_>,
    output: &mut AccessorDictionary,
    ctx: &mut SerializationContext<'_>,
) {
    if let Some(converter) = ctx.converters().find(&info.type_info) {
        let value = field.as_any();
        let mut nested = ObjectData::new(info.type_info.name);
        if let Some(handle) = converter.reference(value) {
            nested.reference = register_live(handle, ctx);
        }

        ctx.push_path(info.name);
        let result = converter.serialize(value, &mut nested.fields, ctx);
        ctx.pop_path();

        match result {
            Ok(()) => {
                output.insert(info.name, Value::Object(Box::new(nested)));
            }
            Err(err) => ctx.report(
                IssueKind::from(&err),
                info.name,
                format!("converter '{}' failed: {err}", converter.name()),
            ),
        }
        return;
    }

    match field {
        FieldRef::Codec(field) => field.serialize_field(info.name, output, ctx),
        FieldRef::Opaque(_) => ctx.report(
            IssueKind::UnsupportedType,
            info.name,
            format!("no converter for '{}'", info.type_info.name),
        ),
    }
}

// ---------------------------------------------------------------------------
// Deserialize
// ---------------------------------------------------------------------------

pub(crate) fn deserialize_object(
    object: &mut dyn Persistable,
    data: &ObjectData,
    ctx: &mut SerializationContext<'_>,
) {
    if data.target_type != object.type_name() {
        ctx.report(
            IssueKind::StructuralCorruption,
            "",
            format!(
                "stored object is a '{}', cannot load it into '{}'",
                data.target_type,
                object.type_name()
            ),
        );
        return;
    }
    if let (Some(reference), Some(handle)) = (&data.reference, object.live_handle()) {
        attach_live(reference, handle, ctx);
    }

    for info in object.field_infos() {
        if let Some(field) = object.field_mut(info.name) {
            deserialize_field(info, field, &data.fields, ctx);
        }
    }
}

fn deserialize_field(
    info: &FieldInfo,
    mut field: FieldMut<'_>,
    input: &AccessorDictionary,
    ctx: &mut SerializationContext<'_>,
) {
    if let Some(converter) = ctx.converters().find(&info.type_info) {
        let nested = match input.value(info.name) {
            None => return,
            Some(Value::Object(nested)) => nested,
            Some(other) => {
                ctx.report(
                    IssueKind::TypeMismatch,
                    info.name,
                    format!(
                        "expected converter output, found {}",
                        other.kind().short_name()
                    ),
                );
                return;
            }
        };
        if nested.target_type != info.type_info.name {
            ctx.report(
                IssueKind::StructuralCorruption,
                info.name,
                format!(
                    "stored as '{}', the field is declared as '{}'",
                    nested.target_type, info.type_info.name
                ),
            );
            return;
        }
        if let Some(reference) = &nested.reference {
            if let Some(handle) = converter.reference(field.as_any_mut()) {
                attach_live(reference, handle, ctx);
            }
        }

        ctx.push_path(info.name);
        let result = converter.deserialize(field.as_any_mut(), &nested.fields, ctx);
        ctx.pop_path();

        if let Err(err) = result {
            ctx.report(
                IssueKind::from(&err),
                info.name,
                format!("converter '{}' failed: {err}", converter.name()),
            );
        }
        return;
    }

    match field {
        FieldMut::Codec(field) => field.deserialize_field(info.name, input, ctx),
        FieldMut::Opaque(_) => {
            if input.contains(info.name) {
                ctx.report(
                    IssueKind::UnsupportedType,
                    info.name,
                    format!("no converter for '{}'", info.type_info.name),
                );
            }
        }
    }
}
