//! Pluggable per-type converters.
//!
//! A [`Converter`] turns values of the types it claims into a field
//! dictionary and back. The [`ConverterRegistry`] picks the highest-priority
//! converter for each type; built-ins use negative priorities so user
//! converters win by default.

mod builtin;
mod registry;

use std::any::Any;

use crate::context::SerializationContext;
use crate::error::CodecError;
use crate::handle::ObjectHandle;
use crate::object_data::AccessorDictionary;
use crate::persistable::TypeInfo;

pub use builtin::{DurationConverter, RangeConverter};
pub use registry::ConverterRegistry;

/// Converts values of one or more types to and from a field dictionary.
pub trait Converter: Send + Sync + 'static {
    /// Name used in logs and issues.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Higher wins when several converters claim a type.
    fn priority(&self) -> i32 {
        0
    }

    fn can_convert(&self, ty: &TypeInfo) -> bool;

    /// Claim every instantiation of a generic type definition
    /// (`"alloc::vec::Vec"`). Consulted only when no converter claims the
    /// exact type.
    ///
    /// `definition` comes from [`std::any::type_name`], which is not stable
    /// across compiler versions; prefer [`can_convert`](Self::can_convert)
    /// with `TypeId` checks where the set of instantiations is known.
    fn can_convert_definition(&self, _definition: &str) -> bool {
        false
    }

    fn serialize(
        &self,
        value: &dyn Any,
        output: &mut AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<(), CodecError>;

    /// Update `existing` in place from `input`.
    fn deserialize(
        &self,
        existing: &mut dyn Any,
        input: &AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<(), CodecError>;

    /// Live handle of the converted value, if it has one. Lets the walker
    /// record and restore the value's identity.
    fn reference(&self, _value: &dyn Any) -> Option<ObjectHandle> {
        None
    }
}

/// A converter for exactly one type, wrapped with [`Typed`] to register it.
pub trait TypedConverter: Send + Sync + 'static {
    type Target: 'static;

    fn priority(&self) -> i32 {
        0
    }

    fn serialize(
        &self,
        value: &Self::Target,
        output: &mut AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<(), CodecError>;

    fn deserialize(
        &self,
        existing: &mut Self::Target,
        input: &AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<(), CodecError>;

    fn reference(&self, _value: &Self::Target) -> Option<ObjectHandle> {
        None
    }
}

/// Adapts a [`TypedConverter`] to the dynamic [`Converter`] interface.
pub struct Typed<C>(pub C);

impl<C: TypedConverter> Typed<C> {
    fn mismatch() -> CodecError {
        CodecError::ConverterTarget {
            converter: std::any::type_name::<C>(),
        }
    }
}

impl<C: TypedConverter> Converter for Typed<C> {
    fn name(&self) -> &'static str {
        std::any::type_name::<C>()
    }

    fn priority(&self) -> i32 {
        self.0.priority()
    }

    fn can_convert(&self, ty: &TypeInfo) -> bool {
        ty.id == std::any::TypeId::of::<C::Target>()
    }

    fn serialize(
        &self,
        value: &dyn Any,
        output: &mut AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<(), CodecError> {
        let value = value.downcast_ref::<C::Target>().ok_or_else(Self::mismatch)?;
        self.0.serialize(value, output, ctx)
    }

    fn deserialize(
        &self,
        existing: &mut dyn Any,
        input: &AccessorDictionary,
        ctx: &mut SerializationContext<'_>,
    ) -> Result<(), CodecError> {
        let existing = existing
            .downcast_mut::<C::Target>()
            .ok_or_else(Self::mismatch)?;
        self.0.deserialize(existing, input, ctx)
    }

    fn reference(&self, value: &dyn Any) -> Option<ObjectHandle> {
        value
            .downcast_ref::<C::Target>()
            .and_then(|value| self.0.reference(value))
    }
}

/// Link-time registration collected by [`ConverterRegistry::discover`].
///
/// ```ignore
/// fn make_color() -> Box<dyn Converter> {
///     Box::new(Typed(ColorConverter))
/// }
/// inventory::submit! { ConverterRegistration::new(make_color) }
/// ```
pub struct ConverterRegistration {
    create: fn() -> Box<dyn Converter>,
}

impl ConverterRegistration {
    pub const fn new(create: fn() -> Box<dyn Converter>) -> Self {
        Self { create }
    }

    pub fn create(&self) -> Box<dyn Converter> {
        (self.create)()
    }
}

inventory::collect!(ConverterRegistration);
