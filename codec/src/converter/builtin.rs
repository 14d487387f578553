//! Converters shipped with the codec. They register at negative priority so
//! any user converter for the same type takes precedence.

use std::ops::Range;
use std::time::Duration;

use super::{Converter, ConverterRegistration, Typed, TypedConverter};
use crate::context::SerializationContext;
use crate::error::CodecError;
use crate::object_data::AccessorDictionary;

const BUILTIN_PRIORITY: i32 = -10;

/// `Duration` as whole seconds plus nanoseconds.
pub struct DurationConverter;

impl TypedConverter for DurationConverter {
    type Target = Duration;

    fn priority(&self) -> i32 {
        BUILTIN_PRIORITY
    }

    fn serialize(
        &self,
        value: &Duration,
        output: &mut AccessorDictionary,
        _ctx: &mut SerializationContext<'_>,
    ) -> Result<(), CodecError> {
        output.set("secs", value.as_secs());
        output.set("nanos", value.subsec_nanos());
        Ok(())
    }

    fn deserialize(
        &self,
        existing: &mut Duration,
        input: &AccessorDictionary,
        _ctx: &mut SerializationContext<'_>,
    ) -> Result<(), CodecError> {
        *existing = Duration::new(input.require("secs")?, input.require("nanos")?);
        Ok(())
    }
}

/// `Range<f32>` as its two bounds.
pub struct RangeConverter;

impl TypedConverter for RangeConverter {
    type Target = Range<f32>;

    fn priority(&self) -> i32 {
        BUILTIN_PRIORITY
    }

    fn serialize(
        &self,
        value: &Range<f32>,
        output: &mut AccessorDictionary,
        _ctx: &mut SerializationContext<'_>,
    ) -> Result<(), CodecError> {
        output.set("start", value.start);
        output.set("end", value.end);
        Ok(())
    }

    fn deserialize(
        &self,
        existing: &mut Range<f32>,
        input: &AccessorDictionary,
        _ctx: &mut SerializationContext<'_>,
    ) -> Result<(), CodecError> {
        // a partial range keeps the missing bound
        if let Some(start) = input.get("start")? {
            existing.start = start;
        }
        if let Some(end) = input.get("end")? {
            existing.end = end;
        }
        Ok(())
    }
}

fn make_duration() -> Box<dyn Converter> {
    Box::new(Typed(DurationConverter))
}

fn make_range() -> Box<dyn Converter> {
    Box::new(Typed(RangeConverter))
}

inventory::submit! { ConverterRegistration::new(make_duration) }
inventory::submit! { ConverterRegistration::new(make_range) }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterRegistry;
    use crate::database::DatabaseSet;
    use crate::persistable::TypeRegistry;

    fn with_context(test: impl FnOnce(&mut SerializationContext<'_>)) {
        let converters = ConverterRegistry::new();
        let types = TypeRegistry::new();
        let mut databases = DatabaseSet::new();
        let mut ctx = SerializationContext::new(&converters, &types, &mut databases);
        test(&mut ctx);
    }

    #[test]
    fn duration_round_trip() {
        with_context(|ctx| {
            let converter = Typed(DurationConverter);
            let original = Duration::new(90, 250_000_000);
            let mut output = AccessorDictionary::new();
            converter.serialize(&original, &mut output, ctx).unwrap();
            assert_eq!(output.get::<u64>("secs").unwrap(), Some(90));

            let mut restored = Duration::ZERO;
            converter.deserialize(&mut restored, &output, ctx).unwrap();
            assert_eq!(restored, original);
        });
    }

    #[test]
    fn duration_requires_both_fields() {
        with_context(|ctx| {
            let mut input = AccessorDictionary::new();
            input.set("secs", 5_u64);
            let mut restored = Duration::ZERO;
            let result = Typed(DurationConverter).deserialize(&mut restored, &input, ctx);
            assert!(matches!(result, Err(CodecError::MissingField(_))));
            assert_eq!(restored, Duration::ZERO);
        });
    }

    #[test]
    fn range_round_trip_and_partial() {
        with_context(|ctx| {
            let converter = Typed(RangeConverter);
            let mut output = AccessorDictionary::new();
            converter.serialize(&(0.5_f32..2.0), &mut output, ctx).unwrap();

            let mut restored = 0.0_f32..0.0;
            converter.deserialize(&mut restored, &output, ctx).unwrap();
            assert_eq!(restored, 0.5..2.0);

            output.remove("start");
            let mut partial = -1.0_f32..0.0;
            converter.deserialize(&mut partial, &output, ctx).unwrap();
            assert_eq!(partial, -1.0..2.0);
        });
    }

    #[test]
    fn wrong_target_is_an_error() {
        with_context(|ctx| {
            let mut output = AccessorDictionary::new();
            let result = Typed(DurationConverter).serialize(&5_u32, &mut output, ctx);
            assert!(matches!(result, Err(CodecError::ConverterTarget { .. })));
        });
    }
}
