use std::any::TypeId;
use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Converter, ConverterRegistration};
use crate::persistable::TypeInfo;

/// Ordered set of converters with a per-type resolution cache.
///
/// Resolution picks the highest [`Converter::priority`] among the
/// converters claiming the exact type; equal priorities go to the one
/// registered first. Only when nothing claims the exact type are
/// generic-definition claims consulted, with the same ranking.
pub struct ConverterRegistry {
    converters: Vec<Box<dyn Converter>>,
    cache: RwLock<HashMap<TypeId, Option<usize>>>,
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A registry holding every converter submitted through `inventory`,
    /// built-ins included. Submission order across crates is unspecified.
    pub fn discover() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<ConverterRegistration> {
            registry.register_boxed(registration.create());
        }
        log::debug!("Discovered {} converters", registry.len());
        registry
    }

    pub fn register(&mut self, converter: impl Converter) {
        self.register_boxed(Box::new(converter));
    }

    pub fn register_boxed(&mut self, converter: Box<dyn Converter>) {
        log::debug!(
            "Registered converter '{}' (priority {})",
            converter.name(),
            converter.priority()
        );
        self.converters.push(converter);
        self.cache.get_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// The converter for `ty`, resolved once and cached.
    pub fn find(&self, ty: &TypeInfo) -> Option<&dyn Converter> {
        let cached = self.cache.read().get(&ty.id).copied();
        let index = match cached {
            Some(index) => index,
            None => {
                let index = self.resolve(ty);
                self.cache.write().insert(ty.id, index);
                index
            }
        };
        index.map(|index| self.converters[index].as_ref())
    }

    fn resolve(&self, ty: &TypeInfo) -> Option<usize> {
        let exact = self.best(|converter| converter.can_convert(ty));
        if exact.is_some() {
            return exact;
        }
        if ty.is_generic() {
            let definition = ty.definition();
            return self.best(|converter| converter.can_convert_definition(definition));
        }
        None
    }

    fn best(&self, claims: impl Fn(&dyn Converter) -> bool) -> Option<usize> {
        let mut best: Option<(usize, i32)> = None;
        for (index, converter) in self.converters.iter().enumerate() {
            if !claims(converter.as_ref()) {
                continue;
            }
            let priority = converter.priority();
            // strictly greater: the first registered keeps ties
            if best.is_none_or(|(_, current)| priority > current) {
                best = Some((index, priority));
            }
        }
        best.map(|(index, _)| index)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::collections::BTreeMap;

    use super::*;
    use crate::context::SerializationContext;
    use crate::error::CodecError;
    use crate::object_data::AccessorDictionary;

    struct Fixed {
        label: &'static str,
        priority: i32,
        claims: TypeId,
    }

    impl Converter for Fixed {
        fn name(&self) -> &'static str {
            self.label
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn can_convert(&self, ty: &TypeInfo) -> bool {
            ty.id == self.claims
        }

        fn serialize(
            &self,
            _value: &dyn Any,
            _output: &mut AccessorDictionary,
            _ctx: &mut SerializationContext<'_>,
        ) -> Result<(), CodecError> {
            Ok(())
        }

        fn deserialize(
            &self,
            _existing: &mut dyn Any,
            _input: &AccessorDictionary,
            _ctx: &mut SerializationContext<'_>,
        ) -> Result<(), CodecError> {
            Ok(())
        }
    }

    struct AnyMap;

    impl Converter for AnyMap {
        fn can_convert(&self, _ty: &TypeInfo) -> bool {
            false
        }

        fn can_convert_definition(&self, definition: &str) -> bool {
            definition.ends_with("BTreeMap")
        }

        fn serialize(
            &self,
            _value: &dyn Any,
            _output: &mut AccessorDictionary,
            _ctx: &mut SerializationContext<'_>,
        ) -> Result<(), CodecError> {
            Ok(())
        }

        fn deserialize(
            &self,
            _existing: &mut dyn Any,
            _input: &AccessorDictionary,
            _ctx: &mut SerializationContext<'_>,
        ) -> Result<(), CodecError> {
            Ok(())
        }
    }

    fn fixed<T: 'static>(label: &'static str, priority: i32) -> Fixed {
        Fixed {
            label,
            priority,
            claims: TypeId::of::<T>(),
        }
    }

    #[test]
    fn highest_priority_wins() {
        let mut registry = ConverterRegistry::new();
        registry.register(fixed::<u8>("B", -1));
        registry.register(fixed::<u8>("A", 5));

        for _ in 0..3 {
            assert_eq!(registry.find(&TypeInfo::of::<u8>()).unwrap().name(), "A");
        }
    }

    #[test]
    fn ties_go_to_first_registered() {
        let mut registry = ConverterRegistry::new();
        registry.register(fixed::<u8>("first", 2));
        registry.register(fixed::<u8>("second", 2));
        assert_eq!(registry.find(&TypeInfo::of::<u8>()).unwrap().name(), "first");
    }

    #[test]
    fn no_claim_is_none() {
        let mut registry = ConverterRegistry::new();
        registry.register(fixed::<u8>("bytes", 0));
        assert!(registry.find(&TypeInfo::of::<u16>()).is_none());
        // cached negative result
        assert!(registry.find(&TypeInfo::of::<u16>()).is_none());
    }

    #[test]
    fn registering_invalidates_cache() {
        let mut registry = ConverterRegistry::new();
        assert!(registry.find(&TypeInfo::of::<u8>()).is_none());

        registry.register(fixed::<u8>("late", 0));
        assert_eq!(registry.find(&TypeInfo::of::<u8>()).unwrap().name(), "late");
    }

    #[test]
    fn generic_definition_fallback() {
        let mut registry = ConverterRegistry::new();
        registry.register(AnyMap);

        let map = TypeInfo::of::<BTreeMap<String, f32>>();
        assert!(registry.find(&map).is_some());
        assert!(registry.find(&TypeInfo::of::<Vec<u8>>()).is_none());

        // an exact claim beats the definition claim regardless of priority
        registry.register(fixed::<BTreeMap<String, f32>>("exact", -100));
        assert_eq!(registry.find(&map).unwrap().name(), "exact");
    }

    #[test]
    fn discover_includes_builtins() {
        let registry = ConverterRegistry::discover();
        let duration = registry
            .find(&TypeInfo::of::<std::time::Duration>())
            .unwrap();
        assert!(duration.priority() < 0);
        assert!(registry.find(&TypeInfo::of::<std::ops::Range<f32>>()).is_some());
    }
}
