//! One-call entry points bundling converters, types and settings.

use objgraph_store::Store;

use crate::archive;
use crate::config::CodecSettings;
use crate::context::SerializationContext;
use crate::converter::{Converter, ConverterRegistry};
use crate::database::DatabaseSet;
use crate::error::CodecError;
use crate::issue::Issue;
use crate::object_data::ObjectData;
use crate::persistable::{Persistable, TypeRegistry};

/// Output of [`Codec::serialize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Serialized {
    pub document: ObjectData,
    pub issues: Vec<Issue>,
}

/// Converter registry, type registry and settings for whole-graph walks.
///
/// Each call creates its own [`SerializationContext`], walks the graph and
/// flushes the deferred queue exactly once.
pub struct Codec {
    converters: ConverterRegistry,
    types: TypeRegistry,
    settings: CodecSettings,
}

impl Codec {
    /// A codec with every discovered converter and default settings.
    pub fn new() -> Self {
        Self::with_converters(ConverterRegistry::discover())
    }

    pub fn with_converters(converters: ConverterRegistry) -> Self {
        Self {
            converters,
            types: TypeRegistry::new(),
            settings: CodecSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: CodecSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn register_converter(&mut self, converter: impl Converter) {
        self.converters.register(converter);
    }

    pub fn register_type<T: Persistable + Default>(&mut self) {
        self.types.register::<T>();
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn settings(&self) -> &CodecSettings {
        &self.settings
    }

    /// A fresh context over `databases`, for callers driving the walk and
    /// flush themselves.
    pub fn context<'a>(&'a self, databases: &'a mut DatabaseSet) -> SerializationContext<'a> {
        self.settings.apply(databases);
        SerializationContext::new(&self.converters, &self.types, databases)
            .record_issues(self.settings.record_issues)
    }

    pub fn serialize(
        &self,
        root: &dyn Persistable,
        databases: &mut DatabaseSet,
    ) -> Result<Serialized, CodecError> {
        let mut ctx = self.context(databases);
        ctx.serialize(root)?;
        ctx.flush()?;
        let document = ctx.take_document().ok_or(CodecError::NoDocument)?;
        Ok(Serialized {
            document,
            issues: ctx.take_issues(),
        })
    }

    pub fn deserialize_into(
        &self,
        target: &mut dyn Persistable,
        document: &ObjectData,
        databases: &mut DatabaseSet,
    ) -> Result<Vec<Issue>, CodecError> {
        let mut ctx = self.context(databases);
        ctx.deserialize(target, document)?;
        ctx.flush()?;
        Ok(ctx.take_issues())
    }

    /// Construct the document's root type and load the document into it.
    pub fn instantiate(
        &self,
        document: &ObjectData,
        databases: &mut DatabaseSet,
    ) -> Result<(Option<Box<dyn Persistable>>, Vec<Issue>), CodecError> {
        let mut ctx = self.context(databases);
        let object = ctx.instantiate(document)?;
        ctx.flush()?;
        Ok((object, ctx.take_issues()))
    }

    /// Serialize `root` and store it under `identifier` in the default format.
    pub fn save(
        &self,
        store: &dyn Store,
        identifier: &str,
        root: &dyn Persistable,
        databases: &mut DatabaseSet,
    ) -> Result<Vec<Issue>, CodecError> {
        let serialized = self.serialize(root, databases)?;
        archive::try_save(
            store,
            identifier,
            &serialized.document,
            self.settings.default_format,
        )?;
        Ok(serialized.issues)
    }

    /// Load the document stored under `identifier` into `target`.
    pub fn load_into(
        &self,
        store: &dyn Store,
        identifier: &str,
        target: &mut dyn Persistable,
        databases: &mut DatabaseSet,
    ) -> Result<Vec<Issue>, CodecError> {
        let document = archive::try_load(store, identifier, self.settings.default_format)?;
        self.deserialize_into(target, &document, databases)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}
