//! Object-graph serialization engine.
//!
//! Turns in-memory object graphs into ordered dictionaries of typed values
//! ([`ObjectData`]) and back, replacing engine-object handles with stable
//! string identifiers kept in side-table databases.
//!
//! This crate provides:
//!
//! - [`Value`] / [`AccessorDictionary`] / [`ObjectData`] — the serialized
//!   form, one accessor variant per supported value type
//! - [`IdentifierDatabase`] / [`DatabaseSet`] — Asset, Template and
//!   Live-Reference identifier stores
//! - [`Converter`] / [`ConverterRegistry`] — pluggable per-type conversion
//!   with priority-based resolution
//! - [`Persistable`] / [`Field`] — field reflection, derivable with
//!   `#[derive(Persistable)]`
//! - [`SerializationContext`] — one graph walk: walker entry points, the
//!   deferred-action queue and recorded [`Issue`]s
//! - [`Codec`] — one-call serialize / deserialize / save / load
//! - [`Format`] / [`encode`] / [`decode`] — RON and bincode (feature-gated)
//!
//! # Example
//!
//! ```ignore
//! #[derive(Default, Persistable)]
//! struct Player {
//!     pub health: i32,
//!     pub skin: Asset<Texture>,
//! }
//!
//! let codec = Codec::new();
//! let mut databases = DatabaseSet::new();
//! let saved = codec.serialize(&player, &mut databases)?;
//! let mut restored = Player::default();
//! codec.deserialize_into(&mut restored, &saved.document, &mut databases)?;
//! ```

extern crate self as objgraph_codec;

pub mod archive;
mod codec;
mod config;
mod context;
pub mod converter;
mod database;
mod error;
pub mod field;
mod format;
mod handle;
mod issue;
mod object_data;
mod persistable;
mod value;
mod walker;

pub use codec::{Codec, Serialized};
pub use codec_macro::Persistable;
pub use config::CodecSettings;
pub use context::{CodecMode, DeferredScope, SerializationContext};
pub use converter::{
    Converter, ConverterRegistration, ConverterRegistry, Typed, TypedConverter,
};
pub use database::{
    CatalogEntry, CatalogFilter, CatalogSource, DEFAULT_RETRY_LIMIT, DatabaseKind, DatabaseSet,
    IdentifierDatabase, IdentifierGenerator, RuntimeMode, SequentialGenerator, StaticCatalog,
    UuidGenerator,
};
pub use error::CodecError;
pub use field::Field;
pub use format::{Format, decode, encode};
pub use handle::{Asset, EngineType, LiveRef, ObjectHandle, Template};
pub use issue::{Issue, IssueKind};
pub use object_data::{AccessorDictionary, ObjectData, ReferenceData};
pub use persistable::{AsAny, FieldInfo, FieldMut, FieldRef, Persistable, TypeInfo, TypeRegistry};
pub use value::{AccessorKind, AccessorRegistry, AccessorValue, ListElement, Value};

// Re-exported for `inventory::submit!` of converter registrations.
pub use inventory;
