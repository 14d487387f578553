//! Identifier databases.
//!
//! Each [`IdentifierDatabase`] is a bijection between stable string
//! identifiers and [`ObjectHandle`]s. The Asset and Template databases are
//! author-time catalogs, frozen while the host runs; the Live-Reference
//! database holds runtime identity and only changes while the host runs.
//! [`DatabaseSet`] owns all three and switches their mode together.

use std::collections::{HashMap, HashSet};

use crate::handle::{EngineType, ObjectHandle};

/// Default bound on identifier re-rolls after a collision.
pub const DEFAULT_RETRY_LIMIT: usize = 16;

/// Which of the three databases a store is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    Asset,
    Template,
    LiveReference,
}

impl DatabaseKind {
    /// Asset and Template databases are author-time catalogs.
    pub fn is_catalog(self) -> bool {
        !matches!(self, Self::LiveReference)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Template => "template",
            Self::LiveReference => "live-reference",
        }
    }
}

/// Host lifecycle state that decides which databases may change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RuntimeMode {
    /// Editing: catalogs are mutable, live references are frozen.
    #[default]
    Authoring,
    /// Playing: catalogs are frozen, live references are mutable.
    Running,
}

// ---------------------------------------------------------------------------
// Identifier generation
// ---------------------------------------------------------------------------

/// Source of fresh identifiers.
pub trait IdentifierGenerator: Send {
    fn generate(&mut self) -> String;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdentifierGenerator for UuidGenerator {
    fn generate(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic `"{prefix}{n}"` identifiers, counting from 1.
#[derive(Debug, Clone)]
pub struct SequentialGenerator {
    prefix: String,
    next: u64,
}

impl SequentialGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialGenerator {
    fn default() -> Self {
        Self::new("id-")
    }
}

impl IdentifierGenerator for SequentialGenerator {
    fn generate(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

impl<F: FnMut() -> String + Send> IdentifierGenerator for F {
    fn generate(&mut self) -> String {
        self()
    }
}

// ---------------------------------------------------------------------------
// Catalog population
// ---------------------------------------------------------------------------

/// Which catalog entries a [`CatalogSource`] should return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// File extensions without the leading dot (`"png"`).
    pub extensions: Vec<String>,
    /// Names of built-in resources to include.
    pub builtin_names: Vec<String>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extensions.push(extension.into());
        self
    }

    pub fn with_builtin(mut self, name: impl Into<String>) -> Self {
        self.builtin_names.push(name.into());
        self
    }

    /// Whether a file path passes the extension filter (case-insensitive).
    pub fn matches_path(&self, path: &str) -> bool {
        let Some((_, extension)) = path.rsplit_once('.') else {
            return false;
        };
        self.extensions
            .iter()
            .any(|wanted| wanted.eq_ignore_ascii_case(extension))
    }

    pub fn matches_builtin(&self, name: &str) -> bool {
        self.builtin_names.iter().any(|wanted| wanted == name)
    }
}

/// Host collaborator that enumerates catalog objects.
pub trait CatalogSource {
    fn find(&self, filter: &CatalogFilter) -> Vec<ObjectHandle>;
}

/// One entry of a [`StaticCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// File path, or resource name for built-ins.
    pub path: String,
    pub builtin: bool,
    pub handle: ObjectHandle,
}

/// A fixed list of catalog entries, for tooling and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, handle: ObjectHandle) -> Self {
        self.entries.push(CatalogEntry {
            path: path.into(),
            builtin: false,
            handle,
        });
        self
    }

    pub fn with_builtin(mut self, name: impl Into<String>, handle: ObjectHandle) -> Self {
        self.entries.push(CatalogEntry {
            path: name.into(),
            builtin: true,
            handle,
        });
        self
    }
}

impl CatalogSource for StaticCatalog {
    fn find(&self, filter: &CatalogFilter) -> Vec<ObjectHandle> {
        self.entries
            .iter()
            .filter(|entry| {
                if entry.builtin {
                    filter.matches_builtin(&entry.path)
                } else {
                    filter.matches_path(&entry.path)
                }
            })
            .map(|entry| entry.handle)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// IdentifierDatabase
// ---------------------------------------------------------------------------

/// Bidirectional identifier ↔ handle store.
///
/// Every mutating operation updates both maps or neither, so
/// `by_identifier[by_handle[h]] == h` holds between calls.
pub struct IdentifierDatabase {
    kind: DatabaseKind,
    mode: RuntimeMode,
    by_identifier: HashMap<String, ObjectHandle>,
    by_handle: HashMap<ObjectHandle, String>,
    supported_types: HashSet<&'static str>,
    generator: Box<dyn IdentifierGenerator>,
    retry_limit: usize,
}

impl IdentifierDatabase {
    pub fn new(kind: DatabaseKind) -> Self {
        Self {
            kind,
            mode: RuntimeMode::default(),
            by_identifier: HashMap::new(),
            by_handle: HashMap::new(),
            supported_types: HashSet::new(),
            generator: Box::new(UuidGenerator),
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }

    pub fn with_generator(mut self, generator: impl IdentifierGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    pub fn set_generator(&mut self, generator: impl IdentifierGenerator + 'static) {
        self.generator = Box::new(generator);
    }

    pub fn set_retry_limit(&mut self, retry_limit: usize) {
        self.retry_limit = retry_limit;
    }

    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RuntimeMode) {
        self.mode = mode;
    }

    /// Whether the current mode allows mutation of this database.
    pub fn is_mutable(&self) -> bool {
        match self.kind {
            DatabaseKind::Asset | DatabaseKind::Template => self.mode == RuntimeMode::Authoring,
            DatabaseKind::LiveReference => self.mode == RuntimeMode::Running,
        }
    }

    // -- Supported types --

    pub fn add_supported_type(&mut self, type_tag: &'static str) {
        self.supported_types.insert(type_tag);
    }

    pub fn add_supported<T: EngineType>(&mut self) {
        self.add_supported_type(T::TYPE_NAME);
    }

    /// Whether handles of `type_tag` are redirected through this database.
    /// The Live-Reference database accepts every type.
    pub fn supports_type(&self, type_tag: &str) -> bool {
        !self.kind.is_catalog() || self.supported_types.contains(type_tag)
    }

    // -- Queries --

    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty()
    }

    pub fn contains_identifier(&self, identifier: &str) -> bool {
        self.by_identifier.contains_key(identifier)
    }

    pub fn contains_handle(&self, handle: &ObjectHandle) -> bool {
        self.by_handle.contains_key(handle)
    }

    pub fn try_get_handle(&self, identifier: &str) -> Option<ObjectHandle> {
        self.by_identifier.get(identifier).copied()
    }

    pub fn try_get_identifier(&self, handle: &ObjectHandle) -> Option<&str> {
        self.by_handle.get(handle).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ObjectHandle)> {
        self.by_identifier
            .iter()
            .map(|(id, handle)| (id.as_str(), *handle))
    }

    /// Check that both maps describe the same pairing.
    pub fn is_consistent(&self) -> bool {
        self.by_identifier.len() == self.by_handle.len()
            && self.by_identifier.iter().all(|(id, handle)| {
                self.by_handle.get(handle).map(String::as_str) == Some(id.as_str())
            })
    }

    // -- Mutation --

    /// Register `handle` under a freshly generated identifier.
    ///
    /// Returns `None` if the handle is already present, the database is
    /// frozen in the current mode, a catalog does not support the handle's
    /// type, or every generation attempt collided.
    pub fn try_add(&mut self, handle: ObjectHandle) -> Option<String> {
        if !self.is_mutable() {
            log::debug!(
                "{} database is frozen in {:?} mode, not adding {handle}",
                self.kind.label(),
                self.mode
            );
            return None;
        }
        if self.by_handle.contains_key(&handle) {
            return None;
        }
        if !self.supports_type(handle.type_tag) {
            log::debug!(
                "{} database does not support '{}'",
                self.kind.label(),
                handle.type_tag
            );
            return None;
        }

        for attempt in 0..=self.retry_limit {
            let identifier = self.generator.generate();
            if self.by_identifier.contains_key(&identifier) {
                log::debug!(
                    "{} identifier '{identifier}' collided (attempt {})",
                    self.kind.label(),
                    attempt + 1
                );
                continue;
            }
            self.by_identifier.insert(identifier.clone(), handle);
            self.by_handle.insert(handle, identifier.clone());
            return Some(identifier);
        }

        log::error!(
            "{} database: no free identifier for {handle} after {} attempts",
            self.kind.label(),
            self.retry_limit + 1
        );
        None
    }

    /// Bind `handle` to a known identifier, as when re-attaching a
    /// deserialized object to its saved identity.
    ///
    /// Succeeds if the pairing was inserted or already existed. Fails if
    /// either side is bound to something else or the database is frozen.
    pub fn try_insert(&mut self, identifier: &str, handle: ObjectHandle) -> bool {
        match (
            self.by_identifier.get(identifier),
            self.by_handle.get(&handle),
        ) {
            (Some(existing), _) => return *existing == handle,
            (None, Some(_)) => return false,
            (None, None) => {}
        }
        if !self.is_mutable() || !self.supports_type(handle.type_tag) {
            return false;
        }
        self.by_identifier.insert(identifier.to_owned(), handle);
        self.by_handle.insert(handle, identifier.to_owned());
        true
    }

    pub fn try_remove_identifier(&mut self, identifier: &str) -> bool {
        if !self.is_mutable() {
            return false;
        }
        match self.by_identifier.remove(identifier) {
            Some(handle) => {
                self.by_handle.remove(&handle);
                true
            }
            None => false,
        }
    }

    pub fn try_remove_handle(&mut self, handle: &ObjectHandle) -> bool {
        if !self.is_mutable() {
            return false;
        }
        match self.by_handle.remove(handle) {
            Some(identifier) => {
                self.by_identifier.remove(&identifier);
                true
            }
            None => false,
        }
    }

    /// Feed every handle `source` finds through [`try_add`](Self::try_add).
    /// Returns the number of new entries.
    pub fn populate(&mut self, source: &dyn CatalogSource, filter: &CatalogFilter) -> usize {
        let added = source
            .find(filter)
            .into_iter()
            .filter(|handle| self.try_add(*handle).is_some())
            .count();
        log::debug!("Populated {} database with {added} entries", self.kind.label());
        added
    }

    fn clear(&mut self) {
        self.by_identifier.clear();
        self.by_handle.clear();
    }
}

// ---------------------------------------------------------------------------
// DatabaseSet
// ---------------------------------------------------------------------------

/// The three identifier databases, switched between modes together.
pub struct DatabaseSet {
    pub assets: IdentifierDatabase,
    pub templates: IdentifierDatabase,
    pub live_refs: IdentifierDatabase,
    mode: RuntimeMode,
}

impl DatabaseSet {
    pub fn new() -> Self {
        Self {
            assets: IdentifierDatabase::new(DatabaseKind::Asset),
            templates: IdentifierDatabase::new(DatabaseKind::Template),
            live_refs: IdentifierDatabase::new(DatabaseKind::LiveReference),
            mode: RuntimeMode::default(),
        }
    }

    pub fn get(&self, kind: DatabaseKind) -> &IdentifierDatabase {
        match kind {
            DatabaseKind::Asset => &self.assets,
            DatabaseKind::Template => &self.templates,
            DatabaseKind::LiveReference => &self.live_refs,
        }
    }

    pub fn get_mut(&mut self, kind: DatabaseKind) -> &mut IdentifierDatabase {
        match kind {
            DatabaseKind::Asset => &mut self.assets,
            DatabaseKind::Template => &mut self.templates,
            DatabaseKind::LiveReference => &mut self.live_refs,
        }
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// Switch every database to `mode`. Leaving [`RuntimeMode::Running`]
    /// forgets all live references.
    pub fn set_mode(&mut self, mode: RuntimeMode) {
        if self.mode == RuntimeMode::Running && mode != RuntimeMode::Running {
            log::debug!(
                "Leaving running mode, dropping {} live references",
                self.live_refs.len()
            );
            self.live_refs.clear();
        }
        self.mode = mode;
        self.assets.set_mode(mode);
        self.templates.set_mode(mode);
        self.live_refs.set_mode(mode);
    }

    pub fn set_retry_limit(&mut self, retry_limit: usize) {
        self.assets.set_retry_limit(retry_limit);
        self.templates.set_retry_limit(retry_limit);
        self.live_refs.set_retry_limit(retry_limit);
    }

    /// The host destroyed `handle`; drop its live identity.
    pub fn object_destroyed(&mut self, handle: &ObjectHandle) -> bool {
        self.live_refs.try_remove_handle(handle)
    }
}

impl Default for DatabaseSet {
    fn default() -> Self {
        Self::new()
    }
}
