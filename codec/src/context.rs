//! Per-walk serialization state.
//!
//! A [`SerializationContext`] is created for one top-level walk (or a
//! sequence of them) and threaded through every walker, field and
//! converter call. It owns the deferred-action queue, the serialize /
//! deserialize mode flag, the current field path and the recorded issues,
//! and borrows the converter registry, type registry and databases.

use crate::converter::ConverterRegistry;
use crate::database::DatabaseSet;
use crate::error::CodecError;
use crate::issue::{Issue, IssueKind, IssueLog, join_path};
use crate::object_data::{AccessorDictionary, ObjectData};
use crate::persistable::{Persistable, TypeRegistry};
use crate::walker;

/// Direction of the current walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodecMode {
    #[default]
    Serializing,
    Deserializing,
}

type DeferredAction<'a> = Box<dyn FnOnce(&mut DeferredScope<'_>) + 'a>;

/// What a deferred action may touch when it finally runs.
pub struct DeferredScope<'s> {
    databases: &'s mut DatabaseSet,
    document: Option<&'s mut ObjectData>,
    issues: &'s mut IssueLog,
}

impl DeferredScope<'_> {
    pub fn databases(&self) -> &DatabaseSet {
        &*self.databases
    }

    pub fn databases_mut(&mut self) -> &mut DatabaseSet {
        &mut *self.databases
    }

    /// The document produced by the last serialize walk.
    pub fn document_mut(&mut self) -> Option<&mut ObjectData> {
        self.document.as_deref_mut()
    }

    /// The dictionary reached by following `path` from the document root.
    pub fn fields_at(&mut self, path: &[String]) -> Option<&mut AccessorDictionary> {
        self.document.as_deref_mut()?.fields.resolve_path_mut(path)
    }

    pub fn report(&mut self, issue: Issue) {
        self.issues.report(issue);
    }
}

/// State for serializing or deserializing one object graph.
pub struct SerializationContext<'a> {
    mode: CodecMode,
    converters: &'a ConverterRegistry,
    types: &'a TypeRegistry,
    databases: &'a mut DatabaseSet,
    deferred: Vec<DeferredAction<'a>>,
    path: Vec<String>,
    document: Option<ObjectData>,
    issues: IssueLog,
    walking: bool,
}

impl<'a> SerializationContext<'a> {
    pub fn new(
        converters: &'a ConverterRegistry,
        types: &'a TypeRegistry,
        databases: &'a mut DatabaseSet,
    ) -> Self {
        Self {
            mode: CodecMode::default(),
            converters,
            types,
            databases,
            deferred: Vec::new(),
            path: Vec::new(),
            document: None,
            issues: IssueLog::new(true),
            walking: false,
        }
    }

    /// Keep reported issues on the context (default) or only log them.
    pub fn record_issues(mut self, record: bool) -> Self {
        self.issues.set_recording(record);
        self
    }

    pub fn mode(&self) -> CodecMode {
        self.mode
    }

    /// Switch direction. Pending actions belong to the previous direction
    /// and are discarded.
    pub fn set_mode(&mut self, mode: CodecMode) {
        if mode != self.mode {
            self.discard_pending();
            self.mode = mode;
        }
    }

    /// Discard pending actions and reset the field path.
    pub fn clear(&mut self) {
        self.discard_pending();
        self.path.clear();
    }

    fn discard_pending(&mut self) {
        if !self.deferred.is_empty() {
            log::warn!("Discarding {} pending deferred actions", self.deferred.len());
            self.deferred.clear();
        }
    }

    pub fn converters(&self) -> &'a ConverterRegistry {
        self.converters
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.types
    }

    pub fn databases(&self) -> &DatabaseSet {
        &*self.databases
    }

    pub fn databases_mut(&mut self) -> &mut DatabaseSet {
        &mut *self.databases
    }

    // -- Deferred actions --

    /// Queue `action` to run at the next [`flush`](Self::flush).
    pub fn defer<F>(&mut self, action: F)
    where
        F: FnOnce(&mut DeferredScope<'_>) + 'a,
    {
        self.deferred.push(Box::new(action));
    }

    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    /// Run every queued action once, in the order they were queued, then
    /// empty the queue. Must not be called while a walk is in progress.
    pub fn flush(&mut self) -> Result<usize, CodecError> {
        if self.walking {
            return Err(CodecError::WalkInProgress);
        }
        let actions = std::mem::take(&mut self.deferred);
        let count = actions.len();
        let mut scope = DeferredScope {
            databases: &mut *self.databases,
            document: self.document.as_mut(),
            issues: &mut self.issues,
        };
        for action in actions {
            action(&mut scope);
        }
        log::debug!("Flushed {count} deferred actions");
        Ok(count)
    }

    // -- Top-level walks --

    fn begin_walk(&mut self, mode: CodecMode) -> Result<(), CodecError> {
        if self.walking {
            return Err(CodecError::WalkInProgress);
        }
        if !self.deferred.is_empty() {
            return Err(CodecError::PendingActions {
                count: self.deferred.len(),
            });
        }
        self.set_mode(mode);
        self.path.clear();
        self.walking = true;
        Ok(())
    }

    /// Walk `root` into a new document. Live-reference fields that cannot
    /// be resolved yet are filled in by the following [`flush`](Self::flush).
    pub fn serialize(&mut self, root: &dyn Persistable) -> Result<(), CodecError> {
        self.begin_walk(CodecMode::Serializing)?;
        let data = walker::serialize_object(root, self);
        self.walking = false;
        self.document = Some(data);
        Ok(())
    }

    /// Walk `data` into the existing `target`.
    pub fn deserialize(
        &mut self,
        target: &mut dyn Persistable,
        data: &ObjectData,
    ) -> Result<(), CodecError> {
        self.begin_walk(CodecMode::Deserializing)?;
        walker::deserialize_object(target, data, self);
        self.walking = false;
        Ok(())
    }

    /// Construct the type `data` names and walk `data` into it. `Ok(None)`
    /// when the type is not registered.
    pub fn instantiate(
        &mut self,
        data: &ObjectData,
    ) -> Result<Option<Box<dyn Persistable>>, CodecError> {
        self.begin_walk(CodecMode::Deserializing)?;
        let object = match self.types.construct(&data.target_type) {
            Some(mut object) => {
                walker::deserialize_object(&mut *object, data, self);
                Some(object)
            }
            None => {
                self.report(
                    IssueKind::StructuralCorruption,
                    "",
                    format!("type '{}' is not registered", data.target_type),
                );
                None
            }
        };
        self.walking = false;
        Ok(object)
    }

    // -- Nested walks --

    /// Serialize a child object stored under `name` in the current
    /// dictionary.
    pub fn serialize_child(&mut self, name: &str, object: &dyn Persistable) -> ObjectData {
        self.path.push(name.to_owned());
        let data = walker::serialize_object(object, self);
        self.path.pop();
        data
    }

    /// Deserialize a child object stored under `name` in the current
    /// dictionary.
    pub fn deserialize_child(
        &mut self,
        name: &str,
        object: &mut dyn Persistable,
        data: &ObjectData,
    ) {
        self.path.push(name.to_owned());
        walker::deserialize_object(object, data, self);
        self.path.pop();
    }

    pub(crate) fn push_path(&mut self, name: &str) {
        self.path.push(name.to_owned());
    }

    pub(crate) fn pop_path(&mut self) {
        self.path.pop();
    }

    /// Field names leading from the root to the dictionary being written.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Dotted path of field `name` in the current dictionary.
    pub fn field_path(&self, name: &str) -> String {
        join_path(&self.path, name)
    }

    // -- Issues and output --

    pub fn report(&mut self, kind: IssueKind, name: &str, detail: impl Into<String>) {
        let path = self.field_path(name);
        self.issues.report(Issue::new(kind, path, detail));
    }

    pub fn issues(&self) -> &[Issue] {
        self.issues.issues()
    }

    pub fn take_issues(&mut self) -> Vec<Issue> {
        self.issues.take()
    }

    pub fn document(&self) -> Option<&ObjectData> {
        self.document.as_ref()
    }

    pub fn take_document(&mut self) -> Option<ObjectData> {
        self.document.take()
    }
}
