//! Non-fatal problems recorded during a graph walk.

use std::fmt;

use crate::error::CodecError;

/// Category of a non-fatal walk problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// No accessor, converter or database handles the value. The field is
    /// omitted on serialize and left at its prior value on deserialize.
    UnsupportedType,
    /// A stored identifier or handle has no matching database entry.
    UnresolvedReference,
    /// Identifier generation kept colliding, or an identifier is already
    /// bound to a different handle.
    IdentifierCollision,
    /// A value resolved to something other than the declared field type.
    TypeMismatch,
    /// A nested object names a type that cannot be loaded.
    StructuralCorruption,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedType => "unsupported type",
            Self::UnresolvedReference => "unresolved reference",
            Self::IdentifierCollision => "identifier collision",
            Self::TypeMismatch => "type mismatch",
            Self::StructuralCorruption => "structural corruption",
        }
    }
}

impl From<&CodecError> for IssueKind {
    fn from(err: &CodecError) -> Self {
        match err {
            CodecError::AccessorTypeMismatch { .. } | CodecError::ConverterTarget { .. } => {
                Self::TypeMismatch
            }
            _ => Self::StructuralCorruption,
        }
    }
}

/// A recorded walk problem: what went wrong and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    /// Dotted field path from the root object (`"squad.leader.weapon"`).
    pub path: String,
    pub detail: String,
}

impl Issue {
    pub fn new(kind: IssueKind, path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.kind.as_str(), self.detail)
        } else {
            write!(f, "{} at '{}': {}", self.kind.as_str(), self.path, self.detail)
        }
    }
}

/// Logs every reported issue and optionally keeps it.
#[derive(Debug, Default)]
pub(crate) struct IssueLog {
    issues: Vec<Issue>,
    record: bool,
}

impl IssueLog {
    pub(crate) fn new(record: bool) -> Self {
        Self {
            issues: Vec::new(),
            record,
        }
    }

    pub(crate) fn report(&mut self, issue: Issue) {
        match issue.kind {
            IssueKind::UnsupportedType => log::debug!("{issue}"),
            _ => log::warn!("{issue}"),
        }
        if self.record {
            self.issues.push(issue);
        }
    }

    pub(crate) fn set_recording(&mut self, record: bool) {
        self.record = record;
    }

    pub(crate) fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub(crate) fn take(&mut self) -> Vec<Issue> {
        std::mem::take(&mut self.issues)
    }
}

/// Join a dictionary path and a field name into a dotted issue path.
pub(crate) fn join_path(path: &[String], name: &str) -> String {
    let mut joined = path.join(".");
    if !name.is_empty() {
        if !joined.is_empty() {
            joined.push('.');
        }
        joined.push_str(name);
    }
    joined
}
