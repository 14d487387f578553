//! Hard errors raised by the codec.
//!
//! Data problems encountered during a graph walk are never errors; they are
//! recorded as [`Issue`](crate::Issue)s. A [`CodecError`] means the calling
//! code broke an invariant (wrong accessor type, overlapping walks) or an
//! encoding/persistence step failed.

use objgraph_store::StoreError;

/// Errors returned by codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An accessor was read or written with a type it cannot hold.
    #[error("accessor holding '{found}' cannot be used as '{expected}'")]
    AccessorTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A converter was handed a value of a type it does not convert.
    #[error("converter '{converter}' received a value it cannot convert")]
    ConverterTarget { converter: &'static str },

    /// A converter expected a field that the input does not contain.
    #[error("missing field '{0}'")]
    MissingField(String),

    /// A top-level walk was started (or the queue flushed) while another
    /// walk on the same context is still running.
    #[error("a graph walk is already in progress on this context")]
    WalkInProgress,

    /// A top-level walk was started while deferred actions of the previous
    /// walk are still pending.
    #[error("{count} deferred actions are still pending; flush before starting a new walk")]
    PendingActions { count: usize },

    /// The context holds no serialized document.
    #[error("no serialized document is available")]
    NoDocument,

    /// Format encoding or decoding failed (RON/bincode).
    #[error("format error: {0}")]
    Format(String),

    /// Settings could not be parsed.
    #[error("invalid settings: {0}")]
    Settings(#[from] toml::de::Error),

    /// The persistence store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = CodecError::AccessorTypeMismatch {
            expected: "i32",
            found: "string",
        };
        assert_eq!(
            err.to_string(),
            "accessor holding 'string' cannot be used as 'i32'"
        );
        assert_eq!(
            CodecError::PendingActions { count: 3 }.to_string(),
            "3 deferred actions are still pending; flush before starting a new walk"
        );
    }

    #[test]
    fn store_errors_convert() {
        let err: CodecError = StoreError::NotFound("slot.ron".into()).into();
        assert!(matches!(err, CodecError::Store(StoreError::NotFound(_))));
    }
}
