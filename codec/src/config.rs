//! Codec settings, loaded from TOML.
//!
//! ```toml
//! identifier_retry_limit = 32
//! default_format = "bincode"
//! record_issues = false
//! ```
//!
//! Missing keys take their defaults; unknown keys are rejected.

use objgraph_store::Store;
use serde::{Deserialize, Serialize};

use crate::database::{DEFAULT_RETRY_LIMIT, DatabaseSet};
use crate::error::CodecError;
use crate::format::Format;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecSettings {
    /// Identifier re-rolls allowed after a collision.
    pub identifier_retry_limit: usize,
    /// Format used by the archive helpers on [`Codec`](crate::Codec).
    pub default_format: Format,
    /// Keep issues on the context in addition to logging them.
    pub record_issues: bool,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            identifier_retry_limit: DEFAULT_RETRY_LIMIT,
            default_format: Format::default(),
            record_issues: true,
        }
    }
}

impl CodecSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, CodecError> {
        Ok(toml::from_str(text)?)
    }

    /// Read settings stored under `name`.
    pub fn load(store: &dyn Store, name: &str) -> Result<Self, CodecError> {
        let bytes = store.read(name)?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| CodecError::Format(format!("settings '{name}': {e}")))?;
        let settings = Self::from_toml_str(text)?;
        log::debug!("Loaded codec settings from '{name}'");
        Ok(settings)
    }

    /// Apply database-related settings.
    pub fn apply(&self, databases: &mut DatabaseSet) {
        databases.set_retry_limit(self.identifier_retry_limit);
    }
}

#[cfg(test)]
mod tests {
    use objgraph_store::MemoryStore;

    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        assert_eq!(CodecSettings::from_toml_str("").unwrap(), CodecSettings::default());
    }

    #[cfg(feature = "serialize-bincode")]
    #[test]
    fn explicit_values() {
        let settings = CodecSettings::from_toml_str(
            "identifier_retry_limit = 3\ndefault_format = \"bincode\"\nrecord_issues = false\n",
        )
        .unwrap();
        assert_eq!(settings.identifier_retry_limit, 3);
        assert_eq!(settings.default_format, Format::Bincode);
        assert!(!settings.record_issues);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = CodecSettings::from_toml_str("retries = 3");
        assert!(matches!(result, Err(CodecError::Settings(_))));
    }

    #[test]
    fn load_from_store() {
        let store = MemoryStore::new();
        store.insert("codec.toml", b"identifier_retry_limit = 1".to_vec());
        let settings = CodecSettings::load(&store, "codec.toml").unwrap();
        assert_eq!(settings.identifier_retry_limit, 1);

        assert!(matches!(
            CodecSettings::load(&store, "missing.toml"),
            Err(CodecError::Store(_))
        ));
    }
}
