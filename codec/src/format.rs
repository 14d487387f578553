//! Format-specific encoding and decoding (feature-gated).
//!
//! Provides [`encode`] and [`decode`] functions that convert between
//! serde-serializable types and byte buffers in RON or bincode format.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

#[cfg(not(any(feature = "serialize-ron", feature = "serialize-bincode")))]
compile_error!("enable at least one of the `serialize-ron` or `serialize-bincode` features");

/// Supported serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// RON (Rusty Object Notation) — human-readable text format.
    #[cfg(feature = "serialize-ron")]
    Ron,
    /// Bincode — compact binary format.
    #[cfg(feature = "serialize-bincode")]
    Bincode,
}

impl Format {
    /// File extension used by the archive for this format.
    pub fn extension(self) -> &'static str {
        match self {
            #[cfg(feature = "serialize-ron")]
            Self::Ron => "ron",
            #[cfg(feature = "serialize-bincode")]
            Self::Bincode => "bin",
        }
    }
}

impl Default for Format {
    #[cfg(feature = "serialize-ron")]
    fn default() -> Self {
        Self::Ron
    }

    #[cfg(not(feature = "serialize-ron"))]
    fn default() -> Self {
        Self::Bincode
    }
}

/// Encode a serde-serializable value to bytes in the given format.
pub fn encode<T: Serialize>(value: &T, format: Format) -> Result<Vec<u8>, CodecError> {
    match format {
        #[cfg(feature = "serialize-ron")]
        Format::Ron => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
            .map(String::into_bytes)
            .map_err(|e| CodecError::Format(e.to_string())),
        #[cfg(feature = "serialize-bincode")]
        Format::Bincode => {
            bincode::serialize(value).map_err(|e| CodecError::Format(e.to_string()))
        }
    }
}

/// Decode bytes in the given format to a serde-deserializable type.
pub fn decode<T: serde::de::DeserializeOwned>(
    bytes: &[u8],
    format: Format,
) -> Result<T, CodecError> {
    match format {
        #[cfg(feature = "serialize-ron")]
        Format::Ron => {
            let s = std::str::from_utf8(bytes).map_err(|e| CodecError::Format(e.to_string()))?;
            ron::from_str(s).map_err(|e| CodecError::Format(e.to_string()))
        }
        #[cfg(feature = "serialize-bincode")]
        Format::Bincode => {
            bincode::deserialize(bytes).map_err(|e| CodecError::Format(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::object_data::{ObjectData, ReferenceData};
    use crate::value::Value;

    fn sample() -> ObjectData {
        let mut weapon = ObjectData::new("game::Weapon");
        weapon.fields.set("damage", 12_i32);
        weapon.fields.set("tags", vec![String::from("sharp"), String::from("heavy")]);

        let mut player = ObjectData::new("game::Player");
        player.reference = Some(ReferenceData {
            identifier: "5f1c".into(),
            type_tag: "Player".into(),
        });
        player.fields.set("position", Vec3::new(1.0, 2.0, 3.0));
        player.fields.set("rotation", Quat::IDENTITY);
        player.fields.set("alive", true);
        player.fields.set("weapon", weapon);
        player.fields.insert("score", Value::U64(u64::MAX));
        player
    }

    #[cfg(feature = "serialize-ron")]
    #[test]
    fn ron_document() {
        let bytes = encode(&sample(), Format::Ron).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.contains("game::Player"));
        let decoded: ObjectData = decode(&bytes, Format::Ron).unwrap();
        assert_eq!(decoded, sample());
        assert_eq!(
            decoded.fields.keys().collect::<Vec<_>>(),
            vec!["position", "rotation", "alive", "weapon", "score"]
        );
    }

    #[cfg(feature = "serialize-bincode")]
    #[test]
    fn bincode_document() {
        let bytes = encode(&sample(), Format::Bincode).unwrap();
        let decoded: ObjectData = decode(&bytes, Format::Bincode).unwrap();
        assert_eq!(decoded, sample());
    }

    #[cfg(feature = "serialize-ron")]
    #[test]
    fn garbage_is_a_format_error() {
        let result: Result<ObjectData, _> = decode(b"not ron at all (", Format::Ron);
        assert!(matches!(result, Err(CodecError::Format(_))));
    }

    #[test]
    fn extensions() {
        #[cfg(feature = "serialize-ron")]
        assert_eq!(Format::Ron.extension(), "ron");
        #[cfg(feature = "serialize-bincode")]
        assert_eq!(Format::Bincode.extension(), "bin");
    }
}
