//! Persisting serialized documents in a [`Store`].
//!
//! A document saved under identifier `slot` in format `Ron` lands in the
//! blob `slot.ron`. [`save`] and [`load`] log failures and degrade to
//! `false` / `None`; [`try_save`] and [`try_load`] return the error.

use objgraph_store::Store;

use crate::error::CodecError;
use crate::format::{self, Format};
use crate::object_data::ObjectData;

/// Blob name of the document `identifier` in `format`.
pub fn blob_name(identifier: &str, format: Format) -> String {
    format!("{identifier}.{}", format.extension())
}

pub fn try_save(
    store: &dyn Store,
    identifier: &str,
    document: &ObjectData,
    format: Format,
) -> Result<(), CodecError> {
    let bytes = format::encode(document, format)?;
    let name = blob_name(identifier, format);
    store.write(&name, bytes)?;
    log::debug!("Saved '{}' to '{name}'", document.target_type);
    Ok(())
}

pub fn try_load(
    store: &dyn Store,
    identifier: &str,
    format: Format,
) -> Result<ObjectData, CodecError> {
    let bytes = store.read(&blob_name(identifier, format))?;
    format::decode(&bytes, format)
}

pub fn save(store: &dyn Store, identifier: &str, document: &ObjectData, format: Format) -> bool {
    match try_save(store, identifier, document, format) {
        Ok(()) => true,
        Err(err) => {
            log::error!("Failed to save '{identifier}': {err}");
            false
        }
    }
}

pub fn load(store: &dyn Store, identifier: &str, format: Format) -> Option<ObjectData> {
    match try_load(store, identifier, format) {
        Ok(document) => Some(document),
        Err(err) => {
            log::error!("Failed to load '{identifier}': {err}");
            None
        }
    }
}
