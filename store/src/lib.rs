//! Named byte-stream persistence for serialized object graphs.
//!
//! The codec never touches files directly. It hands encoded documents to a
//! [`Store`], which maps a normalized name (`"saves/slot_1.ron"`) to a blob
//! of bytes.
//!
//! # Stores
//!
//! - [`MemoryStore`] — In-memory storage for tests and embedded catalogs (read-write)
//! - [`FileSystemStore`] — Native filesystem storage rooted at a directory (read-write)
//!
//! Custom stores implement the [`Store`] trait. Write operations are optional
//! and default to returning [`StoreError::ReadOnly`].

mod error;
#[cfg(all(feature = "filesystem", not(target_arch = "wasm32")))]
mod filesystem;
mod memory;
pub mod path;
mod store;

pub use error::StoreError;
#[cfg(all(feature = "filesystem", not(target_arch = "wasm32")))]
pub use filesystem::FileSystemStore;
pub use memory::MemoryStore;
pub use store::Store;
