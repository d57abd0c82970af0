//! # Storage Layer
//!
//! Persistence is a flat key-value substrate: every slot holds one JSON
//! document (a whole collection, or the session token). The [`KeyValueStore`]
//! trait is the port the rest of the crate talks to, so the backing medium can
//! be swapped without touching catalog logic.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: one `<slot>.json` file per key under a data directory
//! - [`memory::MemoryStore`]: in-memory map, for tests
//!
//! ## Layout
//!
//! ```text
//! <data dir>/
//! ├── library_books.json
//! ├── library_authors.json
//! ├── library_stores.json
//! ├── library_inventory.json
//! ├── auth_token.json
//! └── config.json
//! ```
//!
//! On top of the port, [`collections::Collections`] reads and writes whole
//! typed collections and owns the seed fallback.

use crate::error::Result;

pub mod collections;
pub mod fs;
pub mod memory;

/// Raw slot I/O.
///
/// All methods take `&self`; implementations handle their own interior
/// mutability (the process is single-threaded for storage purposes).
pub trait KeyValueStore {
    /// Read a slot. `Ok(None)` if the slot was never written or was removed.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a slot unconditionally.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a slot. Removing a missing slot is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
