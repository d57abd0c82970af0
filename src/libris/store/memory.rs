use super::KeyValueStore;
use crate::error::{LibrisError, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// In-memory key-value store for testing.
///
/// Uses `RefCell` since storage access is single-threaded; this keeps the
/// `KeyValueStore` trait on `&self` without locking.
#[derive(Default)]
pub struct MemoryStore {
    slots: RefCell<HashMap<String, String>>,
    writes: Cell<usize>,
    simulate_write_error: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.slots.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(LibrisError::Store("Simulated write error".to_string()));
        }
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_slot_reads_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").unwrap(), None);
    }

    #[test]
    fn set_overwrites_and_remove_clears() {
        let store = MemoryStore::new();
        store.set("k", "1").unwrap();
        store.set("k", "2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("2"));
        assert_eq!(store.write_count(), 2);

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn simulated_write_error_leaves_slot_untouched() {
        let store = MemoryStore::new();
        store.set("k", "before").unwrap();
        store.set_simulate_write_error(true);

        let err = store.set("k", "after").unwrap_err();
        assert!(matches!(err, LibrisError::Store(_)));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("before"));
    }
}
