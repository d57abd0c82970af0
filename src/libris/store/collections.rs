//! Typed collection persistence over a [`KeyValueStore`].
//!
//! Each collection lives whole in one slot and is rewritten whole on every
//! save. A missing slot is filled from the seed source on first read.

use super::KeyValueStore;
use crate::error::{LibrisError, Result};
use crate::model::{Author, Book, Catalog, EntityKind, InventoryItem, Record, Store};
use crate::seed::SeedFetcher;
use serde_json::Value;
use std::thread;
use tracing::{debug, info};

pub struct Collections<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> Collections<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// The cached collection, if its slot exists. Corrupt JSON is an error.
    pub fn cached<T: Record>(&self) -> Result<Option<Vec<T>>> {
        match self.kv.get(&T::KIND.slot())? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Load a collection, falling back to its seed (and caching it) on a miss.
    pub fn load<T: Record>(&self, seeds: &dyn SeedFetcher) -> Result<Vec<T>> {
        if let Some(items) = self.cached::<T>()? {
            return Ok(items);
        }
        debug!(location = %seeds.location(T::KIND), "seeding {}", T::KIND);
        let items: Vec<T> = into_collection(seeds.fetch(T::KIND)?)?;
        self.save(&items)?;
        Ok(items)
    }

    fn cached_or_empty<T: Record>(&self) -> Result<Vec<T>> {
        Ok(self.cached::<T>()?.unwrap_or_default())
    }

    pub fn save<T: Record>(&self, items: &[T]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.kv.set(&T::KIND.slot(), &raw)
    }

    /// Load all four collections as a group.
    ///
    /// When every slot is cached the seeds are never touched. When any slot is
    /// missing, all four seeds are fetched concurrently and all four slots are
    /// rewritten.
    /// Presence alone decides: a corrupt slot only fails the load when no
    /// slot is missing.
    pub fn load_all(&self, seeds: &dyn SeedFetcher) -> Result<Catalog> {
        let mut complete = true;
        for kind in EntityKind::ALL {
            if self.kv.get(&kind.slot())?.is_none() {
                complete = false;
                break;
            }
        }
        if complete {
            debug!("catalog loaded from cache");
            return Ok(Catalog {
                books: self.cached_or_empty()?,
                authors: self.cached_or_empty()?,
                stores: self.cached_or_empty()?,
                inventory: self.cached_or_empty()?,
            });
        }

        info!("catalog cache incomplete, fetching seeds");
        let [books, authors, stores, inventory] = fetch_all(seeds)?;
        let catalog = Catalog {
            books: into_collection(books)?,
            authors: into_collection(authors)?,
            stores: into_collection(stores)?,
            inventory: into_collection(inventory)?,
        };
        self.save(&catalog.books)?;
        self.save(&catalog.authors)?;
        self.save(&catalog.stores)?;
        self.save(&catalog.inventory)?;
        Ok(catalog)
    }
}

/// Start all four seed fetches before joining any of them.
fn fetch_all(seeds: &dyn SeedFetcher) -> Result<[Value; 4]> {
    let results: Vec<Result<Value>> = thread::scope(|scope| {
        let handles: Vec<_> = EntityKind::ALL
            .iter()
            .map(|&kind| scope.spawn(move || seeds.fetch(kind)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(LibrisError::Network("seed fetch panicked".into())))
            })
            .collect()
    });

    let values = results.into_iter().collect::<Result<Vec<Value>>>()?;
    values
        .try_into()
        .map_err(|_| LibrisError::Store("expected four seed documents".into()))
}

/// A JSON array of records, or a single record coerced into one.
pub fn into_collection<T: Record>(value: Value) -> Result<Vec<T>> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}
