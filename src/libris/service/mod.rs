//! # Service Layer
//!
//! [`CatalogService`] is the one operation set every backend implements:
//! generic CRUD over the four [`Record`] types, the inventory-specific
//! queries, the grouped startup snapshot, and authentication.
//!
//! - [`mock::MockService`]: collections in a [`KeyValueStore`](crate::store::KeyValueStore),
//!   seeded on first use, with simulated latency
//! - [`http::HttpService`]: the same operations against a real backend
//!
//! Ids are assigned here and nowhere else.

use crate::error::Result;
use crate::model::{Ack, Catalog, Id, InventoryItem, LoginGrant, Record, User};

pub mod http;
pub mod mock;

pub trait CatalogService {
    fn list<T: Record>(&self) -> Result<Vec<T>>;

    /// `NotFound` if no record has this id.
    fn get<T: Record>(&self, id: Id) -> Result<T>;

    /// Assigns `max(id) + 1` (or 1), appends and persists.
    fn create<T: Record>(&self, draft: T::Draft) -> Result<T>;

    /// Shallow merge. `NotFound` leaves the collection unchanged.
    fn update<T: Record>(&self, id: Id, patch: T::Patch) -> Result<T>;

    /// `NotFound` leaves the collection unchanged.
    fn delete<T: Record>(&self, id: Id) -> Result<Ack>;

    fn inventory_by_store(&self, store_id: Id) -> Result<Vec<InventoryItem>>;

    /// Removes every item for the pair. `NotFound` if none matched.
    fn delete_inventory_by_store_and_book(&self, store_id: Id, book_id: Id) -> Result<Ack>;

    /// All four collections at once, for startup.
    fn snapshot(&self) -> Result<Catalog>;

    fn login(&self, email: &str, password: &str) -> Result<LoginGrant>;

    fn logout(&self) -> Result<Ack>;

    fn current_user(&self, token: &str) -> Result<User>;
}
