use super::CatalogService;
use crate::auth::token::{authenticate, decode_token, find_user, issue_token};
use crate::error::{LibrisError, Result};
use crate::model::{next_id, Ack, Catalog, Id, InventoryItem, LoginGrant, Record, User};
use crate::seed::{BundledSeeds, SeedFetcher};
use crate::store::collections::Collections;
use crate::store::KeyValueStore;
use chrono::Utc;
use std::thread;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_LATENCY: Duration = Duration::from_millis(300);

/// In-process backend: collections live in a key-value store, ids are
/// `max + 1`, and every call pays a fixed simulated round trip.
pub struct MockService<S: KeyValueStore> {
    collections: Collections<S>,
    seeds: Box<dyn SeedFetcher>,
    latency: Duration,
}

impl<S: KeyValueStore> MockService<S> {
    pub fn new(kv: S) -> Self {
        Self {
            collections: Collections::new(kv),
            seeds: Box::new(BundledSeeds),
            latency: DEFAULT_LATENCY,
        }
    }

    pub fn with_seeds(mut self, seeds: Box<dyn SeedFetcher>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn collections(&self) -> &Collections<S> {
        &self.collections
    }

    /// Hand back an outcome after the simulated round trip, whether it
    /// succeeded or not.
    fn respond<T>(&self, op: &str, outcome: Result<T>) -> Result<T> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        match &outcome {
            Ok(_) => debug!(op, "mock ok"),
            Err(e) => debug!(op, error = %e, "mock error"),
        }
        outcome
    }

    fn load<T: Record>(&self) -> Result<Vec<T>> {
        self.collections.load(self.seeds.as_ref())
    }

    fn get_inner<T: Record>(&self, id: Id) -> Result<T> {
        self.load::<T>()?
            .into_iter()
            .find(|item| item.id() == id)
            .ok_or(LibrisError::NotFound(T::KIND))
    }

    fn create_inner<T: Record>(&self, draft: T::Draft) -> Result<T> {
        let mut items = self.load::<T>()?;
        let created = T::from_draft(next_id(&items)?, draft);
        items.push(created.clone());
        self.collections.save(&items)?;
        Ok(created)
    }

    fn update_inner<T: Record>(&self, id: Id, patch: T::Patch) -> Result<T> {
        let mut items = self.load::<T>()?;
        let item = items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or(LibrisError::NotFound(T::KIND))?;
        item.apply(patch);
        let updated = item.clone();
        self.collections.save(&items)?;
        Ok(updated)
    }

    fn delete_inner<T: Record>(&self, id: Id) -> Result<Ack> {
        let items = self.load::<T>()?;
        let before = items.len();
        let kept: Vec<T> = items.into_iter().filter(|item| item.id() != id).collect();
        if kept.len() == before {
            return Err(LibrisError::NotFound(T::KIND));
        }
        self.collections.save(&kept)?;
        Ok(Ack::ok())
    }

    fn delete_pair_inner(&self, store_id: Id, book_id: Id) -> Result<Ack> {
        let items = self.load::<InventoryItem>()?;
        let before = items.len();
        let kept: Vec<InventoryItem> = items
            .into_iter()
            .filter(|item| !(item.store_id == store_id && item.book_id == book_id))
            .collect();
        if kept.len() == before {
            return Err(LibrisError::NotFound(InventoryItem::KIND));
        }
        self.collections.save(&kept)?;
        Ok(Ack::ok())
    }

    fn current_user_inner(&self, token: &str) -> Result<User> {
        let claims = decode_token(token)?;
        find_user(claims.user_id)
            .cloned()
            .ok_or(LibrisError::InvalidToken)
    }
}

impl<S: KeyValueStore> CatalogService for MockService<S> {
    fn list<T: Record>(&self) -> Result<Vec<T>> {
        self.respond("list", self.load())
    }

    fn get<T: Record>(&self, id: Id) -> Result<T> {
        self.respond("get", self.get_inner(id))
    }

    fn create<T: Record>(&self, draft: T::Draft) -> Result<T> {
        self.respond("create", self.create_inner(draft))
    }

    fn update<T: Record>(&self, id: Id, patch: T::Patch) -> Result<T> {
        self.respond("update", self.update_inner(id, patch))
    }

    fn delete<T: Record>(&self, id: Id) -> Result<Ack> {
        self.respond("delete", self.delete_inner::<T>(id))
    }

    fn inventory_by_store(&self, store_id: Id) -> Result<Vec<InventoryItem>> {
        let outcome = self.load::<InventoryItem>().map(|items| {
            items
                .into_iter()
                .filter(|item| item.store_id == store_id)
                .collect()
        });
        self.respond("inventory_by_store", outcome)
    }

    fn delete_inventory_by_store_and_book(&self, store_id: Id, book_id: Id) -> Result<Ack> {
        self.respond(
            "delete_inventory_by_store_and_book",
            self.delete_pair_inner(store_id, book_id),
        )
    }

    fn snapshot(&self) -> Result<Catalog> {
        self.respond("snapshot", self.collections.load_all(self.seeds.as_ref()))
    }

    fn login(&self, email: &str, password: &str) -> Result<LoginGrant> {
        let outcome = authenticate(email, password)
            .map(|user| LoginGrant {
                user: user.clone(),
                token: issue_token(user.id, Utc::now()),
            })
            .ok_or(LibrisError::InvalidCredentials);
        self.respond("login", outcome)
    }

    fn logout(&self) -> Result<Ack> {
        self.respond("logout", Ok(Ack::ok()))
    }

    fn current_user(&self, token: &str) -> Result<User> {
        self.respond("current_user", self.current_user_inner(token))
    }
}

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{Author, Book, InventoryItem, Store};
    use crate::store::memory::MemoryStore;

    /// A zero-latency mock over an in-memory store with every collection
    /// present and empty, so nothing is seeded.
    pub fn empty_service() -> MockService<MemoryStore> {
        let service = MockService::new(MemoryStore::new()).with_latency(Duration::ZERO);
        let collections = service.collections();
        collections.save::<Book>(&[]).unwrap();
        collections.save::<Author>(&[]).unwrap();
        collections.save::<Store>(&[]).unwrap();
        collections.save::<InventoryItem>(&[]).unwrap();
        service
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::empty_service;
    use super::*;
    use crate::model::{
        Author, AuthorPatch, Book, BookPatch, EntityKind, NewAuthor, NewBook,
        NewInventoryItem, NewStore, Store,
    };
    use crate::store::memory::MemoryStore;
    use std::time::Instant;

    fn author(first: &str, last: &str) -> NewAuthor {
        NewAuthor {
            first_name: first.into(),
            last_name: last.into(),
        }
    }

    fn item(store_id: Id, book_id: Id, price: f64) -> NewInventoryItem {
        NewInventoryItem {
            store_id,
            book_id,
            price,
        }
    }

    #[test]
    fn create_assigns_one_on_empty_collection() {
        let service = empty_service();
        let created: Author = service.create(author("Ada", "Lovelace")).unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(service.list::<Author>().unwrap(), vec![created]);
    }

    #[test]
    fn create_never_reuses_ids_below_the_max() {
        let service = empty_service();
        for name in ["A", "B", "C"] {
            service.create::<Author>(author(name, "")).unwrap();
        }
        service.delete::<Author>(2).unwrap();

        let created: Author = service.create(author("D", "")).unwrap();
        assert_eq!(created.id, 4);
    }

    #[test]
    fn update_merges_only_present_fields() {
        let service = empty_service();
        service
            .create::<Book>(NewBook {
                author_id: 1,
                name: "Notes".into(),
                page_count: 50,
            })
            .unwrap();

        let updated: Book = service
            .update(
                1,
                BookPatch {
                    name: Some("Sketch of the Analytical Engine".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Sketch of the Analytical Engine");
        assert_eq!(updated.page_count, 50);
        assert_eq!(service.get::<Book>(1).unwrap(), updated);
    }

    #[test]
    fn update_missing_id_leaves_collection_unchanged() {
        let service = empty_service();
        service.create::<Author>(author("Ada", "Lovelace")).unwrap();
        let before = service.list::<Author>().unwrap();

        let err = service
            .update::<Author>(
                9,
                AuthorPatch {
                    first_name: Some("X".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, LibrisError::NotFound(EntityKind::Author)));
        assert_eq!(service.list::<Author>().unwrap(), before);
    }

    #[test]
    fn delete_removes_exactly_one() {
        let service = empty_service();
        service.create::<Author>(author("A", "")).unwrap();
        service.create::<Author>(author("B", "")).unwrap();

        assert_eq!(service.delete::<Author>(1).unwrap(), Ack::ok());
        let remaining = service.list::<Author>().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].first_name, "B");
    }

    #[test]
    fn delete_missing_id_keeps_length() {
        let service = empty_service();
        service.create::<Author>(author("A", "")).unwrap();

        let err = service.delete::<Store>(1).unwrap_err();
        assert!(matches!(err, LibrisError::NotFound(EntityKind::Store)));
        let err = service.delete::<Author>(5).unwrap_err();
        assert!(matches!(err, LibrisError::NotFound(EntityKind::Author)));
        assert_eq!(service.list::<Author>().unwrap().len(), 1);
    }

    #[test]
    fn get_missing_is_not_found() {
        let service = empty_service();
        assert!(matches!(
            service.get::<InventoryItem>(1),
            Err(LibrisError::NotFound(EntityKind::InventoryItem))
        ));
    }

    #[test]
    fn inventory_by_store_filters() {
        let service = empty_service();
        service.create::<InventoryItem>(item(1, 1, 9.99)).unwrap();
        service.create::<InventoryItem>(item(2, 1, 8.0)).unwrap();
        service.create::<InventoryItem>(item(1, 2, 5.0)).unwrap();

        let store_one = service.inventory_by_store(1).unwrap();
        assert_eq!(
            store_one.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(service.inventory_by_store(3).unwrap().is_empty());
    }

    #[test]
    fn delete_by_store_and_book_removes_all_duplicates() {
        let service = empty_service();
        service.create::<InventoryItem>(item(1, 1, 9.99)).unwrap();
        service.create::<InventoryItem>(item(1, 1, 7.50)).unwrap();
        service.create::<InventoryItem>(item(1, 2, 5.0)).unwrap();

        service.delete_inventory_by_store_and_book(1, 1).unwrap();
        let left = service.list::<InventoryItem>().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].book_id, 2);

        assert!(matches!(
            service.delete_inventory_by_store_and_book(1, 1),
            Err(LibrisError::NotFound(EntityKind::InventoryItem))
        ));
    }

    #[test]
    fn mutations_persist_whole_collection() {
        let service = empty_service();
        service
            .create::<Store>(NewStore {
                name: "Shop A".into(),
                address_1: "1 Main St".into(),
                address_2: None,
                city: "Athens".into(),
                state: "GA".into(),
                zip: "30605".into(),
            })
            .unwrap();

        let raw = service
            .collections()
            .kv()
            .get("library_stores")
            .unwrap()
            .unwrap();
        let stored: Vec<Store> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Shop A");
    }

    #[test]
    fn first_use_seeds_from_bundled_data() {
        let service = MockService::new(MemoryStore::new()).with_latency(Duration::ZERO);
        let books = service.list::<Book>().unwrap();
        assert!(!books.is_empty());
        assert!(service
            .collections()
            .kv()
            .get("library_books")
            .unwrap()
            .is_some());
    }

    #[test]
    fn login_then_current_user_round_trip() {
        let service = empty_service();
        let grant = service.login("admin@library.com", "admin123").unwrap();
        assert_eq!(grant.user.email, "admin@library.com");

        let user = service.current_user(&grant.token).unwrap();
        assert_eq!(user, grant.user);

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let service = empty_service();
        assert!(matches!(
            service.login("admin@library.com", "nope"),
            Err(LibrisError::InvalidCredentials)
        ));
    }

    #[test]
    fn token_for_unknown_user_is_invalid() {
        let service = empty_service();
        let forged = issue_token(42, Utc::now());
        assert!(matches!(
            service.current_user(&forged),
            Err(LibrisError::InvalidToken)
        ));
        assert!(matches!(
            service.current_user("%%%"),
            Err(LibrisError::InvalidToken)
        ));
    }

    #[test]
    fn logout_always_succeeds() {
        let service = empty_service();
        assert_eq!(service.logout().unwrap(), Ack::ok());
    }

    #[test]
    fn latency_applies_to_error_paths_too() {
        let service = empty_service().with_latency(Duration::from_millis(30));
        let started = Instant::now();
        assert!(service.get::<Book>(99).is_err());
        assert!(started.elapsed() >= Duration::from_millis(30));

        let started = Instant::now();
        assert!(service.login("x", "y").is_err());
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn storage_failure_surfaces_as_error() {
        let service = empty_service();
        service.collections().kv().set_simulate_write_error(true);
        let err = service.create::<Author>(author("A", "B")).unwrap_err();
        assert!(matches!(err, LibrisError::Store(_)));
    }
}
