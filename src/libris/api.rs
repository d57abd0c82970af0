//! # API Facade
//!
//! The API layer is a **thin facade** over a [`CatalogService`]. It is the single
//! entry point for every catalog and auth operation, whichever backend is in use.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Names** the operation set per entity (`create_book`, `inventory_by_store`, ...)
//! - **Dispatches** to the backend chosen at startup
//! - **Returns structured types** (`Result<T>`)
//!
//! It does no business logic (that belongs to the service) and no presentation.
//!
//! ## Backend Selection
//!
//! `CatalogApi<B: CatalogService>` is generic over the backend:
//! - Production: `CatalogApi<Backend>`, where [`Backend`] is picked once from
//!   [`ApiMode`]: the mock service over a file store, or the HTTP service
//! - Testing: `CatalogApi<MockService<MemoryStore>>`
//!
//! Both backends return the same types, so callers never know which one answered.

use crate::config::{ApiMode, LibrisConfig};
use crate::error::Result;
use crate::model::{
    Ack, Author, AuthorPatch, Book, BookPatch, Catalog, Id, InventoryItem, InventoryPatch,
    LoginGrant, NewAuthor, NewBook, NewInventoryItem, NewStore, Record, Store, StorePatch, User,
};
use crate::seed;
use crate::service::http::HttpService;
use crate::service::mock::MockService;
use crate::service::CatalogService;
use crate::store::fs::FileStore;
use std::path::Path;
use tracing::info;

pub struct CatalogApi<B: CatalogService> {
    backend: B,
}

impl<B: CatalogService> CatalogApi<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // --- Books ---

    pub fn list_books(&self) -> Result<Vec<Book>> {
        self.backend.list()
    }

    pub fn get_book(&self, id: Id) -> Result<Book> {
        self.backend.get(id)
    }

    pub fn create_book(&self, book: NewBook) -> Result<Book> {
        self.backend.create::<Book>(book)
    }

    pub fn update_book(&self, id: Id, patch: BookPatch) -> Result<Book> {
        self.backend.update::<Book>(id, patch)
    }

    pub fn delete_book(&self, id: Id) -> Result<Ack> {
        self.backend.delete::<Book>(id)
    }

    // --- Authors ---

    pub fn list_authors(&self) -> Result<Vec<Author>> {
        self.backend.list()
    }

    pub fn get_author(&self, id: Id) -> Result<Author> {
        self.backend.get(id)
    }

    pub fn create_author(&self, author: NewAuthor) -> Result<Author> {
        self.backend.create::<Author>(author)
    }

    pub fn update_author(&self, id: Id, patch: AuthorPatch) -> Result<Author> {
        self.backend.update::<Author>(id, patch)
    }

    pub fn delete_author(&self, id: Id) -> Result<Ack> {
        self.backend.delete::<Author>(id)
    }

    // --- Stores ---

    pub fn list_stores(&self) -> Result<Vec<Store>> {
        self.backend.list()
    }

    pub fn get_store(&self, id: Id) -> Result<Store> {
        self.backend.get(id)
    }

    pub fn create_store(&self, store: NewStore) -> Result<Store> {
        self.backend.create::<Store>(store)
    }

    pub fn update_store(&self, id: Id, patch: StorePatch) -> Result<Store> {
        self.backend.update::<Store>(id, patch)
    }

    pub fn delete_store(&self, id: Id) -> Result<Ack> {
        self.backend.delete::<Store>(id)
    }

    // --- Inventory ---

    pub fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        self.backend.list()
    }

    pub fn get_inventory_item(&self, id: Id) -> Result<InventoryItem> {
        self.backend.get(id)
    }

    pub fn inventory_by_store(&self, store_id: Id) -> Result<Vec<InventoryItem>> {
        self.backend.inventory_by_store(store_id)
    }

    pub fn create_inventory_item(&self, item: NewInventoryItem) -> Result<InventoryItem> {
        self.backend.create::<InventoryItem>(item)
    }

    pub fn update_inventory_item(&self, id: Id, patch: InventoryPatch) -> Result<InventoryItem> {
        self.backend.update::<InventoryItem>(id, patch)
    }

    pub fn delete_inventory_item(&self, id: Id) -> Result<Ack> {
        self.backend.delete::<InventoryItem>(id)
    }

    pub fn delete_inventory_by_store_and_book(&self, store_id: Id, book_id: Id) -> Result<Ack> {
        self.backend
            .delete_inventory_by_store_and_book(store_id, book_id)
    }

    // --- Bulk ---

    pub fn snapshot(&self) -> Result<Catalog> {
        self.backend.snapshot()
    }

    // --- Auth ---

    pub fn login(&self, email: &str, password: &str) -> Result<LoginGrant> {
        self.backend.login(email, password)
    }

    pub fn logout(&self) -> Result<Ack> {
        self.backend.logout()
    }

    pub fn current_user(&self, token: &str) -> Result<User> {
        self.backend.current_user(token)
    }
}

/// The backend picked at startup.
pub enum Backend {
    Mock(MockService<FileStore>),
    Http(HttpService),
}

impl Backend {
    pub fn from_config(config: &LibrisConfig, data_dir: &Path) -> Self {
        match config.api_mode {
            ApiMode::Mock => {
                info!(delay_ms = config.mock_delay_ms, "using mock backend");
                let service = MockService::new(FileStore::new(data_dir))
                    .with_seeds(seed::from_location(config.seed.as_deref()))
                    .with_latency(config.mock_delay());
                Backend::Mock(service)
            }
            ApiMode::Real => {
                info!(url = %config.api_url, "using http backend");
                Backend::Http(HttpService::new(&config.api_url))
            }
        }
    }

    pub fn mode(&self) -> ApiMode {
        match self {
            Backend::Mock(_) => ApiMode::Mock,
            Backend::Http(_) => ApiMode::Real,
        }
    }
}

impl CatalogService for Backend {
    fn list<T: Record>(&self) -> Result<Vec<T>> {
        match self {
            Backend::Mock(s) => s.list(),
            Backend::Http(s) => s.list(),
        }
    }

    fn get<T: Record>(&self, id: Id) -> Result<T> {
        match self {
            Backend::Mock(s) => s.get(id),
            Backend::Http(s) => s.get(id),
        }
    }

    fn create<T: Record>(&self, draft: T::Draft) -> Result<T> {
        match self {
            Backend::Mock(s) => s.create::<T>(draft),
            Backend::Http(s) => s.create::<T>(draft),
        }
    }

    fn update<T: Record>(&self, id: Id, patch: T::Patch) -> Result<T> {
        match self {
            Backend::Mock(s) => s.update::<T>(id, patch),
            Backend::Http(s) => s.update::<T>(id, patch),
        }
    }

    fn delete<T: Record>(&self, id: Id) -> Result<Ack> {
        match self {
            Backend::Mock(s) => s.delete::<T>(id),
            Backend::Http(s) => s.delete::<T>(id),
        }
    }

    fn inventory_by_store(&self, store_id: Id) -> Result<Vec<InventoryItem>> {
        match self {
            Backend::Mock(s) => s.inventory_by_store(store_id),
            Backend::Http(s) => s.inventory_by_store(store_id),
        }
    }

    fn delete_inventory_by_store_and_book(&self, store_id: Id, book_id: Id) -> Result<Ack> {
        match self {
            Backend::Mock(s) => s.delete_inventory_by_store_and_book(store_id, book_id),
            Backend::Http(s) => s.delete_inventory_by_store_and_book(store_id, book_id),
        }
    }

    fn snapshot(&self) -> Result<Catalog> {
        match self {
            Backend::Mock(s) => s.snapshot(),
            Backend::Http(s) => s.snapshot(),
        }
    }

    fn login(&self, email: &str, password: &str) -> Result<LoginGrant> {
        match self {
            Backend::Mock(s) => s.login(email, password),
            Backend::Http(s) => s.login(email, password),
        }
    }

    fn logout(&self) -> Result<Ack> {
        match self {
            Backend::Mock(s) => s.logout(),
            Backend::Http(s) => s.logout(),
        }
    }

    fn current_user(&self, token: &str) -> Result<User> {
        match self {
            Backend::Mock(s) => s.current_user(token),
            Backend::Http(s) => s.current_user(token),
        }
    }
}
