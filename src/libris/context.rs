//! # Application Data Context
//!
//! [`LibraryContext`] is the in-memory working set a UI renders from: the
//! four collections, each with its own load state, plus derived views joined
//! across them.
//!
//! Every mutation goes through the [`CatalogApi`] first. The backend assigns
//! ids and persists; the context only mirrors the entity it gets back. It
//! never computes ids or writes storage itself, so there is one source of
//! truth whichever backend is configured.
//!
//! ## Loading
//!
//! `load()` moves all four collections to `Loading`, asks the backend for a
//! single snapshot, and then moves all four to `Ready` or all four to `Failed`
//! together. Mutators refuse to touch a collection that is not `Ready`.
//!
//! ## Orphans
//!
//! Deleting a book or store leaves its inventory items behind under
//! [`OrphanPolicy::Keep`]; joins then render the missing side as "Unknown".
//! Under [`OrphanPolicy::Cascade`] those items are deleted through the API
//! as well.

use crate::api::CatalogApi;
use crate::config::OrphanPolicy;
use crate::error::{LibrisError, Result};
use crate::forms::{
    parse_price, split_full_name, AuthorForm, BookEdit, BookForm, InventoryForm, StoreEdit,
    StoreForm, ValidationErrors, AUTHOR_NAME_REQUIRED,
};
use crate::model::{
    Author, AuthorPatch, Book, BookPatch, EntityKind, Id, InventoryItem, InventoryPatch, NewAuthor,
    NewBook, NewInventoryItem, NewStore, Store, StorePatch,
};
use crate::service::CatalogService;
use crate::views::{
    self, AuthorShelf, AuthorSummary, BookListing, InventoryLine, StoreSummary,
};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Uninitialized,
    Loading,
    Ready(Vec<T>),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }

    /// The loaded items, or an empty slice in any other state.
    pub fn items(&self) -> &[T] {
        match self {
            LoadState::Ready(items) => items,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

fn ready_mut<T>(state: &mut LoadState<T>, kind: EntityKind) -> Result<&mut Vec<T>> {
    match state {
        LoadState::Ready(items) => Ok(items),
        _ => Err(LibrisError::NotLoaded(kind)),
    }
}

fn ensure_ready<T>(state: &LoadState<T>, kind: EntityKind) -> Result<()> {
    if state.is_ready() {
        Ok(())
    } else {
        Err(LibrisError::NotLoaded(kind))
    }
}

fn replace<T>(items: &mut [T], updated: T, id_of: impl Fn(&T) -> Id) {
    let id = id_of(&updated);
    if let Some(slot) = items.iter_mut().find(|item| id_of(item) == id) {
        *slot = updated;
    }
}

pub struct LibraryContext<B: CatalogService> {
    api: CatalogApi<B>,
    orphans: OrphanPolicy,
    books: LoadState<Book>,
    authors: LoadState<Author>,
    stores: LoadState<Store>,
    inventory: LoadState<InventoryItem>,
}

impl<B: CatalogService> LibraryContext<B> {
    pub fn new(api: CatalogApi<B>) -> Self {
        Self {
            api,
            orphans: OrphanPolicy::default(),
            books: LoadState::Uninitialized,
            authors: LoadState::Uninitialized,
            stores: LoadState::Uninitialized,
            inventory: LoadState::Uninitialized,
        }
    }

    pub fn with_orphan_policy(mut self, orphans: OrphanPolicy) -> Self {
        self.orphans = orphans;
        self
    }

    pub fn api(&self) -> &CatalogApi<B> {
        &self.api
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.orphans
    }

    pub fn books(&self) -> &LoadState<Book> {
        &self.books
    }

    pub fn authors(&self) -> &LoadState<Author> {
        &self.authors
    }

    pub fn stores(&self) -> &LoadState<Store> {
        &self.stores
    }

    pub fn inventory(&self) -> &LoadState<InventoryItem> {
        &self.inventory
    }

    pub fn is_ready(&self) -> bool {
        self.books.is_ready()
            && self.authors.is_ready()
            && self.stores.is_ready()
            && self.inventory.is_ready()
    }

    /// Load (or reload) all four collections as one group.
    pub fn load(&mut self) -> Result<()> {
        self.books = LoadState::Loading;
        self.authors = LoadState::Loading;
        self.stores = LoadState::Loading;
        self.inventory = LoadState::Loading;

        match self.api.snapshot() {
            Ok(catalog) => {
                info!(
                    books = catalog.books.len(),
                    authors = catalog.authors.len(),
                    stores = catalog.stores.len(),
                    inventory = catalog.inventory.len(),
                    "catalog loaded"
                );
                self.books = LoadState::Ready(catalog.books);
                self.authors = LoadState::Ready(catalog.authors);
                self.stores = LoadState::Ready(catalog.stores);
                self.inventory = LoadState::Ready(catalog.inventory);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.books = LoadState::Failed(message.clone());
                self.authors = LoadState::Failed(message.clone());
                self.stores = LoadState::Failed(message.clone());
                self.inventory = LoadState::Failed(message);
                Err(e)
            }
        }
    }

    // --- Books ---

    pub fn add_book(&mut self, book: NewBook) -> Result<Book> {
        ensure_ready(&self.books, EntityKind::Book)?;
        let created = self.api.create_book(book)?;
        ready_mut(&mut self.books, EntityKind::Book)?.push(created.clone());
        Ok(created)
    }

    pub fn update_book(&mut self, id: Id, patch: BookPatch) -> Result<Book> {
        ensure_ready(&self.books, EntityKind::Book)?;
        let updated = self.api.update_book(id, patch)?;
        replace(
            ready_mut(&mut self.books, EntityKind::Book)?,
            updated.clone(),
            |b| b.id,
        );
        Ok(updated)
    }

    pub fn delete_book(&mut self, id: Id) -> Result<()> {
        ensure_ready(&self.books, EntityKind::Book)?;
        self.api.delete_book(id)?;
        ready_mut(&mut self.books, EntityKind::Book)?.retain(|b| b.id != id);
        if self.orphans == OrphanPolicy::Cascade {
            self.delete_inventory_where(|item| item.book_id == id)?;
        }
        Ok(())
    }

    // --- Authors ---

    pub fn add_author(&mut self, author: NewAuthor) -> Result<Author> {
        ensure_ready(&self.authors, EntityKind::Author)?;
        let created = self.api.create_author(author)?;
        ready_mut(&mut self.authors, EntityKind::Author)?.push(created.clone());
        Ok(created)
    }

    pub fn update_author(&mut self, id: Id, patch: AuthorPatch) -> Result<Author> {
        ensure_ready(&self.authors, EntityKind::Author)?;
        let updated = self.api.update_author(id, patch)?;
        replace(
            ready_mut(&mut self.authors, EntityKind::Author)?,
            updated.clone(),
            |a| a.id,
        );
        Ok(updated)
    }

    /// Books by a deleted author stay; their author renders as unknown.
    pub fn delete_author(&mut self, id: Id) -> Result<()> {
        ensure_ready(&self.authors, EntityKind::Author)?;
        self.api.delete_author(id)?;
        ready_mut(&mut self.authors, EntityKind::Author)?.retain(|a| a.id != id);
        Ok(())
    }

    // --- Stores ---

    pub fn add_store(&mut self, store: NewStore) -> Result<Store> {
        ensure_ready(&self.stores, EntityKind::Store)?;
        let created = self.api.create_store(store)?;
        ready_mut(&mut self.stores, EntityKind::Store)?.push(created.clone());
        Ok(created)
    }

    pub fn update_store(&mut self, id: Id, patch: StorePatch) -> Result<Store> {
        ensure_ready(&self.stores, EntityKind::Store)?;
        let updated = self.api.update_store(id, patch)?;
        replace(
            ready_mut(&mut self.stores, EntityKind::Store)?,
            updated.clone(),
            |s| s.id,
        );
        Ok(updated)
    }

    pub fn delete_store(&mut self, id: Id) -> Result<()> {
        ensure_ready(&self.stores, EntityKind::Store)?;
        self.api.delete_store(id)?;
        ready_mut(&mut self.stores, EntityKind::Store)?.retain(|s| s.id != id);
        if self.orphans == OrphanPolicy::Cascade {
            self.delete_inventory_where(|item| item.store_id == id)?;
        }
        Ok(())
    }

    // --- Inventory ---

    pub fn add_inventory_item(&mut self, item: NewInventoryItem) -> Result<InventoryItem> {
        ensure_ready(&self.inventory, EntityKind::InventoryItem)?;
        let created = self.api.create_inventory_item(item)?;
        ready_mut(&mut self.inventory, EntityKind::InventoryItem)?.push(created.clone());
        Ok(created)
    }

    pub fn update_inventory_item(&mut self, id: Id, patch: InventoryPatch) -> Result<InventoryItem> {
        ensure_ready(&self.inventory, EntityKind::InventoryItem)?;
        let updated = self.api.update_inventory_item(id, patch)?;
        replace(
            ready_mut(&mut self.inventory, EntityKind::InventoryItem)?,
            updated.clone(),
            |i| i.id,
        );
        Ok(updated)
    }

    pub fn delete_inventory_item(&mut self, id: Id) -> Result<()> {
        ensure_ready(&self.inventory, EntityKind::InventoryItem)?;
        self.api.delete_inventory_item(id)?;
        ready_mut(&mut self.inventory, EntityKind::InventoryItem)?.retain(|i| i.id != id);
        Ok(())
    }

    /// Remove a book from one store's shelf.
    pub fn remove_book_from_store(&mut self, store_id: Id, book_id: Id) -> Result<()> {
        ensure_ready(&self.inventory, EntityKind::InventoryItem)?;
        self.api
            .delete_inventory_by_store_and_book(store_id, book_id)?;
        ready_mut(&mut self.inventory, EntityKind::InventoryItem)?
            .retain(|i| !(i.store_id == store_id && i.book_id == book_id));
        Ok(())
    }

    fn delete_inventory_where(&mut self, pred: impl Fn(&InventoryItem) -> bool) -> Result<()> {
        let doomed: Vec<Id> = self
            .inventory
            .items()
            .iter()
            .filter(|item| pred(item))
            .map(|item| item.id)
            .collect();
        for id in doomed {
            debug!(id, "cascading inventory delete");
            self.delete_inventory_item(id)?;
        }
        Ok(())
    }

    // --- Forms ---

    pub fn add_book_form(&mut self, form: &BookForm) -> Result<Book> {
        ensure_ready(&self.authors, EntityKind::Author)?;
        let draft = form.validate(self.authors.items())?;
        self.add_book(draft)
    }

    pub fn edit_book_form(&mut self, id: Id, form: &BookEdit) -> Result<Book> {
        ensure_ready(&self.authors, EntityKind::Author)?;
        let patch = form.validate(self.authors.items())?;
        self.update_book(id, patch)
    }

    pub fn add_author_form(&mut self, form: &AuthorForm) -> Result<Author> {
        let draft = form.validate()?;
        self.add_author(draft)
    }

    pub fn add_store_form(&mut self, form: &StoreForm) -> Result<Store> {
        let draft = form.validate()?;
        self.add_store(draft)
    }

    pub fn edit_store_form(&mut self, id: Id, form: &StoreEdit) -> Result<Store> {
        let patch = form.validate()?;
        self.update_store(id, patch)
    }

    pub fn add_inventory_form(&mut self, form: &InventoryForm) -> Result<InventoryItem> {
        ensure_ready(&self.books, EntityKind::Book)?;
        let draft = form.validate(self.books.items())?;
        self.add_inventory_item(draft)
    }

    pub fn rename_author(&mut self, id: Id, full_name: &str) -> Result<Author> {
        let (first_name, last_name) = split_full_name(full_name)
            .ok_or_else(|| ValidationErrors::single("name", AUTHOR_NAME_REQUIRED))?;
        self.update_author(
            id,
            AuthorPatch {
                first_name: Some(first_name),
                last_name: Some(last_name),
            },
        )
    }

    pub fn set_inventory_price(&mut self, id: Id, price: &str) -> Result<InventoryItem> {
        let price = parse_price(price)?;
        self.update_inventory_item(
            id,
            InventoryPatch {
                price: Some(price),
                ..Default::default()
            },
        )
    }

    // --- Views ---

    pub fn book_listings(&self) -> Vec<BookListing> {
        views::books_with_stores(
            self.books.items(),
            self.authors.items(),
            self.stores.items(),
            self.inventory.items(),
        )
    }

    pub fn store_summaries(&self) -> Vec<StoreSummary> {
        views::stores_with_metrics(self.stores.items(), self.inventory.items())
    }

    pub fn author_summaries(&self) -> Vec<AuthorSummary> {
        views::authors_with_book_counts(self.authors.items(), self.books.items())
    }

    pub fn store_inventory(&self, store_id: Id) -> Vec<InventoryLine> {
        views::store_inventory(
            store_id,
            self.inventory.items(),
            self.books.items(),
            self.authors.items(),
        )
    }

    pub fn store_inventory_by_author(&self, store_id: Id) -> Vec<AuthorShelf> {
        views::store_inventory_by_author(&self.store_inventory(store_id))
    }

    pub fn available_books(&self, store_id: Id) -> Vec<Book> {
        views::available_books(store_id, self.books.items(), self.inventory.items())
    }
}
