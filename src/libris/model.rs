use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LibrisError, Result};

pub type Id = u64;

/// The four catalog collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Book,
    Author,
    Store,
    InventoryItem,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Book,
        EntityKind::Author,
        EntityKind::Store,
        EntityKind::InventoryItem,
    ];

    /// Name of the collection, used for seed files and HTTP routes.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Book => "books",
            EntityKind::Author => "authors",
            EntityKind::Store => "stores",
            EntityKind::InventoryItem => "inventory",
        }
    }

    /// Key of the persisted slot holding the collection.
    pub fn slot(self) -> String {
        format!("library_{}", self.collection())
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Book => "Book",
            EntityKind::Author => "Author",
            EntityKind::Store => "Store",
            EntityKind::InventoryItem => "Inventory item",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// A record stored in one of the catalog collections.
///
/// `Draft` is the create payload (everything but the id) and `Patch` the
/// shallow-merge update payload: absent fields are left untouched.
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + 'static {
    const KIND: EntityKind;
    type Draft: Clone + fmt::Debug + Serialize + DeserializeOwned;
    type Patch: Clone + fmt::Debug + Default + Serialize + DeserializeOwned;

    fn id(&self) -> Id;
    fn from_draft(id: Id, draft: Self::Draft) -> Self;
    fn apply(&mut self, patch: Self::Patch);
}

/// `max(existing) + 1`, or `1` for an empty collection.
pub fn next_id<T: Record>(items: &[T]) -> Result<Id> {
    match items.iter().map(Record::id).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| LibrisError::Store(format!("{} ids are exhausted", T::KIND))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub page_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub author_id: Id,
    pub name: String,
    pub page_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

impl Record for Book {
    const KIND: EntityKind = EntityKind::Book;
    type Draft = NewBook;
    type Patch = BookPatch;

    fn id(&self) -> Id {
        self.id
    }

    fn from_draft(id: Id, draft: NewBook) -> Self {
        Self {
            id,
            author_id: draft.author_id,
            name: draft.name,
            page_count: draft.page_count,
        }
    }

    fn apply(&mut self, patch: BookPatch) {
        if let Some(author_id) = patch.author_id {
            self.author_id = author_id;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(page_count) = patch.page_count {
            self.page_count = page_count;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
}

impl Author {
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Record for Author {
    const KIND: EntityKind = EntityKind::Author;
    type Draft = NewAuthor;
    type Patch = AuthorPatch;

    fn id(&self) -> Id {
        self.id
    }

    fn from_draft(id: Id, draft: NewAuthor) -> Self {
        Self {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
        }
    }

    fn apply(&mut self, patch: AuthorPatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: Id,
    pub name: String,
    pub address_1: String,
    #[serde(default)]
    pub address_2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl Store {
    /// `address_1[, address_2], city, state zip`
    pub fn full_address(&self) -> String {
        let mut out = self.address_1.clone();
        if let Some(line) = self.address_2.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(", ");
            out.push_str(line);
        }
        format!("{}, {}, {} {}", out, self.city, self.state, self.zip)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStore {
    pub name: String,
    pub address_1: String,
    #[serde(default)]
    pub address_2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_1: Option<String>,
    /// An empty string clears the second address line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

impl Record for Store {
    const KIND: EntityKind = EntityKind::Store;
    type Draft = NewStore;
    type Patch = StorePatch;

    fn id(&self) -> Id {
        self.id
    }

    fn from_draft(id: Id, draft: NewStore) -> Self {
        Self {
            id,
            name: draft.name,
            address_1: draft.address_1,
            address_2: draft.address_2.filter(|s| !s.is_empty()),
            city: draft.city,
            state: draft.state,
            zip: draft.zip,
        }
    }

    fn apply(&mut self, patch: StorePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(address_1) = patch.address_1 {
            self.address_1 = address_1;
        }
        if let Some(address_2) = patch.address_2 {
            self.address_2 = Some(address_2).filter(|s| !s.is_empty());
        }
        if let Some(city) = patch.city {
            self.city = city;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(zip) = patch.zip {
            self.zip = zip;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Id,
    pub store_id: Id,
    pub book_id: Id,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub store_id: Id,
    pub book_id: Id,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Record for InventoryItem {
    const KIND: EntityKind = EntityKind::InventoryItem;
    type Draft = NewInventoryItem;
    type Patch = InventoryPatch;

    fn id(&self) -> Id {
        self.id
    }

    fn from_draft(id: Id, draft: NewInventoryItem) -> Self {
        Self {
            id,
            store_id: draft.store_id,
            book_id: draft.book_id,
            price: draft.price,
        }
    }

    fn apply(&mut self, patch: InventoryPatch) {
        if let Some(store_id) = patch.store_id {
            self.store_id = store_id;
        }
        if let Some(book_id) = patch.book_id {
            self.book_id = book_id;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }
}

/// A signed-in user as seen by clients. The password never appears here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginGrant {
    pub user: User,
    pub token: String,
}

/// Acknowledgement returned by delete and logout operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// All four collections, as loaded together at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub books: Vec<Book>,
    pub authors: Vec<Author>,
    pub stores: Vec<Store>,
    pub inventory: Vec<InventoryItem>,
}
