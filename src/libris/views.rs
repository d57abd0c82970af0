//! Derived, read-only views joined across collections.
//!
//! Nothing here is persisted. A reference to a missing record renders with
//! one of the `UNKNOWN_*` labels instead of failing.

use crate::model::{Author, Book, Id, InventoryItem, Store};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const UNKNOWN_STORE: &str = "Unknown Store";
pub const UNKNOWN_BOOK: &str = "Unknown Book";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreOffer {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookListing {
    pub id: Id,
    pub title: String,
    pub author: String,
    pub page_count: u32,
    pub stores: Vec<StoreOffer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSummary {
    pub store: Store,
    pub full_address: String,
    pub item_count: usize,
    /// Mean price of the store's items; `0.0` when it carries nothing.
    pub average_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorSummary {
    pub author: Author,
    pub full_name: String,
    pub book_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryLine {
    pub id: Id,
    pub book_id: Id,
    pub book_name: String,
    pub page_count: Option<u32>,
    pub author_id: Option<Id>,
    pub author_name: String,
    pub price: f64,
}

/// One author's part of a store's shelf. `author_id` is `None` for items
/// whose book is gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorShelf {
    pub author_id: Option<Id>,
    pub author_name: String,
    pub books: Vec<InventoryLine>,
}

fn author_names(authors: &[Author]) -> HashMap<Id, String> {
    authors.iter().map(|a| (a.id, a.full_name())).collect()
}

fn author_name(names: &HashMap<Id, String>, id: Id) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

pub fn books_with_stores(
    books: &[Book],
    authors: &[Author],
    stores: &[Store],
    inventory: &[InventoryItem],
) -> Vec<BookListing> {
    let names = author_names(authors);
    let store_names: HashMap<Id, &str> = stores.iter().map(|s| (s.id, s.name.as_str())).collect();

    books
        .iter()
        .map(|book| BookListing {
            id: book.id,
            title: book.name.clone(),
            author: author_name(&names, book.author_id),
            page_count: book.page_count,
            stores: inventory
                .iter()
                .filter(|item| item.book_id == book.id)
                .map(|item| StoreOffer {
                    name: store_names
                        .get(&item.store_id)
                        .copied()
                        .unwrap_or(UNKNOWN_STORE)
                        .to_string(),
                    price: item.price,
                })
                .collect(),
        })
        .collect()
}

pub fn stores_with_metrics(stores: &[Store], inventory: &[InventoryItem]) -> Vec<StoreSummary> {
    stores
        .iter()
        .map(|store| {
            let prices: Vec<f64> = inventory
                .iter()
                .filter(|item| item.store_id == store.id)
                .map(|item| item.price)
                .collect();
            let average_price = if prices.is_empty() {
                0.0
            } else {
                prices.iter().sum::<f64>() / prices.len() as f64
            };
            StoreSummary {
                full_address: store.full_address(),
                item_count: prices.len(),
                average_price,
                store: store.clone(),
            }
        })
        .collect()
}

pub fn authors_with_book_counts(authors: &[Author], books: &[Book]) -> Vec<AuthorSummary> {
    authors
        .iter()
        .map(|author| AuthorSummary {
            full_name: author.full_name(),
            book_count: books.iter().filter(|b| b.author_id == author.id).count(),
            author: author.clone(),
        })
        .collect()
}

/// The items one store carries, with book and author resolved.
pub fn store_inventory(
    store_id: Id,
    inventory: &[InventoryItem],
    books: &[Book],
    authors: &[Author],
) -> Vec<InventoryLine> {
    let names = author_names(authors);
    let books_by_id: HashMap<Id, &Book> = books.iter().map(|b| (b.id, b)).collect();

    inventory
        .iter()
        .filter(|item| item.store_id == store_id)
        .map(|item| {
            let book = books_by_id.get(&item.book_id);
            InventoryLine {
                id: item.id,
                book_id: item.book_id,
                book_name: book
                    .map(|b| b.name.clone())
                    .unwrap_or_else(|| UNKNOWN_BOOK.to_string()),
                page_count: book.map(|b| b.page_count),
                author_id: book.map(|b| b.author_id),
                author_name: book
                    .map(|b| author_name(&names, b.author_id))
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                price: item.price,
            }
        })
        .collect()
}

/// Inventory lines grouped by author, groups in first-seen order.
pub fn store_inventory_by_author<'a>(
    lines: impl IntoIterator<Item = &'a InventoryLine>,
) -> Vec<AuthorShelf> {
    let mut shelves: Vec<AuthorShelf> = Vec::new();
    for line in lines {
        match shelves.iter_mut().find(|s| s.author_id == line.author_id) {
            Some(shelf) => shelf.books.push(line.clone()),
            None => shelves.push(AuthorShelf {
                author_id: line.author_id,
                author_name: match line.author_id {
                    Some(_) => line.author_name.clone(),
                    None => UNKNOWN_AUTHOR.to_string(),
                },
                books: vec![line.clone()],
            }),
        }
    }
    shelves
}

/// Books the store does not carry yet, in catalog order.
pub fn available_books(store_id: Id, books: &[Book], inventory: &[InventoryItem]) -> Vec<Book> {
    let carried: HashSet<Id> = inventory
        .iter()
        .filter(|item| item.store_id == store_id)
        .map(|item| item.book_id)
        .collect();
    books
        .iter()
        .filter(|b| !carried.contains(&b.id))
        .cloned()
        .collect()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Matches title or author name.
pub fn search_books<'a>(listings: &'a [BookListing], query: &str) -> Vec<&'a BookListing> {
    listings
        .iter()
        .filter(|l| contains_ci(&l.title, query) || contains_ci(&l.author, query))
        .collect()
}

pub fn search_authors<'a>(authors: &'a [AuthorSummary], query: &str) -> Vec<&'a AuthorSummary> {
    authors
        .iter()
        .filter(|a| contains_ci(&a.full_name, query))
        .collect()
}

/// Matches store name or any part of the address.
pub fn search_stores<'a>(stores: &'a [StoreSummary], query: &str) -> Vec<&'a StoreSummary> {
    stores
        .iter()
        .filter(|s| contains_ci(&s.store.name, query) || contains_ci(&s.full_address, query))
        .collect()
}

/// Matches book or author name.
pub fn search_inventory<'a>(lines: &'a [InventoryLine], query: &str) -> Vec<&'a InventoryLine> {
    lines
        .iter()
        .filter(|l| contains_ci(&l.book_name, query) || contains_ci(&l.author_name, query))
        .collect()
}
