//! Input validation for the add/edit forms.
//!
//! Each form holds raw user input and validates into the draft the service
//! accepts. Failures are collected per field so a UI can show every message
//! at once.

use crate::model::{
    Author, Book, BookPatch, Id, NewAuthor, NewBook, NewInventoryItem, NewStore, StorePatch,
};
use std::collections::BTreeMap;
use std::fmt;

pub const BOOK_NAME_REQUIRED: &str = "Book name is required";
pub const AUTHOR_REQUIRED: &str = "Please select an author";
pub const PAGE_COUNT_INVALID: &str = "Page count must be greater than 0";
pub const AUTHOR_NAME_REQUIRED: &str = "Please enter a name";
pub const STORE_NAME_REQUIRED: &str = "Store name is required";
pub const ADDRESS_REQUIRED: &str = "Address is required";
pub const ADDRESS_INCOMPLETE: &str =
    "Address must include city, state, and zip (e.g., \"123 Main St, Athens, GA 30605\")";
pub const BOOK_REQUIRED: &str = "Please select a book";
pub const PRICE_INVALID: &str = "Price must be a valid positive number";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Email is invalid";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

const MIN_PASSWORD_CHARS: usize = 6;

/// Field name to message, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a message for a field. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookForm {
    pub name: String,
    pub author_id: Option<Id>,
    pub page_count: String,
}

impl BookForm {
    pub fn validate(&self, authors: &[Author]) -> Result<NewBook, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", BOOK_NAME_REQUIRED);
        }

        let author_id = self
            .author_id
            .filter(|id| authors.iter().any(|a| a.id == *id));
        if author_id.is_none() {
            errors.add("author_id", AUTHOR_REQUIRED);
        }

        let page_count = parse_page_count(&self.page_count);
        if page_count.is_none() {
            errors.add("page_count", PAGE_COUNT_INVALID);
        }

        errors.into_result(|| NewBook {
            author_id: author_id.unwrap_or_default(),
            name: name.to_string(),
            page_count: page_count.unwrap_or_default(),
        })
    }
}

pub fn parse_page_count(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

/// Partial edit of a book. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct BookEdit {
    pub name: Option<String>,
    pub author_id: Option<Id>,
    pub page_count: Option<String>,
}

impl BookEdit {
    pub fn validate(&self, authors: &[Author]) -> Result<BookPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut patch = BookPatch::default();

        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() {
                errors.add("name", BOOK_NAME_REQUIRED);
            }
            patch.name = Some(name.to_string());
        }
        if let Some(id) = self.author_id {
            if !authors.iter().any(|a| a.id == id) {
                errors.add("author_id", AUTHOR_REQUIRED);
            }
            patch.author_id = Some(id);
        }
        if let Some(raw) = &self.page_count {
            patch.page_count = parse_page_count(raw);
            if patch.page_count.is_none() {
                errors.add("page_count", PAGE_COUNT_INVALID);
            }
        }

        errors.into_result(|| patch)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthorForm {
    pub name: String,
}

impl AuthorForm {
    pub fn validate(&self) -> Result<NewAuthor, ValidationErrors> {
        let (first_name, last_name) = split_full_name(&self.name)
            .ok_or_else(|| ValidationErrors::single("name", AUTHOR_NAME_REQUIRED))?;
        Ok(NewAuthor {
            first_name,
            last_name,
        })
    }
}

/// First word is the first name; every remaining word, joined by single
/// spaces, is the last name (possibly empty).
pub fn split_full_name(full_name: &str) -> Option<(String, String)> {
    let mut words = full_name.split_whitespace();
    let first = words.next()?;
    let rest: Vec<&str> = words.collect();
    Some((first.to_string(), rest.join(" ")))
}

#[derive(Debug, Clone, Default)]
pub struct StoreForm {
    pub name: String,
    pub address: String,
}

impl StoreForm {
    pub fn validate(&self) -> Result<NewStore, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", STORE_NAME_REQUIRED);
        }

        let address = if self.address.trim().is_empty() {
            errors.add("address", ADDRESS_REQUIRED);
            None
        } else {
            let parsed = parse_address(&self.address);
            if parsed.is_none() {
                errors.add("address", ADDRESS_INCOMPLETE);
            }
            parsed
        };

        errors.into_result(|| {
            let address = address.unwrap_or_default();
            NewStore {
                name: name.to_string(),
                address_1: address.address_1,
                address_2: address.address_2,
                city: address.city,
                state: address.state,
                zip: address.zip,
            }
        })
    }
}

/// Partial edit of a store. A new address replaces every address field,
/// clearing `address_2` when the new one has no second line.
#[derive(Debug, Clone, Default)]
pub struct StoreEdit {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl StoreEdit {
    pub fn validate(&self) -> Result<StorePatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut patch = StorePatch::default();

        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() {
                errors.add("name", STORE_NAME_REQUIRED);
            }
            patch.name = Some(name.to_string());
        }
        if let Some(raw) = &self.address {
            if raw.trim().is_empty() {
                errors.add("address", ADDRESS_REQUIRED);
            } else {
                match parse_address(raw) {
                    Some(address) => {
                        patch.address_1 = Some(address.address_1);
                        patch.address_2 = Some(address.address_2.unwrap_or_default());
                        patch.city = Some(address.city);
                        patch.state = Some(address.state);
                        patch.zip = Some(address.zip);
                    }
                    None => errors.add("address", ADDRESS_INCOMPLETE),
                }
            }
        }

        errors.into_result(|| patch)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAddress {
    pub address_1: String,
    pub address_2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Best-effort split of `"street[, line 2], city, STATE 12345"`.
///
/// Needs at least three comma separated parts, and the last one must end in
/// a state word followed by a five digit zip. With four or more parts the
/// second becomes `address_2`; anything between it and the city is dropped.
pub fn parse_address(raw: &str) -> Option<ParsedAddress> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }

    let (state, zip) = split_state_zip(parts[parts.len() - 1])?;
    let city = parts[parts.len() - 2];
    if city.is_empty() || parts[0].is_empty() {
        return None;
    }

    let address_2 = if parts.len() > 3 && !parts[1].is_empty() {
        Some(parts[1].to_string())
    } else {
        None
    };

    Some(ParsedAddress {
        address_1: parts[0].to_string(),
        address_2,
        city: city.to_string(),
        state: state.to_string(),
        zip: zip.to_string(),
    })
}

fn split_state_zip(segment: &str) -> Option<(&str, &str)> {
    let words: Vec<&str> = segment.split_whitespace().collect();
    let zip = *words.last()?;
    let state = *words.get(words.len().checked_sub(2)?)?;

    let zip_ok = zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit());
    let state_ok = state.chars().all(|c| c.is_alphanumeric() || c == '_');
    (zip_ok && state_ok).then_some((state, zip))
}

#[derive(Debug, Clone, Default)]
pub struct InventoryForm {
    pub store_id: Id,
    pub book_id: Option<Id>,
    pub price: String,
}

impl InventoryForm {
    pub fn validate(&self, books: &[Book]) -> Result<NewInventoryItem, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let book_id = self.book_id.filter(|id| books.iter().any(|b| b.id == *id));
        if book_id.is_none() {
            errors.add("book_id", BOOK_REQUIRED);
        }

        let price = parse_price(&self.price);
        if let Err(e) = &price {
            for (field, message) in e.iter() {
                errors.add(field, message);
            }
        }

        errors.into_result(|| NewInventoryItem {
            store_id: self.store_id,
            book_id: book_id.unwrap_or_default(),
            price: price.unwrap_or_default(),
        })
    }
}

/// A finite price greater than zero.
pub fn parse_price(raw: &str) -> Result<f64, ValidationErrors> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| ValidationErrors::single("price", PRICE_INVALID))
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Shape checks only; whether the account exists is the backend's call.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.email.trim().is_empty() {
            errors.add("email", EMAIL_REQUIRED);
        } else if !looks_like_email(&self.email) {
            errors.add("email", EMAIL_INVALID);
        }

        if self.password.is_empty() {
            errors.add("password", PASSWORD_REQUIRED);
        } else if self.password.chars().count() < MIN_PASSWORD_CHARS {
            errors.add("password", PASSWORD_TOO_SHORT);
        }

        errors.into_result(|| ())
    }
}

/// Somewhere in the input: non-blank text, `@`, non-blank text, `.`,
/// non-blank text, with no whitespace in between.
pub fn looks_like_email(raw: &str) -> bool {
    raw.split_whitespace().any(|word| {
        word.char_indices().any(|(at, c)| {
            if c != '@' || at == 0 {
                return false;
            }
            let domain = &word[at + 1..];
            domain
                .char_indices()
                .any(|(dot, c)| c == '.' && dot > 0 && dot + 1 < domain.len())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authors() -> Vec<Author> {
        vec![Author {
            id: 1,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }]
    }

    fn books() -> Vec<Book> {
        vec![Book {
            id: 7,
            author_id: 1,
            name: "Notes".into(),
            page_count: 50,
        }]
    }

    #[test]
    fn book_form_collects_every_field_error() {
        let form = BookForm {
            name: "   ".into(),
            author_id: Some(99),
            page_count: "0".into(),
        };
        let errors = form.validate(&authors()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("name"), Some(BOOK_NAME_REQUIRED));
        assert_eq!(errors.get("author_id"), Some(AUTHOR_REQUIRED));
        assert_eq!(errors.get("page_count"), Some(PAGE_COUNT_INVALID));
    }

    #[test]
    fn book_form_trims_name() {
        let form = BookForm {
            name: "  Notes  ".into(),
            author_id: Some(1),
            page_count: "120".into(),
        };
        let book = form.validate(&authors()).unwrap();
        assert_eq!(book.name, "Notes");
        assert_eq!(book.page_count, 120);
        assert_eq!(book.author_id, 1);
    }

    #[test]
    fn page_count_rejects_non_numbers() {
        assert_eq!(parse_page_count("twelve"), None);
        assert_eq!(parse_page_count("-3"), None);
        assert_eq!(parse_page_count(" 12 "), Some(12));
    }

    #[test]
    fn full_name_splits_on_first_word() {
        assert_eq!(
            split_full_name("Ursula K. Le Guin"),
            Some(("Ursula".into(), "K. Le Guin".into()))
        );
        assert_eq!(split_full_name("Plato"), Some(("Plato".into(), "".into())));
        assert_eq!(split_full_name("   "), None);

        let errors = AuthorForm { name: "".into() }.validate().unwrap_err();
        assert_eq!(errors.get("name"), Some(AUTHOR_NAME_REQUIRED));
    }

    #[test]
    fn parses_three_part_address() {
        let parsed = parse_address("123 Main St, Athens, GA 30605").unwrap();
        assert_eq!(
            parsed,
            ParsedAddress {
                address_1: "123 Main St".into(),
                address_2: None,
                city: "Athens".into(),
                state: "GA".into(),
                zip: "30605".into(),
            }
        );
    }

    #[test]
    fn fourth_part_becomes_address_2() {
        let parsed = parse_address("1 Elm Rd, Suite 4, Decatur, GA 30030").unwrap();
        assert_eq!(parsed.address_1, "1 Elm Rd");
        assert_eq!(parsed.address_2.as_deref(), Some("Suite 4"));
        assert_eq!(parsed.city, "Decatur");
    }

    #[test]
    fn incomplete_addresses_are_rejected() {
        assert_eq!(parse_address("123 Main St, Athens"), None);
        assert_eq!(parse_address("123 Main St, Athens, GA"), None);
        assert_eq!(parse_address("123 Main St, Athens, GA 3060"), None);
        assert_eq!(parse_address("123 Main St, Athens, 30605"), None);

        let form = StoreForm {
            name: "Shop".into(),
            address: "somewhere".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("address"), Some(ADDRESS_INCOMPLETE));
    }

    #[test]
    fn book_edit_only_checks_given_fields() {
        let patch = BookEdit {
            page_count: Some("300".into()),
            ..Default::default()
        }
        .validate(&authors())
        .unwrap();
        assert_eq!(patch.page_count, Some(300));
        assert_eq!(patch.name, None);

        let errors = BookEdit {
            name: Some(" ".into()),
            author_id: Some(5),
            page_count: None,
        }
        .validate(&authors())
        .unwrap_err();
        assert_eq!(errors.get("name"), Some(BOOK_NAME_REQUIRED));
        assert_eq!(errors.get("author_id"), Some(AUTHOR_REQUIRED));
    }

    #[test]
    fn store_edit_clears_second_line() {
        let patch = StoreEdit {
            name: None,
            address: Some("9 Oak Ave, Macon, GA 31201".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(patch.address_2.as_deref(), Some(""));
        assert_eq!(patch.city.as_deref(), Some("Macon"));
        assert_eq!(patch.name, None);
    }

    #[test]
    fn store_form_requires_name_and_address() {
        let errors = StoreForm::default().validate().unwrap_err();
        assert_eq!(errors.get("name"), Some(STORE_NAME_REQUIRED));
        assert_eq!(errors.get("address"), Some(ADDRESS_REQUIRED));
    }

    #[test]
    fn inventory_form_checks_book_and_price() {
        let form = InventoryForm {
            store_id: 2,
            book_id: None,
            price: "NaN".into(),
        };
        let errors = form.validate(&books()).unwrap_err();
        assert_eq!(errors.get("book_id"), Some(BOOK_REQUIRED));
        assert_eq!(errors.get("price"), Some(PRICE_INVALID));

        let ok = InventoryForm {
            store_id: 2,
            book_id: Some(7),
            price: "12.50".into(),
        }
        .validate(&books())
        .unwrap();
        assert_eq!(ok.store_id, 2);
        assert_eq!(ok.price, 12.5);
    }

    #[test]
    fn price_must_be_positive_and_finite() {
        assert!(parse_price("0").is_err());
        assert!(parse_price("-1").is_err());
        assert!(parse_price("inf").is_err());
        assert_eq!(parse_price("9.99").unwrap(), 9.99);
    }

    #[test]
    fn display_lists_fields_in_order() {
        let mut errors = ValidationErrors::new();
        errors.add("price", PRICE_INVALID);
        errors.add("book_id", BOOK_REQUIRED);
        errors.add("price", "ignored");
        assert_eq!(
            errors.to_string(),
            "book_id: Please select a book; price: Price must be a valid positive number"
        );
    }

    #[test]
    fn login_form_requires_both_fields() {
        let errors = LoginForm {
            email: "  ".into(),
            password: String::new(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.get("email"), Some(EMAIL_REQUIRED));
        assert_eq!(errors.get("password"), Some(PASSWORD_REQUIRED));
    }

    #[test]
    fn login_form_checks_email_shape_and_password_length() {
        let errors = LoginForm {
            email: "admin@library".into(),
            password: "abc12".into(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.get("email"), Some(EMAIL_INVALID));
        assert_eq!(errors.get("password"), Some(PASSWORD_TOO_SHORT));

        let ok = LoginForm {
            email: "admin@library.com".into(),
            password: "admin123".into(),
        };
        assert_eq!(ok.validate(), Ok(()));
    }

    #[test]
    fn email_shape_matches_anywhere_without_spaces() {
        assert!(looks_like_email("a@b.c"));
        assert!(looks_like_email("  mail me at a@b.co please"));
        assert!(!looks_like_email("@b.c"));
        assert!(!looks_like_email("a@.c"));
        assert!(!looks_like_email("a@b."));
        assert!(!looks_like_email("a @b.c"));
        assert!(!looks_like_email("a@b .c"));
    }
}
