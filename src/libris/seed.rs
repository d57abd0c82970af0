//! Seed sources: the static JSON used to populate a collection on first run.
//!
//! A seed document is either a JSON array of records or a single record;
//! [`Collections`](crate::store::collections::Collections) coerces the latter
//! into a one-element collection.

use crate::error::{LibrisError, Result};
use crate::model::EntityKind;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

pub trait SeedFetcher: Send + Sync {
    /// Fetch and parse the seed document for one collection.
    fn fetch(&self, kind: EntityKind) -> Result<Value>;

    /// Human-readable location, for logs.
    fn location(&self, kind: EntityKind) -> String;
}

/// Picks a seed source from a configured location: an `http(s)://` base URL,
/// a directory, or the bundled data when unset.
pub fn from_location(location: Option<&str>) -> Box<dyn SeedFetcher> {
    match location {
        Some(loc) if loc.starts_with("http://") || loc.starts_with("https://") => {
            Box::new(HttpSeeds::new(loc))
        }
        Some(loc) => Box::new(DirSeeds::new(loc)),
        None => Box::new(BundledSeeds),
    }
}

/// Seed data compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSeeds;

impl BundledSeeds {
    fn raw(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::Book => include_str!("../../data/books.json"),
            EntityKind::Author => include_str!("../../data/authors.json"),
            EntityKind::Store => include_str!("../../data/stores.json"),
            EntityKind::InventoryItem => include_str!("../../data/inventory.json"),
        }
    }
}

impl SeedFetcher for BundledSeeds {
    fn fetch(&self, kind: EntityKind) -> Result<Value> {
        Ok(serde_json::from_str(Self::raw(kind))?)
    }

    fn location(&self, kind: EntityKind) -> String {
        format!("bundled:{}.json", kind.collection())
    }
}

/// `<dir>/<collection>.json`
#[derive(Debug, Clone)]
pub struct DirSeeds {
    dir: PathBuf,
}

impl DirSeeds {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.collection()))
    }
}

impl SeedFetcher for DirSeeds {
    fn fetch(&self, kind: EntityKind) -> Result<Value> {
        let path = self.path(kind);
        // An unreachable seed is a fetch failure, whatever the medium
        let content = fs::read_to_string(&path)
            .map_err(|e| LibrisError::Network(format!("{}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn location(&self, kind: EntityKind) -> String {
        self.path(kind).display().to_string()
    }
}

/// `<base>/<collection>.json` over HTTP.
pub struct HttpSeeds {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpSeeds {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl SeedFetcher for HttpSeeds {
    fn fetch(&self, kind: EntityKind) -> Result<Value> {
        let response = self
            .client
            .get(self.location(kind))
            .send()?
            .error_for_status()?;
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn location(&self, kind: EntityKind) -> String {
        format!("{}/{}.json", self.base, kind.collection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_seeds_parse_for_every_collection() {
        for kind in EntityKind::ALL {
            let value = BundledSeeds.fetch(kind).unwrap();
            assert!(value.is_array(), "{} seed should be an array", kind);
        }
    }

    #[test]
    fn dir_seeds_read_collection_files() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(
            temp.path().join("authors.json"),
            r#"{"id": 1, "first_name": "Ada", "last_name": "Lovelace"}"#,
        )
        .unwrap();

        let seeds = DirSeeds::new(temp.path());
        let value = seeds.fetch(EntityKind::Author).unwrap();
        assert_eq!(value["first_name"], "Ada");
    }

    #[test]
    fn missing_seed_file_is_a_network_failure() {
        let temp = tempfile::tempdir().unwrap();
        let seeds = DirSeeds::new(temp.path());
        assert!(matches!(
            seeds.fetch(EntityKind::Store),
            Err(LibrisError::Network(_))
        ));
    }

    #[test]
    fn malformed_seed_file_is_a_parse_failure() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("books.json"), "[{").unwrap();
        let seeds = DirSeeds::new(temp.path());
        assert!(matches!(
            seeds.fetch(EntityKind::Book),
            Err(LibrisError::Parse(_))
        ));
    }

    #[test]
    fn location_picks_the_source_kind() {
        let http = from_location(Some("https://example.test/data/"));
        assert_eq!(
            http.location(EntityKind::Book),
            "https://example.test/data/books.json"
        );
        let bundled = from_location(None);
        assert_eq!(
            bundled.location(EntityKind::InventoryItem),
            "bundled:inventory.json"
        );
    }
}
