//! Categories and locations shown by the client's browse screens.
//!
//! Read-only over HTTP; populated at startup from an optional TOML seed file.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::storage::{Batch, Storage, StorageError};

const CATEGORY_PREFIX: &str = "category:";
const LOCATION_PREFIX: &str = "location:";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("cannot read catalog seed: {0}")]
    Read(#[from] std::io::Error),
    #[error("cannot parse catalog seed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub image: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Location {
    pub id: u32,
    pub image: String,
}

/// Contents of a seed file:
///
/// ```toml
/// [[categories]]
/// id = 1
/// name = "Beach"
/// image = "beach.png"
///
/// [[locations]]
/// id = 1
/// image = "hanoi.png"
/// ```
#[derive(Deserialize, Debug, Default)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl CatalogSeed {
    pub fn load(path: &str) -> Result<Self, CatalogError> {
        let s = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&s)?)
    }
}

// zero-padded so key order is id order
fn category_key(id: u32) -> String {
    format!("{}{:010}", CATEGORY_PREFIX, id)
}

fn location_key(id: u32) -> String {
    format!("{}{:010}", LOCATION_PREFIX, id)
}

pub struct Catalog {
    storage: Arc<Storage>,
}

impl Catalog {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn categories(&self) -> Result<Vec<Category>, StorageError> {
        self.storage.scan_prefix(CATEGORY_PREFIX)
    }

    pub fn locations(&self) -> Result<Vec<Location>, StorageError> {
        self.storage.scan_prefix(LOCATION_PREFIX)
    }

    /// Upsert everything in `seed`; returns the number of entries written.
    pub fn seed(&self, seed: &CatalogSeed) -> Result<usize, StorageError> {
        let mut batch = Batch::default();
        for c in &seed.categories {
            batch.put(&category_key(c.id), c)?;
        }
        for l in &seed.locations {
            batch.put(&location_key(l.id), l)?;
        }
        self.storage.commit(batch)?;
        Ok(seed.categories.len() + seed.locations.len())
    }
}
