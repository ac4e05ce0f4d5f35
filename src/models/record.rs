//! Raw card records as supplied by the hosting page, and the field mapping
//! that turns them into [`Item`]s.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::item::{Item, ItemBuilder, ItemId};

/// One pre-rendered card as the page exposes it: its id, its `data-*`
/// attributes and the text of its meta fragments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: ItemId,

    /// Attribute name to value, e.g. `titulo`, `organizadores`
    #[serde(default)]
    pub data: HashMap<String, String>,

    /// Free-text meta fragments, one of which may carry the download count
    #[serde(default)]
    pub meta: Vec<String>,
}

impl RawRecord {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Add a data attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Add a meta fragment
    pub fn meta(mut self, fragment: impl Into<String>) -> Self {
        self.meta.push(fragment.into());
        self
    }

    fn get(&self, name: &str) -> &str {
        self.data.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Which record attribute feeds which item field.
///
/// The publications page and the bibliographic-productions page share the
/// same engine; only this mapping differs between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_authors")]
    pub authors: String,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default = "default_year")]
    pub year: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            title: default_title(),
            authors: default_authors(),
            category: default_category(),
            year: default_year(),
        }
    }
}

fn default_title() -> String {
    "titulo".to_string()
}

fn default_authors() -> String {
    "organizadores".to_string()
}

fn default_category() -> String {
    "categoria".to_string()
}

fn default_year() -> String {
    "ano".to_string()
}

impl FieldMapping {
    /// Build an item from a record; missing attributes read as empty text
    pub fn to_item(&self, record: &RawRecord) -> Item {
        ItemBuilder::new(record.id.clone(), record.get(&self.title))
            .authors(record.get(&self.authors))
            .category(record.get(&self.category))
            .year_text(record.get(&self.year))
            .meta(&record.meta)
            .build()
    }

    /// Build the item collection, dropping records whose id was already seen
    pub fn to_items(&self, records: &[RawRecord]) -> Vec<Item> {
        let mut seen = HashSet::new();
        records
            .iter()
            .filter(|record| {
                let fresh = seen.insert(record.id.clone());
                if !fresh {
                    tracing::warn!(id = %record.id, "Duplicate item id, keeping first record");
                }
                fresh
            })
            .map(|record| self.to_item(record))
            .collect()
    }
}

/// Errors that can occur while loading a catalog of records
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed catalog JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load a JSON array of [`RawRecord`]s from disk
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a catalog file and map it to items
pub fn load_catalog(path: &Path, mapping: &FieldMapping) -> Result<Vec<Item>, CatalogError> {
    let records = load_records(path)?;
    tracing::debug!(count = records.len(), path = %path.display(), "Loaded catalog records");
    Ok(mapping.to_items(&records))
}
