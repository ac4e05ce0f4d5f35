//! Core data models for listing items and filter criteria.

mod criteria;
mod item;
mod record;

pub use criteria::{Facet, FilterCriteria, SortDirection, SortKey, SortSpec};
pub use item::{parse_download_count, parse_year, Item, ItemBuilder, ItemId};
pub use record::{load_catalog, load_records, CatalogError, FieldMapping, RawRecord};
