//! # Langue Facets
//!
//! Client-side faceted listing for catalogs of publications: free-text
//! search, category and year facets, sorting, and the presentation glue that
//! keeps a rendered list of cards in step with the result.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Items, filter criteria and catalog records
//! - [`engine`]: The pure filter/sort function and year grouping
//! - [`controller`]: Debounced input, reconciliation against a
//!   [`ListingView`](controller::ListingView), highlighting and timers
//! - [`utils`]: HTTP client and the download-increment notifier
//! - [`config`]: Configuration management

pub mod config;
pub mod controller;
pub mod engine;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use controller::{ListingController, ListingView, MemoryView, PageHooks, UiEvent};
pub use engine::{compute_visible, ListingEngine};
pub use models::{FilterCriteria, Item, ItemBuilder, ItemId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
