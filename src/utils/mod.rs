//! Utility modules supporting the listing.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts
//! - [`DownloadNotifier`]: fire-and-forget download-increment requests
//! - [`DownloadSink`]: the seam the controller reports downloads through
//!
//! # Download notifications
//!
//! ```rust,no_run
//! use langue_facets::config::NotifyConfig;
//! use langue_facets::models::ItemId;
//! use langue_facets::utils::DownloadNotifier;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let notifier = DownloadNotifier::from_config(&NotifyConfig::default())?;
//! notifier.send(&ItemId::from("42")).await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod notify;

pub use http::HttpClient;
pub use notify::{DownloadNotifier, DownloadSink, NotifyError};
