//! Configuration management.
//!
//! Settings come from an optional TOML file plus `LANGUE_FACETS_*`
//! environment overrides (`LANGUE_FACETS_LISTING__DEBOUNCE_MS=150`).
//!
//! ```toml
//! [listing]
//! debounce_ms = 300
//! transition_ms = 300
//! stagger_ms = 100
//! default_sort = "-ano_publicacao"
//! locale = "pt-BR"
//!
//! [listing.placeholder]
//! title = "Nenhuma publicação encontrada"
//!
//! [fields]
//! title = "titulo"
//! authors = "organizadores"
//! category = "categoria"
//! year = "ano"
//!
//! [notify]
//! base_url = "http://localhost:8000"
//! endpoint = "/publicacoes/incrementar-download/{id}/"
//! timeout_secs = 10
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::Placeholder;
use crate::models::{FieldMapping, SortSpec};

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "LANGUE_FACETS";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Controller timing and defaults
    #[serde(default)]
    pub listing: ListingConfig,

    /// Record attribute names
    #[serde(default)]
    pub fields: FieldMapping,

    /// Download-increment endpoint
    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listing controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Quiet window for free-text search
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Hide transition length; cards leave layout after it
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,

    /// Delay between consecutive card entrances
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    #[serde(default)]
    pub default_sort: SortSpec,

    /// Collation locale for title sorting
    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default)]
    pub placeholder: Placeholder,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            transition_ms: default_transition_ms(),
            stagger_ms: default_stagger_ms(),
            default_sort: SortSpec::default(),
            locale: default_locale(),
            placeholder: Placeholder::default(),
        }
    }
}

impl ListingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_transition_ms() -> u64 {
    300
}

fn default_stagger_ms() -> u64 {
    100
}

fn default_locale() -> String {
    crate::engine::DEFAULT_LOCALE.to_string()
}

/// Download notification endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path template; `{id}` is replaced by the item id
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Sent as `X-CSRFToken`
    #[serde(default)]
    pub csrf_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            csrf_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_endpoint() -> String {
    "/publicacoes/incrementar-download/{id}/".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find the first existing config file among the usual locations
pub fn find_config_file() -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from("langue-facets.toml")];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("langue-facets").join("config.toml"));
    }
    candidates.into_iter().find(|path| path.is_file())
}

/// Render a configuration as TOML
pub fn to_toml(config: &Config) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}
