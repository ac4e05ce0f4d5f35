//! Filter criteria and sort specification models.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// A single facet filter: either no filter or an exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    /// No filter; every item passes
    #[default]
    Any,
    /// Keep only items whose facet equals this value
    Only(String),
}

impl Facet {
    /// Build a facet from a select control's value; blank means no filter
    pub fn from_control(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            Facet::Any
        } else {
            Facet::Only(value.to_string())
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Facet::Any => None,
            Facet::Only(v) => Some(v),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Facet::Any)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Field the visible items are ordered by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortKey {
    Year,
    Title,
    DownloadCount,
    /// A key the listing does not know; leaves the filtered order untouched
    Other(String),
}

impl SortKey {
    /// Field name as used by the page's sort select
    pub fn token(&self) -> &str {
        match self {
            SortKey::Year => "ano_publicacao",
            SortKey::Title => "titulo",
            SortKey::DownloadCount => "downloads",
            SortKey::Other(s) => s,
        }
    }

    fn from_field(field: &str) -> Self {
        match field {
            "ano_publicacao" | "ano" | "year" => SortKey::Year,
            "titulo" | "title" => SortKey::Title,
            "downloads" | "download_count" | "downloadCount" => SortKey::DownloadCount,
            other => SortKey::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Sort key plus direction, written on the page as `-ano_publicacao`,
/// `titulo`, `downloads` and so on. A leading `-` means descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn ascending(key: SortKey) -> Self {
        Self::new(key, SortDirection::Ascending)
    }

    pub fn descending(key: SortKey) -> Self {
        Self::new(key, SortDirection::Descending)
    }
}

impl Default for SortSpec {
    /// Newest first
    fn default() -> Self {
        Self::descending(SortKey::Year)
    }
}

impl FromStr for SortSpec {
    type Err = Infallible;

    /// Blank input gives the default spec.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        Ok(match s.strip_prefix('-') {
            Some(field) => Self::descending(SortKey::from_field(field)),
            None => Self::ascending(SortKey::from_field(s)),
        })
    }
}

impl From<String> for SortSpec {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(spec) => spec,
            Err(never) => match never {},
        }
    }
}

impl From<SortSpec> for String {
    fn from(spec: SortSpec) -> Self {
        spec.to_string()
    }
}

impl std::fmt::Display for SortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{}", self.key),
            SortDirection::Descending => write!(f, "-{}", self.key),
        }
    }
}

/// The current combination of search text, facets and sort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Free-text search term; compared lower-cased, empty matches everything
    #[serde(default)]
    pub search_term: String,

    /// Category facet
    #[serde(default)]
    pub category: Facet,

    /// Year facet
    #[serde(default)]
    pub year: Facet,

    /// Sort key and direction
    #[serde(default)]
    pub sort: SortSpec,
}

impl FilterCriteria {
    /// Criteria with every filter unset and the default sort
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search term
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Filter by category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Facet::Only(category.into());
        self
    }

    /// Filter by year
    pub fn year(mut self, year: impl ToString) -> Self {
        self.year = Facet::Only(year.to_string());
        self
    }

    /// Set sort key and direction
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    /// Lower-cased, trimmed search term
    pub fn normalized_term(&self) -> String {
        self.search_term.trim().to_lowercase()
    }

    /// True when no filter is active (the sort may still differ from default)
    pub fn is_unfiltered(&self) -> bool {
        self.normalized_term().is_empty() && self.category.is_any() && self.year.is_any()
    }
}
