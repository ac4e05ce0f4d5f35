//! Item model representing one listing card (a publication).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Stable identifier of an item, unique within a collection.
///
/// Source data may carry the id as a JSON string or number; both
/// deserialize to the same textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct ItemId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for ItemId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => ItemId(s),
            RawId::Number(n) => ItemId(n.to_string()),
        }
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        ItemId(n.to_string())
    }
}

impl ItemId {
    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A displayable record with filterable and sortable attributes.
///
/// Items are immutable once built; the lower-cased search corpus is derived
/// from title, authors and category at construction time.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    id: ItemId,
    title: String,
    authors: String,
    category: String,
    year: i32,
    year_text: String,
    download_count: u64,
    #[serde(skip)]
    has_year: bool,
    #[serde(skip)]
    search_text: String,
}

impl Item {
    /// Create an item with the required fields
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>) -> Self {
        ItemBuilder::new(id, title).build()
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Authors or organizers
    pub fn authors(&self) -> &str {
        &self.authors
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Parsed year, 0 when the source text was not a number
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Whether the source year text began with a number
    pub fn has_year(&self) -> bool {
        self.has_year
    }

    /// Year exactly as it appeared in the source record
    pub fn year_text(&self) -> &str {
        &self.year_text
    }

    pub fn download_count(&self) -> u64 {
        self.download_count
    }

    /// Lower-cased `title authors category` corpus used by text search
    pub fn search_text(&self) -> &str {
        &self.search_text
    }
}

/// Builder for constructing Item objects
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    id: ItemId,
    title: String,
    authors: String,
    category: String,
    year_text: String,
    download_count: u64,
}

impl ItemBuilder {
    /// Create a new builder with required fields
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: String::new(),
            category: String::new(),
            year_text: String::new(),
            download_count: 0,
        }
    }

    /// Set authors or organizers
    pub fn authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = authors.into();
        self
    }

    /// Set category tag
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set year from its textual form
    pub fn year_text(mut self, year: impl Into<String>) -> Self {
        self.year_text = year.into();
        self
    }

    /// Set year from a number
    pub fn year(self, year: i32) -> Self {
        self.year_text(year.to_string())
    }

    /// Set the download count directly
    pub fn download_count(mut self, count: u64) -> Self {
        self.download_count = count;
        self
    }

    /// Set the download count from the card's meta fragments
    pub fn meta<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.download_count = parse_download_count(fragments);
        self
    }

    /// Build the Item
    pub fn build(self) -> Item {
        let search_text =
            format!("{} {} {}", self.title, self.authors, self.category).to_lowercase();
        let parsed = leading_integer(&self.year_text);
        Item {
            year: parsed.unwrap_or(0),
            has_year: parsed.is_some(),
            id: self.id,
            title: self.title,
            authors: self.authors,
            category: self.category,
            year_text: self.year_text,
            download_count: self.download_count,
            search_text,
        }
    }
}

/// Parse the leading integer of a year string, 0 when there is none.
///
/// `"2021"`, `" 2021 "` and `"2021a"` all give 2021.
pub fn parse_year(text: &str) -> i32 {
    leading_integer(text).unwrap_or(0)
}

fn leading_integer(text: &str) -> Option<i32> {
    let trimmed = text.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

fn downloads_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)\s*download").expect("valid downloads pattern"))
}

fn first_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid number pattern"))
}

/// Extract a download count from free-text meta fragments.
///
/// The first fragment mentioning "download" wins. A number directly followed
/// by the word is preferred, otherwise the first number in that fragment is
/// used. No such fragment, no number, or overflow all give 0.
pub fn parse_download_count<I, S>(fragments: I) -> u64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for fragment in fragments {
        let text = fragment.as_ref();
        if !text.to_lowercase().contains("download") {
            continue;
        }
        let digits = downloads_regex()
            .captures(text)
            .and_then(|c| c.get(1))
            .or_else(|| first_number_regex().find(text))
            .map(|m| m.as_str());
        return digits.and_then(|d| d.parse().ok()).unwrap_or(0);
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_builder() {
        let item = ItemBuilder::new("42", "Estudos do Discurso")
            .authors("Maria Silva; João Souza")
            .category("LIVRO")
            .year(2021)
            .meta(["Publicado em 2021", "12 downloads"])
            .build();

        assert_eq!(item.id().as_str(), "42");
        assert_eq!(item.year(), 2021);
        assert_eq!(item.year_text(), "2021");
        assert_eq!(item.download_count(), 12);
        assert_eq!(
            item.search_text(),
            "estudos do discurso maria silva; joão souza livro"
        );
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2023"), 2023);
        assert_eq!(parse_year(" 2019 "), 2019);
        assert_eq!(parse_year("2020a"), 2020);
        assert_eq!(parse_year(""), 0);
        assert_eq!(parse_year("sem data"), 0);
    }

    #[test]
    fn test_parse_download_count() {
        assert_eq!(parse_download_count(["5 downloads"]), 5);
        assert_eq!(parse_download_count(["PDF", "1 download"]), 1);
        assert_eq!(parse_download_count(["Downloads: 37"]), 37);
        assert_eq!(parse_download_count(["2021", "sem contagem"]), 0);
        assert_eq!(parse_download_count(["download indisponível"]), 0);
        assert_eq!(parse_download_count(Vec::<String>::new()), 0);
    }

    #[test]
    fn test_download_count_overflow_is_zero() {
        assert_eq!(parse_download_count(["99999999999999999999999 downloads"]), 0);
    }

    #[test]
    fn test_item_id_from_json_number_or_string() {
        let ids: Vec<ItemId> = serde_json::from_str(r#"[7, "abc"]"#).unwrap();
        assert_eq!(ids, vec![ItemId::from("7"), ItemId::from("abc")]);
    }
}
