//! Filter/sort engine.
//!
//! A pure function of (items, criteria) to the ordered visible subset:
//!
//! 1. **Filter**: search text, category and year predicates, AND-combined.
//!    An unset criterion is skipped rather than matching nothing.
//! 2. **Sort**: by year, title (locale collation) or download count, with
//!    the direction applied by reversing the comparator. The sort is stable,
//!    so equal items keep their source order.
//!
//! The engine never mutates its input and keeps no state between calls.
//!
//! ```rust
//! use langue_facets::engine::compute_visible;
//! use langue_facets::models::{FilterCriteria, ItemBuilder};
//!
//! let items = vec![
//!     ItemBuilder::new("1", "Estudos do Discurso").year(2021).build(),
//!     ItemBuilder::new("2", "Análise Crítica").year(2023).build(),
//! ];
//! let visible = compute_visible(&items, &FilterCriteria::new());
//! assert_eq!(visible[0].title(), "Análise Crítica");
//! ```

mod collation;

pub use collation::{Collation, DEFAULT_LOCALE};

use std::cmp::Ordering;

use crate::models::{Facet, FilterCriteria, Item, SortDirection, SortKey};

/// Filter/sort engine holding the title collation for its locale.
#[derive(Debug, Default)]
pub struct ListingEngine {
    collation: Collation,
}

impl ListingEngine {
    /// Create an engine collating titles for `locale`
    pub fn new(locale: &str) -> Self {
        Self {
            collation: Collation::new(locale),
        }
    }

    pub fn collation(&self) -> &Collation {
        &self.collation
    }

    /// Compute the visible, ordered subset of `items` for `criteria`
    pub fn compute_visible<'a>(&self, items: &'a [Item], criteria: &FilterCriteria) -> Vec<&'a Item> {
        let term = criteria.normalized_term();
        let mut visible: Vec<&Item> = items
            .iter()
            .filter(|item| matches_term(item, &term))
            .filter(|item| matches_category(item, &criteria.category))
            .filter(|item| matches_year(item, &criteria.year))
            .collect();

        let key = &criteria.sort.key;
        if !matches!(key, SortKey::Other(_)) {
            visible.sort_by(|a, b| {
                let ordering = self.compare(a, b, key);
                match criteria.sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        visible
    }

    fn compare(&self, a: &Item, b: &Item, key: &SortKey) -> Ordering {
        match key {
            SortKey::Year => a.year().cmp(&b.year()),
            SortKey::Title => self.collation.compare(a.title(), b.title()),
            SortKey::DownloadCount => a.download_count().cmp(&b.download_count()),
            SortKey::Other(_) => Ordering::Equal,
        }
    }
}

/// Compute the visible subset with a default (pt-BR) engine.
///
/// Builds the collator on every call; hold a [`ListingEngine`] when
/// recomputing repeatedly.
pub fn compute_visible<'a>(items: &'a [Item], criteria: &FilterCriteria) -> Vec<&'a Item> {
    ListingEngine::default().compute_visible(items, criteria)
}

/// Whether `item` passes every active filter in `criteria`
pub fn matches(item: &Item, criteria: &FilterCriteria) -> bool {
    matches_term(item, &criteria.normalized_term())
        && matches_category(item, &criteria.category)
        && matches_year(item, &criteria.year)
}

fn matches_term(item: &Item, term: &str) -> bool {
    term.is_empty() || item.search_text().contains(term)
}

fn matches_category(item: &Item, category: &Facet) -> bool {
    match category.value() {
        None => true,
        Some(value) => item.category() == value,
    }
}

fn matches_year(item: &Item, year: &Facet) -> bool {
    match year.value() {
        None => true,
        Some(value) => match value.trim().parse::<i32>() {
            Ok(wanted) => item.has_year() && item.year() == wanted,
            Err(_) => item.year_text() == value,
        },
    }
}

/// Visible items sharing one year, in result order
#[derive(Debug, Clone, serde::Serialize)]
pub struct YearGroup<'a> {
    pub year: i32,
    pub items: Vec<&'a Item>,
}

/// Group a visible result by year.
///
/// Groups appear in the order their first item appears in `visible`, so a
/// year-descending result yields newest-first sections.
pub fn group_by_year<'a>(visible: &[&'a Item]) -> Vec<YearGroup<'a>> {
    let mut groups: Vec<YearGroup<'a>> = Vec::new();
    for item in visible {
        match groups.iter_mut().find(|g| g.year == item.year()) {
            Some(group) => group.items.push(*item),
            None => groups.push(YearGroup {
                year: item.year(),
                items: vec![*item],
            }),
        }
    }
    groups
}
