//! The presentation seam between the controller and the page.
//!
//! The controller never touches markup directly; it drives a [`ListingView`].
//! [`MemoryView`] is a headless implementation that records the resulting
//! state of every card, used by the CLI and by tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::highlight::{Fragment, Node};
use crate::models::{Item, ItemId, SortSpec};

/// Visual transition a card should start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Fade and slide into place
    Show,
    /// Fade and slide out; layout removal follows separately
    Hide,
    /// First-load entrance, starting after `delay`
    Entrance { delay: Duration },
}

/// The "no results" node inserted into the container on an empty result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    #[serde(default = "default_placeholder_title")]
    pub title: String,

    #[serde(default = "default_placeholder_message")]
    pub message: String,
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            title: default_placeholder_title(),
            message: default_placeholder_message(),
        }
    }
}

fn default_placeholder_title() -> String {
    "Nenhuma publicação encontrada".to_string()
}

fn default_placeholder_message() -> String {
    "Não há publicações que correspondam aos filtros selecionados. Tente ajustar os critérios de busca."
        .to_string()
}

/// Banner describing the last text search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSummary {
    /// The term as typed (trimmed)
    pub term: String,
    /// Number of visible items
    pub matches: usize,
}

impl SearchSummary {
    pub fn has_results(&self) -> bool {
        self.matches > 0
    }
}

/// Presentation callbacks the controller reconciles against.
///
/// Implementations must tolerate ids they do not know (ignore them).
pub trait ListingView {
    /// Start a visual transition on a card
    fn begin_transition(&mut self, id: &ItemId, transition: Transition);

    /// Put a card in or take it out of layout flow
    fn set_in_flow(&mut self, id: &ItemId, in_flow: bool);

    /// Set a card's layout order hint
    fn set_order(&mut self, id: &ItemId, order: usize);

    /// Insert the "no results" node into the container
    fn insert_placeholder(&mut self, placeholder: &Placeholder);

    /// Remove the "no results" node
    fn remove_placeholder(&mut self);

    /// The card's own text subtree, for highlighting
    fn content_mut(&mut self, id: &ItemId) -> Option<&mut Fragment>;

    /// Show or hide the search summary banner
    fn show_search_summary(&mut self, _summary: Option<&SearchSummary>) {}

    /// Write cleared values back to the page controls: blank search box
    /// and facet selects, `sort` in the sort select
    fn reset_controls(&mut self, _sort: &SortSpec) {}
}

/// Values shown by the page controls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlValues {
    pub search: String,
    pub category: String,
    pub year: String,
    pub sort: String,
}

/// Last visual state a card was put into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visual {
    /// As rendered by the page, no transition started
    Static,
    Entering { delay: Duration },
    Showing,
    Hiding,
}

impl Visual {
    /// Opacity once the current transition has finished
    pub fn resting_opacity(&self) -> f32 {
        match self {
            Visual::Hiding => 0.0,
            Visual::Static | Visual::Entering { .. } | Visual::Showing => 1.0,
        }
    }
}

/// Headless card state
#[derive(Debug, Clone)]
pub struct Card {
    pub id: ItemId,
    pub in_flow: bool,
    pub order: Option<usize>,
    pub visual: Visual,
    pub content: Fragment,
}

/// In-memory container of cards, in document order
#[derive(Debug, Clone, Default)]
pub struct MemoryView {
    cards: Vec<Card>,
    index: HashMap<ItemId, usize>,
    placeholder: Option<Placeholder>,
    placeholder_inserts: usize,
    summary: Option<SearchSummary>,
    controls: ControlValues,
}

impl MemoryView {
    /// Build cards from items, content laid out as title, authors and meta
    pub fn from_items(items: &[Item]) -> Self {
        let mut view = Self::default();
        for item in items {
            view.push_card(item.id().clone(), card_content(item));
        }
        view
    }

    /// Append a card with custom content
    pub fn push_card(&mut self, id: ItemId, content: Fragment) {
        self.index.insert(id.clone(), self.cards.len());
        self.cards.push(Card {
            id,
            in_flow: true,
            order: None,
            visual: Visual::Static,
            content,
        });
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: &ItemId) -> Option<&Card> {
        self.index.get(id).map(|&i| &self.cards[i])
    }

    fn card_mut(&mut self, id: &ItemId) -> Option<&mut Card> {
        match self.index.get(id) {
            Some(&i) => self.cards.get_mut(i),
            None => None,
        }
    }

    /// Ids of in-flow cards, by order hint then document order
    pub fn visible_in_order(&self) -> Vec<ItemId> {
        let mut cards: Vec<&Card> = self.cards.iter().filter(|c| c.in_flow).collect();
        cards.sort_by_key(|c| c.order.unwrap_or(usize::MAX));
        cards.into_iter().map(|c| c.id.clone()).collect()
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        self.placeholder.as_ref()
    }

    /// How many times a placeholder was inserted over the view's lifetime
    pub fn placeholder_inserts(&self) -> usize {
        self.placeholder_inserts
    }

    pub fn search_summary(&self) -> Option<&SearchSummary> {
        self.summary.as_ref()
    }

    /// Control values as last written back by the controller
    pub fn controls(&self) -> &ControlValues {
        &self.controls
    }

    /// Simulate the user editing the page controls
    pub fn controls_mut(&mut self) -> &mut ControlValues {
        &mut self.controls
    }
}

fn card_content(item: &Item) -> Fragment {
    let mut nodes = vec![Node::element("h3", vec![Node::text(item.title())])];
    if !item.authors().is_empty() {
        nodes.push(Node::element("p", vec![Node::text(item.authors())]));
    }
    if !item.category().is_empty() {
        nodes.push(Node::element("span", vec![Node::text(item.category())]));
    }
    Fragment::new(nodes)
}

impl ListingView for MemoryView {
    fn begin_transition(&mut self, id: &ItemId, transition: Transition) {
        if let Some(card) = self.card_mut(id) {
            card.visual = match transition {
                Transition::Show => Visual::Showing,
                Transition::Hide => Visual::Hiding,
                Transition::Entrance { delay } => Visual::Entering { delay },
            };
        }
    }

    fn set_in_flow(&mut self, id: &ItemId, in_flow: bool) {
        if let Some(card) = self.card_mut(id) {
            card.in_flow = in_flow;
        }
    }

    fn set_order(&mut self, id: &ItemId, order: usize) {
        if let Some(card) = self.card_mut(id) {
            card.order = Some(order);
        }
    }

    fn insert_placeholder(&mut self, placeholder: &Placeholder) {
        self.placeholder = Some(placeholder.clone());
        self.placeholder_inserts += 1;
    }

    fn remove_placeholder(&mut self) {
        self.placeholder = None;
    }

    fn content_mut(&mut self, id: &ItemId) -> Option<&mut Fragment> {
        self.card_mut(id).map(|card| &mut card.content)
    }

    fn show_search_summary(&mut self, summary: Option<&SearchSummary>) {
        self.summary = summary.cloned();
    }

    fn reset_controls(&mut self, sort: &SortSpec) {
        self.controls = ControlValues {
            sort: sort.to_string(),
            ..ControlValues::default()
        };
    }
}
