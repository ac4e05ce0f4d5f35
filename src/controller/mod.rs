//! Presentation controller: bridges page events to the engine and
//! reconciles a [`ListingView`] to each result.
//!
//! The controller is single-threaded and driven from outside: every input
//! event goes through [`ListingController::handle`], and timer work
//! (the search debounce and delayed layout removals) runs from
//! [`ListingController::tick`]. [`ListingController::next_deadline`] tells
//! the caller when the next tick is due; [`driver::run`] does this with
//! tokio timers.
//!
//! # Recomputation
//!
//! Each trigger snapshots the current control values into a fresh
//! [`FilterCriteria`], runs the engine and then:
//!
//! 1. starts a hide transition on cards that dropped out and schedules their
//!    removal from layout once the transition has ended;
//! 2. puts visible cards back in flow, sets their order hint to their rank
//!    and starts a show transition on those that were hidden;
//! 3. inserts or removes the single "no results" placeholder;
//! 4. clears old highlights and highlights the search term in visible cards.
//!
//! Every recomputation bumps a generation counter. A delayed removal carries
//! the generation that started it and is dropped unless the card is still
//! hiding from that same generation, so a card shown again in the meantime
//! is never pulled out of layout.

mod debounce;
pub mod driver;
mod highlight;
mod timeline;
mod view;

pub use debounce::Debouncer;
pub use highlight::{mark_plain, Fragment, Node};
pub use timeline::{PendingRemoval, Timeline};
pub use view::{
    Card, ControlValues, ListingView, MemoryView, Placeholder, SearchSummary, Transition,
    Visual,
};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ListingConfig;
use crate::engine::ListingEngine;
use crate::models::{Facet, FilterCriteria, Item, ItemId, SortSpec};
use crate::utils::DownloadSink;

bitflags::bitflags! {
    /// Page controls that were found and can be wired
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageHooks: u8 {
        const SEARCH_INPUT = 1 << 0;
        const SEARCH_TRIGGER = 1 << 1;
        const CATEGORY_SELECT = 1 << 2;
        const YEAR_SELECT = 1 << 3;
        const SORT_SELECT = 1 << 4;
    }
}

impl PageHooks {
    const NAMES: [(PageHooks, &'static str); 5] = [
        (PageHooks::SEARCH_INPUT, "search input"),
        (PageHooks::SEARCH_TRIGGER, "search button"),
        (PageHooks::CATEGORY_SELECT, "category filter"),
        (PageHooks::YEAR_SELECT, "year filter"),
        (PageHooks::SORT_SELECT, "sort select"),
    ];

    fn describe(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(hook, _)| *hook == self)
            .map(|(_, name)| *name)
            .unwrap_or("control")
    }
}

/// Input from the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The search box's value changed (debounced)
    SearchInput(String),
    /// Enter pressed in the search box
    SearchSubmit,
    /// Explicit search button clicked
    SearchTrigger,
    CategoryChanged(String),
    YearChanged(String),
    SortChanged(String),
    /// Clear every control to its default and recompute
    ResetFilters,
    /// The user downloaded the asset of an item
    Download(ItemId),
}

/// Current values of the page controls
#[derive(Debug, Clone, PartialEq, Eq)]
struct Controls {
    search: String,
    category: String,
    year: String,
    sort: String,
}

impl Controls {
    fn cleared(default_sort: &SortSpec) -> Self {
        Self {
            search: String::new(),
            category: String::new(),
            year: String::new(),
            sort: default_sort.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardPhase {
    Shown,
    Hiding { generation: u64 },
    Hidden,
}

/// Faceted listing controller owning its criteria, controls and view
pub struct ListingController<V: ListingView> {
    items: Vec<Item>,
    engine: ListingEngine,
    view: V,
    hooks: PageHooks,
    controls: Controls,
    criteria: FilterCriteria,
    default_sort: SortSpec,
    transition: Duration,
    placeholder: Placeholder,
    phases: HashMap<ItemId, CardPhase>,
    visible: Vec<ItemId>,
    generation: u64,
    debounce: Debouncer,
    removals: Timeline,
    placeholder_shown: bool,
    summary: Option<SearchSummary>,
    downloads: Option<Arc<dyn DownloadSink>>,
}

impl<V: ListingView> ListingController<V> {
    /// Wire the listing to a page.
    ///
    /// Returns `None` (after logging) when the container is missing; the
    /// rest of the page is unaffected. Missing controls are logged and their
    /// events ignored. Cards play their staggered entrance immediately.
    pub fn mount(
        items: Vec<Item>,
        container: Option<V>,
        hooks: PageHooks,
        config: &ListingConfig,
    ) -> Option<Self> {
        let Some(view) = container else {
            tracing::warn!("Listing container not found, filters not wired");
            return None;
        };

        for hook in PageHooks::all().iter() {
            if !hooks.contains(hook) {
                tracing::warn!("No {} on page, feature disabled", hook.describe());
            }
        }

        let phases = items
            .iter()
            .map(|item| (item.id().clone(), CardPhase::Shown))
            .collect();
        let visible = items.iter().map(|item| item.id().clone()).collect();

        let mut controller = Self {
            engine: ListingEngine::new(&config.locale),
            view,
            hooks,
            controls: Controls::cleared(&config.default_sort),
            criteria: FilterCriteria::new().sort(config.default_sort.clone()),
            default_sort: config.default_sort.clone(),
            transition: config.transition(),
            placeholder: config.placeholder.clone(),
            phases,
            visible,
            generation: 0,
            debounce: Debouncer::new(config.debounce()),
            removals: Timeline::new(),
            placeholder_shown: false,
            summary: None,
            downloads: None,
            items,
        };
        controller.play_entrance(config.stagger());

        tracing::info!(
            items = controller.items.len(),
            hooks = ?controller.hooks,
            "Listing mounted"
        );
        Some(controller)
    }

    /// Attach the download-increment side channel
    pub fn with_downloads(mut self, sink: Arc<dyn DownloadSink>) -> Self {
        self.downloads = Some(sink);
        self
    }

    fn play_entrance(&mut self, stagger: Duration) {
        for (index, item) in self.items.iter().enumerate() {
            let delay = stagger * index as u32;
            self.view
                .begin_transition(item.id(), Transition::Entrance { delay });
        }
    }

    /// Handle one page event at time `now`
    pub fn handle(&mut self, event: UiEvent, now: Instant) {
        match event {
            UiEvent::SearchInput(value) => {
                if self.wired(PageHooks::SEARCH_INPUT) {
                    self.controls.search = value;
                    self.debounce.schedule(now);
                }
            }
            UiEvent::SearchSubmit => {
                if self.wired(PageHooks::SEARCH_INPUT) {
                    self.debounce.cancel();
                    self.recompute(now);
                }
            }
            UiEvent::SearchTrigger => {
                if self.wired(PageHooks::SEARCH_TRIGGER) {
                    self.debounce.cancel();
                    self.recompute(now);
                }
            }
            UiEvent::CategoryChanged(value) => {
                if self.wired(PageHooks::CATEGORY_SELECT) {
                    self.controls.category = value;
                    self.debounce.cancel();
                    self.recompute(now);
                }
            }
            UiEvent::YearChanged(value) => {
                if self.wired(PageHooks::YEAR_SELECT) {
                    self.controls.year = value;
                    self.debounce.cancel();
                    self.recompute(now);
                }
            }
            UiEvent::SortChanged(value) => {
                if self.wired(PageHooks::SORT_SELECT) {
                    self.controls.sort = value;
                    self.debounce.cancel();
                    self.recompute(now);
                }
            }
            UiEvent::ResetFilters => self.reset_filters(now),
            UiEvent::Download(id) => self.notify_download(&id),
        }
    }

    fn wired(&self, hook: PageHooks) -> bool {
        let wired = self.hooks.contains(hook);
        if !wired {
            tracing::debug!("Ignoring event for missing {}", hook.describe());
        }
        wired
    }

    /// Clear every control to its default and recompute immediately
    pub fn reset_filters(&mut self, now: Instant) {
        self.controls = Controls::cleared(&self.default_sort);
        self.view.reset_controls(&self.default_sort);
        self.debounce.cancel();
        self.recompute(now);
    }

    /// Fire the download-increment notification for `id`.
    ///
    /// Never touches filter state.
    pub fn notify_download(&self, id: &ItemId) {
        if !self.phases.contains_key(id) {
            tracing::warn!(%id, "Download for unknown item ignored");
            return;
        }
        match &self.downloads {
            Some(sink) => sink.download_started(id),
            None => tracing::debug!(%id, "No download notifier attached"),
        }
    }

    /// Run timer work due at `now`: delayed removals, then the debounce
    pub fn tick(&mut self, now: Instant) {
        for removal in self.removals.take_due(now) {
            let current = self.phases.get(&removal.id).copied();
            if current == Some(CardPhase::Hiding { generation: removal.generation }) {
                self.view.set_in_flow(&removal.id, false);
                self.phases.insert(removal.id, CardPhase::Hidden);
            } else {
                tracing::trace!(id = %removal.id, generation = removal.generation, "Stale removal dropped");
            }
        }

        if self.debounce.poll(now) {
            self.recompute(now);
        }
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce.deadline(), self.removals.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run every pending timer in order, as if time kept passing
    pub fn run_until_idle(&mut self) {
        while let Some(deadline) = self.next_deadline() {
            self.tick(deadline);
        }
    }

    fn snapshot(&self) -> FilterCriteria {
        let sort = if self.controls.sort.trim().is_empty() {
            self.default_sort.clone()
        } else {
            SortSpec::from(self.controls.sort.clone())
        };
        FilterCriteria {
            search_term: self.controls.search.trim().to_string(),
            category: Facet::from_control(&self.controls.category),
            year: Facet::from_control(&self.controls.year),
            sort,
        }
    }

    /// Recompute the visible set from the current controls and reconcile
    pub fn recompute(&mut self, now: Instant) {
        self.generation += 1;
        let generation = self.generation;
        let criteria = self.snapshot();

        let visible: Vec<ItemId> = self
            .engine
            .compute_visible(&self.items, &criteria)
            .into_iter()
            .map(|item| item.id().clone())
            .collect();
        let rank: HashMap<&ItemId, usize> =
            visible.iter().enumerate().map(|(i, id)| (id, i)).collect();

        for item in &self.items {
            let id = item.id();
            let phase = self.phases.get(id).copied().unwrap_or(CardPhase::Shown);
            match rank.get(id) {
                Some(&order) => {
                    if phase != CardPhase::Shown {
                        self.view.set_in_flow(id, true);
                        self.view.begin_transition(id, Transition::Show);
                        self.phases.insert(id.clone(), CardPhase::Shown);
                    }
                    self.view.set_order(id, order);
                }
                None => {
                    if phase == CardPhase::Shown {
                        self.view.begin_transition(id, Transition::Hide);
                        self.phases
                            .insert(id.clone(), CardPhase::Hiding { generation });
                        self.removals
                            .schedule(now + self.transition, id.clone(), generation);
                    }
                }
            }
        }

        if visible.is_empty() && !self.placeholder_shown {
            self.view.insert_placeholder(&self.placeholder);
            self.placeholder_shown = true;
        } else if !visible.is_empty() && self.placeholder_shown {
            self.view.remove_placeholder();
            self.placeholder_shown = false;
        }

        self.apply_highlights(&visible, &criteria);
        self.update_summary(&criteria, visible.len());

        tracing::debug!(
            generation,
            visible = visible.len(),
            total = self.items.len(),
            sort = %criteria.sort,
            "Listing recomputed"
        );
        self.visible = visible;
        self.criteria = criteria;
    }

    fn apply_highlights(&mut self, visible: &[ItemId], criteria: &FilterCriteria) {
        for item in &self.items {
            if let Some(content) = self.view.content_mut(item.id()) {
                if content.has_highlights() {
                    content.clear();
                }
            }
        }

        let term = criteria.search_term.trim();
        if term.is_empty() {
            return;
        }
        for id in visible {
            if let Some(content) = self.view.content_mut(id) {
                content.highlight(term);
            }
        }
    }

    fn update_summary(&mut self, criteria: &FilterCriteria, matches: usize) {
        let term = criteria.search_term.trim();
        let summary = (!term.is_empty()).then(|| SearchSummary {
            term: term.to_string(),
            matches,
        });
        if summary != self.summary {
            self.view.show_search_summary(summary.as_ref());
            self.summary = summary;
        }
    }

    /// Criteria used by the last recomputation (the defaults before the first)
    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Ids of the last visible result, in order.
    ///
    /// Until the first recomputation this is the document order the items
    /// were mounted in, not the order [`criteria`](Self::criteria) would give.
    pub fn visible(&self) -> &[ItemId] {
        &self.visible
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of recomputations so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn hooks(&self) -> PageHooks {
        self.hooks
    }

    pub fn is_placeholder_shown(&self) -> bool {
        self.placeholder_shown
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

impl<V: ListingView + std::fmt::Debug> std::fmt::Debug for ListingController<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingController")
            .field("items", &self.items.len())
            .field("hooks", &self.hooks)
            .field("criteria", &self.criteria)
            .field("generation", &self.generation)
            .field("view", &self.view)
            .finish()
    }
}
