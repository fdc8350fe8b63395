use tracing::{debug, error, info, warn};

use crate::filter::Filter;
use crate::item::{Item, ItemId};
use crate::store::{IdGenerator, ItemStore, UuidGenerator};
use crate::view::{ViewEngine, Window};

/// Everything the rendering side needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub filter: Filter,
    pub window: Window,
    pub page: Vec<Item>,
    pub progress: f64,
    pub filtered_len: usize,
    pub total_len: usize,
    pub page_number: usize,
    pub page_count: usize,
}

/// Handle for one initial-fetch attempt. Only the ticket issued by the most
/// recent [`TodoApp::begin_fetch`] can populate the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied(usize),
    Failed,
    Discarded,
}

/// Single owner of the item store and the view state. Mutators are the only
/// write path; readers get borrowed slices or owned snapshots.
#[derive(Debug)]
pub struct TodoApp<G = UuidGenerator> {
    store: ItemStore<G>,
    view: ViewEngine,
    fetch_generation: u64,
    initialized: bool,
}

impl Default for TodoApp<UuidGenerator> {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoApp<UuidGenerator> {
    pub fn new() -> Self {
        Self::with_generator(UuidGenerator)
    }
}

impl<G: IdGenerator> TodoApp<G> {
    pub fn with_generator(ids: G) -> Self {
        Self {
            store: ItemStore::with_generator(ids),
            view: ViewEngine::new(),
            fetch_generation: 0,
            initialized: false,
        }
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_generation += 1;
        debug!(generation = self.fetch_generation, "initial fetch started");
        FetchTicket {
            generation: self.fetch_generation,
        }
    }

    /// Invalidates any outstanding ticket; its result will be dropped.
    pub fn supersede_fetch(&mut self) {
        self.fetch_generation += 1;
        info!("initial fetch superseded");
    }

    #[tracing::instrument(skip(self, result), fields(generation = ticket.generation))]
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: anyhow::Result<Vec<Item>>,
    ) -> FetchOutcome {
        if ticket.generation != self.fetch_generation || self.initialized {
            warn!(
                current = self.fetch_generation,
                initialized = self.initialized,
                "discarding stale fetch result"
            );
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(items) => {
                self.store.initialize(items);
                self.initialized = true;
                FetchOutcome::Applied(self.store.len())
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed to fetch items");
                FetchOutcome::Failed
            }
        }
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.view.set_filter(filter);
    }

    pub fn advance(&mut self) -> bool {
        self.view.advance(self.store.list())
    }

    pub fn retreat(&mut self) -> bool {
        self.view.retreat()
    }

    pub fn insert(&mut self, title: &str, completed: bool) -> Option<ItemId> {
        self.store.insert(title, completed)
    }

    pub fn remove(&mut self, id: &ItemId) -> bool {
        self.store.remove(id)
    }

    pub fn mark_completed(&mut self, id: &ItemId) -> bool {
        self.store.mark_completed(id)
    }

    pub fn resolve_id(&self, token: &str) -> Option<ItemId> {
        self.store.find_by_display(token)
    }

    pub fn items(&self) -> &[Item] {
        self.store.list()
    }

    pub fn filter(&self) -> Filter {
        self.view.filter()
    }

    pub fn window(&self) -> Window {
        self.view.window()
    }

    pub fn visible_page(&self) -> Vec<&Item> {
        self.view.visible_page(self.store.list())
    }

    pub fn progress(&self) -> f64 {
        self.view.progress(self.store.list())
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let items = self.store.list();
        ViewSnapshot {
            filter: self.view.filter(),
            window: self.view.window(),
            page: self
                .view
                .visible_page(items)
                .into_iter()
                .cloned()
                .collect(),
            progress: self.view.progress(items),
            filtered_len: self.view.filtered_len(items),
            total_len: items.len(),
            page_number: self.view.page_number(),
            page_count: self.view.page_count(items),
        }
    }
}
