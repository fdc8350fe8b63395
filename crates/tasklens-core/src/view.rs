//! Filter selection, pagination window and progress derivation.
//!
//! Everything derived here is recomputed from the collection on every read;
//! nothing is cached, so a read after any mutation is never stale.

use tracing::{debug, trace};

use crate::filter::Filter;
use crate::item::Item;

pub const PAGE_SIZE: usize = 10;

/// Half-open range `[first, last)` into the filtered sequence.
///
/// `first` is always a multiple of [`PAGE_SIZE`] and `last - first` is always
/// `PAGE_SIZE`; only slicing clamps `last` to the filtered length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub first: usize,
    pub last: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            first: 0,
            last: PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewEngine {
    filter: Filter,
    window: Window,
}

impl ViewEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Switches the filter and rewinds to the first page, even when the new
    /// filter is the current one.
    #[tracing::instrument(skip(self))]
    pub fn set_filter(&mut self, filter: Filter) {
        debug!(from = %self.filter, to = %filter, "filter changed; window reset");
        self.filter = filter;
        self.window = Window::default();
    }

    pub fn derive_filtered<'a>(&self, collection: &'a [Item]) -> Vec<&'a Item> {
        collection
            .iter()
            .filter(|item| self.filter.matches(item))
            .collect()
    }

    pub fn filtered_len(&self, collection: &[Item]) -> usize {
        collection
            .iter()
            .filter(|item| self.filter.matches(item))
            .count()
    }

    pub fn visible_page<'a>(&self, collection: &'a [Item]) -> Vec<&'a Item> {
        let filtered = self.derive_filtered(collection);
        if self.window.first >= filtered.len() {
            return Vec::new();
        }

        let end = self.window.last.min(filtered.len());
        filtered[self.window.first..end].to_vec()
    }

    /// Moves one page forward unless the window already reaches the end of
    /// the filtered sequence.
    #[tracing::instrument(skip(self, collection))]
    pub fn advance(&mut self, collection: &[Item]) -> bool {
        let len = self.filtered_len(collection);
        if self.window.last >= len {
            trace!(len, last = self.window.last, "advance clamped at last page");
            return false;
        }

        self.window.first += PAGE_SIZE;
        self.window.last += PAGE_SIZE;
        debug!(first = self.window.first, last = self.window.last, "advanced window");
        true
    }

    #[tracing::instrument(skip(self))]
    pub fn retreat(&mut self) -> bool {
        if self.window.first == 0 {
            trace!("retreat clamped at first page");
            return false;
        }

        self.window.first -= PAGE_SIZE;
        self.window.last -= PAGE_SIZE;
        debug!(first = self.window.first, last = self.window.last, "retreated window");
        true
    }

    /// `(100 / N) * (first + PAGE_SIZE)` over the filtered length `N`.
    ///
    /// Measured against a full page stride, so on a short tail page the value
    /// goes above 100 (12 items on the second page gives 166.67).
    pub fn progress(&self, collection: &[Item]) -> f64 {
        let len = self.filtered_len(collection);
        if len == 0 {
            return 0.0;
        }
        (100.0 / len as f64) * (self.window.first + PAGE_SIZE) as f64
    }

    /// 1-based page index of the window.
    pub fn page_number(&self) -> usize {
        self.window.first / PAGE_SIZE + 1
    }

    pub fn page_count(&self, collection: &[Item]) -> usize {
        self.filtered_len(collection).div_ceil(PAGE_SIZE).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{PAGE_SIZE, ViewEngine, Window};
    use crate::filter::Filter;
    use crate::item::{Item, ItemId};

    fn items(n: u64, completed: impl Fn(u64) -> bool) -> Vec<Item> {
        (0..n)
            .map(|i| Item::new(ItemId::Number(i), format!("item {i}"), completed(i)))
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn defaults_to_all_and_first_page() {
        let view = ViewEngine::new();
        assert_eq!(view.filter(), Filter::All);
        assert_eq!(view.window(), Window { first: 0, last: 10 });
        assert_eq!(view.page_number(), 1);
    }

    #[test]
    fn filtered_sequence_matches_predicate_in_order() {
        let collection = items(25, |i| i % 3 == 0);

        for filter in Filter::ALL {
            let mut view = ViewEngine::new();
            view.set_filter(filter);
            let filtered = view.derive_filtered(&collection);

            let expected: Vec<&Item> = collection
                .iter()
                .filter(|item| filter.matches(item))
                .collect();
            assert_eq!(filtered, expected, "filter {filter}");
            assert!(filtered.iter().all(|item| filter.matches(item)));
        }
    }

    #[test]
    fn advance_then_retreat_returns_to_origin() {
        let collection = items(35, |_| false);
        let mut view = ViewEngine::new();
        assert!(view.advance(&collection));
        let origin = view.window();

        assert!(view.advance(&collection));
        assert!(view.retreat());
        assert_eq!(view.window(), origin);

        assert!(view.retreat());
        assert!(view.advance(&collection));
        assert_eq!(view.window(), origin);
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let collection = items(10, |_| false);
        let mut view = ViewEngine::new();

        assert!(!view.retreat());
        assert!(!view.advance(&collection));
        assert_eq!(view.window(), Window::default());
    }

    #[test]
    fn window_stays_aligned_to_page_size() {
        let collection = items(47, |_| true);
        let mut view = ViewEngine::new();
        while view.advance(&collection) {
            let w = view.window();
            assert_eq!(w.first % PAGE_SIZE, 0);
            assert_eq!(w.last - w.first, PAGE_SIZE);
        }
        assert_eq!(view.window(), Window { first: 40, last: 50 });
        assert_eq!(view.visible_page(&collection).len(), 7);
        assert_eq!(view.page_number(), 5);
        assert_eq!(view.page_count(&collection), 5);
    }

    #[test]
    fn progress_is_zero_for_empty_filtered_sequence() {
        let collection = items(5, |_| false);
        let mut view = ViewEngine::new();
        view.set_filter(Filter::Completed);
        assert_eq!(view.progress(&collection), 0.0);
        assert_eq!(view.progress(&[]), 0.0);
        assert!(view.visible_page(&collection).is_empty());
        assert_eq!(view.page_count(&collection), 1);
    }

    #[test]
    fn progress_overshoots_on_short_tail_page() {
        let collection = items(12, |_| false);
        let mut view = ViewEngine::new();
        assert!(approx(view.progress(&collection), 83.33));

        assert!(view.advance(&collection));
        assert_eq!(view.window(), Window { first: 10, last: 20 });
        assert!(approx(view.progress(&collection), 166.67));
    }

    #[test]
    fn set_filter_resets_window() {
        let collection = items(30, |i| i < 2);
        let mut view = ViewEngine::new();
        view.advance(&collection);
        assert_eq!(view.window(), Window { first: 10, last: 20 });

        view.set_filter(Filter::Completed);
        assert_eq!(view.window(), Window { first: 0, last: 10 });

        view.set_filter(Filter::All);
        view.advance(&collection);
        view.set_filter(Filter::All);
        assert_eq!(view.window(), Window::default());
    }

    #[test]
    fn page_beyond_filtered_length_is_empty() {
        let mut collection = items(11, |_| false);
        let mut view = ViewEngine::new();
        view.advance(&collection);
        assert_eq!(view.visible_page(&collection).len(), 1);

        collection.pop();
        assert!(view.visible_page(&collection).is_empty());
        assert_eq!(view.window(), Window { first: 10, last: 20 });
        assert!(approx(view.progress(&collection), 200.0));
    }
}
