use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::item::{Item, ItemId};

/// Produces fresh identifiers for locally created items.
pub trait IdGenerator {
    fn next_id(&mut self) -> ItemId;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> ItemId {
        ItemId::new_v4()
    }
}

/// Deterministic ids (`local-1`, `local-2`, ...).
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    counter: u64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> ItemId {
        self.counter += 1;
        ItemId::Text(format!("local-{}", self.counter))
    }
}

/// Canonical ordered collection of items. Newly inserted items go to the
/// front; everything else keeps insertion order.
#[derive(Debug)]
pub struct ItemStore<G = UuidGenerator> {
    items: Vec<Item>,
    ids: G,
}

impl Default for ItemStore<UuidGenerator> {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore<UuidGenerator> {
    pub fn new() -> Self {
        Self::with_generator(UuidGenerator)
    }
}

impl<G: IdGenerator> ItemStore<G> {
    pub fn with_generator(ids: G) -> Self {
        Self {
            items: Vec::new(),
            ids,
        }
    }

    /// Replaces the collection wholesale. Ids are unique by their display
    /// text (`5` and `"5"` clash); later duplicates are dropped.
    #[tracing::instrument(skip(self, items))]
    pub fn initialize(&mut self, items: Vec<Item>) {
        let received = items.len();
        let mut seen = HashSet::with_capacity(received);
        let mut kept = Vec::with_capacity(received);

        for item in items {
            if seen.insert(item.id.to_string()) {
                kept.push(item);
            } else {
                warn!(id = %item.id, "dropping item with duplicate id");
            }
        }

        info!(received, kept = kept.len(), "initialized item store");
        self.items = kept;
    }

    /// Prepends a new item. Blank titles are rejected silently.
    #[tracing::instrument(skip(self, title))]
    pub fn insert(&mut self, title: &str, completed: bool) -> Option<ItemId> {
        if title.trim().is_empty() {
            debug!("ignoring insert with blank title");
            return None;
        }

        let id = self.fresh_id();
        self.items
            .insert(0, Item::new(id.clone(), title, completed));

        debug!(id = %id, count = self.items.len(), "item inserted");
        Some(id)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn remove(&mut self, id: &ItemId) -> bool {
        let Some(idx) = self.position(id) else {
            debug!("remove ignored; id not present");
            return false;
        };

        self.items.remove(idx);
        debug!(count = self.items.len(), "item removed");
        true
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn mark_completed(&mut self, id: &ItemId) -> bool {
        match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) if !item.completed => {
                item.completed = true;
                debug!("item marked completed");
                true
            }
            Some(_) => {
                debug!("item already completed");
                false
            }
            None => {
                debug!("mark ignored; id not present");
                false
            }
        }
    }

    pub fn list(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolves an id as the user typed it.
    pub fn find_by_display(&self, token: &str) -> Option<ItemId> {
        let token = token.trim();
        self.items
            .iter()
            .find(|item| item.id.to_string() == token)
            .map(|item| item.id.clone())
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    fn fresh_id(&mut self) -> ItemId {
        loop {
            let candidate = self.ids.next_id();
            if self.find_by_display(&candidate.to_string()).is_none() {
                return candidate;
            }
            warn!(id = %candidate, "generated id already in use; retrying");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{IdGenerator, ItemStore, SequentialIds};
    use crate::item::{Item, ItemId};

    fn sample(n: u64) -> Vec<Item> {
        (1..=n)
            .map(|i| Item::new(ItemId::Number(i), format!("item {i}"), i % 2 == 0))
            .collect()
    }

    #[test]
    fn insert_prepends_and_rejects_blank_titles() {
        let mut store = ItemStore::with_generator(SequentialIds::default());
        store.initialize(sample(2));

        assert!(store.insert("   ", true).is_none());
        assert!(store.insert("", false).is_none());
        assert_eq!(store.len(), 2);

        let id = store.insert("write report", true).expect("inserted");
        assert_eq!(store.list()[0].id, id);
        assert_eq!(store.list()[0].title, "write report");
        assert!(store.list()[0].completed);
        assert_eq!(store.list()[1].id, ItemId::Number(1));
    }

    #[test]
    fn inserted_ids_are_pairwise_distinct() {
        let mut store = ItemStore::new();
        for i in 0..200 {
            store.insert(&format!("task {i}"), i % 3 == 0);
        }

        let ids: HashSet<_> = store.list().iter().map(|item| item.id.clone()).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn colliding_generator_ids_are_retried() {
        struct ThenFresh(u64);
        impl IdGenerator for ThenFresh {
            fn next_id(&mut self) -> ItemId {
                self.0 += 1;
                ItemId::Number(self.0)
            }
        }

        let mut store = ItemStore::with_generator(ThenFresh(0));
        store.initialize(sample(3));
        let id = store.insert("new", false).expect("inserted");
        assert_eq!(id, ItemId::Number(4));
    }

    #[test]
    fn remove_and_mark_are_idempotent() {
        let mut store = ItemStore::new();
        store.initialize(sample(3));

        assert!(store.mark_completed(&ItemId::Number(1)));
        assert!(!store.mark_completed(&ItemId::Number(1)));
        assert!(!store.mark_completed(&ItemId::Number(99)));
        assert!(store.list()[0].completed);

        assert!(store.remove(&ItemId::Number(2)));
        assert!(!store.remove(&ItemId::Number(2)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn initialize_drops_duplicate_ids() {
        let mut store = ItemStore::new();
        let mut items = sample(3);
        items.push(Item::new(ItemId::Number(2), "dup", true));
        store.initialize(items);

        assert_eq!(store.len(), 3);
        assert_eq!(store.list()[1].title, "item 2");
    }

    #[test]
    fn ids_that_print_alike_are_treated_as_duplicates() {
        let mut store = ItemStore::new();
        store.initialize(vec![
            Item::new(ItemId::Text("5".to_string()), "text five", false),
            Item::new(ItemId::Number(5), "number five", false),
            Item::new(ItemId::Number(6), "six", false),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.find_by_display("5"),
            Some(ItemId::Text("5".to_string()))
        );
        assert!(store.remove(&ItemId::Text("5".to_string())));
        assert_eq!(store.find_by_display("5"), None);
    }

    #[test]
    fn generated_ids_never_print_like_existing_ones() {
        struct Numbered(u64);
        impl IdGenerator for Numbered {
            fn next_id(&mut self) -> ItemId {
                self.0 += 1;
                ItemId::Number(self.0)
            }
        }

        let mut store = ItemStore::with_generator(Numbered(0));
        store.initialize(vec![Item::new(ItemId::Text("1".to_string()), "fetched", false)]);
        let id = store.insert("local", false).expect("inserted");
        assert_eq!(id, ItemId::Number(2));
    }

    #[test]
    fn find_by_display_resolves_numbers_and_text() {
        let mut store = ItemStore::with_generator(SequentialIds::default());
        store.initialize(sample(2));
        store.insert("local", false);

        assert_eq!(store.find_by_display("2"), Some(ItemId::Number(2)));
        assert_eq!(
            store.find_by_display(" local-1 "),
            Some(ItemId::Text("local-1".to_string()))
        );
        assert_eq!(store.find_by_display("7"), None);
    }
}
