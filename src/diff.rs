//! Multiset reconciliation between a current and a desired track list.
//!
//! Track lists are multisets: the same URI may appear more than once and
//! every occurrence counts. [`reconcile`] computes the cheapest add/remove
//! edit that converges the current list onto the desired one.

use std::collections::HashMap;
use std::hash::Hash;

/// Counts duplicate items of a multiset.
pub struct ItemCounter<K> {
    counts: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> ItemCounter<K> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    pub fn from_items<'a, I>(items: I) -> Self
    where
        K: 'a,
        I: IntoIterator<Item = &'a K>,
    {
        let mut counter = Self::new();
        for item in items {
            counter.add(item.clone());
        }
        counter
    }

    /// True if there exists at least one such item.
    pub fn contains(&self, item: &K) -> bool {
        self.counts.contains_key(item)
    }

    pub fn add(&mut self, item: K) {
        *self.counts.entry(item).or_insert(0) += 1;
    }

    /// Reduce the count of `item` by one if any is left.
    ///
    /// Returns true if the count was at least 1 before this call.
    pub fn remove(&mut self, item: &K) -> bool {
        match self.counts.get_mut(item) {
            None => false,
            Some(count) if *count == 1 => {
                self.counts.remove(item);
                true
            }
            Some(count) => {
                *count -= 1;
                true
            }
        }
    }
}

impl<K: Eq + Hash + Clone> Default for ItemCounter<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// The minimal edit converging one track multiset onto another.
///
/// Element order inside `to_add` and `to_remove` follows first encounter in
/// the source collections and carries no meaning; callers must not rely on
/// it. The remote API requires removals to be applied before additions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackDiff {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl TrackDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the minimal add/remove edit such that removing `to_remove` from
/// `current` and then adding `to_add` yields exactly `desired` as a
/// multiset.
///
/// A desired track still available in the count table of `current` is
/// consumed in place and costs nothing; only the surplus on either side
/// ends up in the edit.
pub fn reconcile(current: &[String], desired: &[String]) -> TrackDiff {
    let mut available = ItemCounter::from_items(current);
    let mut to_add = Vec::new();
    for track in desired {
        if !available.remove(track) {
            to_add.push(track.clone());
        }
    }

    let mut wanted = ItemCounter::from_items(desired);
    let mut to_remove = Vec::new();
    for track in current {
        if !wanted.remove(track) {
            to_remove.push(track.clone());
        }
    }

    TrackDiff { to_add, to_remove }
}
