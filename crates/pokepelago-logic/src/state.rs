//! Per-player collection state: a monotonic multiset of token names.
//!
//! Counts only ever grow. The state also remembers which event locations
//! have already paid out, so a second sweep over the same state does not
//! bank the same event token twice.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::items::Item;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionState {
    counts: BTreeMap<String, u32>,
    collected_events: BTreeSet<String>,
}

impl CollectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State seeded with precollected items.
    pub fn with_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> Self {
        let mut state = Self::new();
        for item in items {
            state.collect(&item.name);
        }
        state
    }

    /// Add one copy of `token`. Returns the new count.
    pub fn collect(&mut self, token: &str) -> u32 {
        self.collect_n(token, 1)
    }

    pub fn collect_n(&mut self, token: &str, n: u32) -> u32 {
        let count = self.counts.entry(token.to_string()).or_insert(0);
        *count += n;
        *count
    }

    pub fn count(&self, token: &str) -> u32 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn has(&self, token: &str, count: u32) -> bool {
        self.count(token) >= count
    }

    /// Record that the event location `location` has paid out.
    /// Returns `false` if it already had.
    pub fn mark_event_collected(&mut self, location: &str) -> bool {
        self.collected_events.insert(location.to_string())
    }

    pub fn event_collected(&self, location: &str) -> bool {
        self.collected_events.contains(location)
    }

    /// Every held token and its count.
    pub fn tokens(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Total copies held across all tokens.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate() {
        let mut state = CollectionState::new();
        assert_eq!(state.count("Pokemon Guessed"), 0);
        assert!(state.has("Pokemon Guessed", 0));
        assert_eq!(state.collect("Pokemon Guessed"), 1);
        assert_eq!(state.collect_n("Pokemon Guessed", 4), 5);
        assert!(state.has("Pokemon Guessed", 5));
        assert!(!state.has("Pokemon Guessed", 6));
        assert_eq!(state.total(), 5);
    }

    #[test]
    fn seeded_from_items() {
        let items = vec![
            Item::event("Pokemon Guessed", 1),
            Item::event("Pokemon Guessed", 1),
            Item::event("Fire Guessed", 1),
        ];
        let state = CollectionState::with_items(&items);
        assert_eq!(state.count("Pokemon Guessed"), 2);
        assert_eq!(state.count("Fire Guessed"), 1);
    }

    #[test]
    fn events_pay_out_once() {
        let mut state = CollectionState::new();
        assert!(state.mark_event_collected("Pikachu Guessed"));
        assert!(!state.mark_event_collected("Pikachu Guessed"));
        assert!(state.event_collected("Pikachu Guessed"));
    }
}
