//! Detail / Sub-resource Loader
//!
//! Lazy, uncached loading of nested collections (comments of a post,
//! photos of an album) with an explicit load lifecycle. Responses carry a
//! ticket; anything answering a ticket that is no longer current is dropped.

use crate::resource::{Item, ItemId};
use std::collections::HashMap;
use std::hash::Hash;

/// Lifecycle of one asynchronous load
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Build the settled state from a result
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// Token identifying one open of the detail panel
pub type Ticket = u64;

/// Detail panel for a single parent row
#[derive(Debug, Default)]
pub struct DetailPanel {
    parent_id: Option<ItemId>,
    ticket: Ticket,
    pub state: LoadState<Vec<Item>>,
    pub scroll: usize,
}

impl DetailPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open for `parent_id` and start loading. Any earlier in-flight load
    /// is invalidated.
    pub fn open(&mut self, parent_id: ItemId) -> Ticket {
        self.ticket = self.ticket.wrapping_add(1);
        self.parent_id = Some(parent_id);
        self.state = LoadState::Loading;
        self.scroll = 0;
        self.ticket
    }

    /// Settle a load. Returns false (and changes nothing) for stale tickets.
    pub fn resolve<E: std::fmt::Display>(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Item>, E>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!("Discarding stale detail response (ticket {})", ticket);
            return false;
        }
        if let Err(e) = &result {
            tracing::warn!("Sub-resource load failed: {}", e);
        }
        self.state = LoadState::from_result(result);
        true
    }

    /// Close and discard whatever was loaded
    pub fn close(&mut self) {
        self.ticket = self.ticket.wrapping_add(1);
        self.parent_id = None;
        self.state = LoadState::Idle;
        self.scroll = 0;
    }

    pub fn is_open(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn parent_id(&self) -> Option<ItemId> {
        self.parent_id
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.is_open() && ticket == self.ticket
    }

    /// Move down one child, stopping at the last loaded one
    pub fn scroll_down(&mut self) {
        let last = self
            .state
            .loaded()
            .map_or(0, |children| children.len().saturating_sub(1));
        self.scroll = (self.scroll + 1).min(last);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    /// Append a child created while the panel is open
    pub fn push_child(&mut self, ticket: Ticket, child: Item) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        match self.state.loaded_mut() {
            Some(children) if !children.iter().any(|c| c.id == child.id) => {
                children.push(child);
                true
            }
            _ => false,
        }
    }
}

/// Per-key lazy loads (album thumbnails, author names), kept for one view
/// session only
#[derive(Debug)]
pub struct KeyedLoads<K, T> {
    entries: HashMap<K, LoadState<T>>,
}

impl<K, T> Default for KeyedLoads<K, T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Copy, T> KeyedLoads<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every not-yet-requested key as loading; returns those keys
    pub fn begin<I: IntoIterator<Item = K>>(&mut self, keys: I) -> Vec<K> {
        let mut started = Vec::new();
        for key in keys {
            if !self.entries.contains_key(&key) {
                self.entries.insert(key, LoadState::Loading);
                started.push(key);
            }
        }
        started
    }

    pub fn resolve<E: std::fmt::Display>(&mut self, key: K, result: Result<T, E>) {
        self.entries.insert(key, LoadState::from_result(result));
    }

    /// State for `key`; `None` means it was never requested
    pub fn get(&self, key: K) -> Option<&LoadState<T>> {
        self.entries.get(&key)
    }

    /// Loaded value for `key`, if any
    pub fn loaded(&self, key: K) -> Option<&T> {
        self.get(key).and_then(LoadState::loaded)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn child(id: u64) -> Item {
        Item::from_value(json!({"id": id, "name": "c"}), "id").unwrap()
    }

    #[test]
    fn test_open_load_close_cycle() {
        let mut panel = DetailPanel::new();
        assert_eq!(panel.state, LoadState::Idle);

        let ticket = panel.open(1);
        assert!(panel.state.is_loading());
        assert!(panel.resolve::<String>(ticket, Ok(vec![child(10), child(11)])));
        assert_eq!(panel.state.loaded().map(Vec::len), Some(2));

        panel.close();
        assert_eq!(panel.state, LoadState::Idle);
        assert!(!panel.is_open());
    }

    #[test]
    fn test_failure_is_a_state() {
        let mut panel = DetailPanel::new();
        let ticket = panel.open(1);
        panel.resolve::<String>(ticket, Err("boom".to_string()));
        assert_eq!(panel.state, LoadState::Failed("boom".to_string()));
    }

    #[test]
    fn test_stale_response_after_close_is_discarded() {
        let mut panel = DetailPanel::new();
        let ticket = panel.open(1);
        panel.close();
        assert!(!panel.resolve::<String>(ticket, Ok(vec![child(1)])));
        assert_eq!(panel.state, LoadState::Idle);
    }

    #[test]
    fn test_reopen_invalidates_previous_ticket() {
        let mut panel = DetailPanel::new();
        let first = panel.open(1);
        let second = panel.open(2);
        assert!(!panel.resolve::<String>(first, Ok(vec![child(1)])));
        assert!(panel.state.is_loading());
        assert!(panel.resolve::<String>(second, Ok(vec![])));
        assert_eq!(panel.parent_id(), Some(2));
    }

    #[test]
    fn test_push_child_only_when_loaded() {
        let mut panel = DetailPanel::new();
        let ticket = panel.open(1);
        assert!(!panel.push_child(ticket, child(5)));
        panel.resolve::<String>(ticket, Ok(vec![child(4)]));
        assert!(panel.push_child(ticket, child(5)));
        assert!(!panel.push_child(ticket, child(5)));
        assert_eq!(panel.state.loaded().map(Vec::len), Some(2));
    }

    #[test]
    fn test_scroll_stops_at_last_child() {
        let mut panel = DetailPanel::new();
        let ticket = panel.open(1);
        panel.scroll_down();
        assert_eq!(panel.scroll, 0);

        panel.resolve::<String>(ticket, Ok(vec![child(1), child(2), child(3)]));
        for _ in 0..10 {
            panel.scroll_down();
        }
        assert_eq!(panel.scroll, 2);

        panel.scroll_up();
        assert_eq!(panel.scroll, 1);
    }

    #[test]
    fn test_keyed_loads_begin_once() {
        let mut loads: KeyedLoads<u64, String> = KeyedLoads::new();
        assert_eq!(loads.begin([1, 2, 2]), vec![1, 2]);
        assert!(loads.begin([1, 2]).is_empty());
        loads.resolve::<String>(1, Ok("Leanne".to_string()));
        assert_eq!(loads.loaded(1).map(String::as_str), Some("Leanne"));
        assert!(loads.get(2).is_some_and(LoadState::is_loading));
        assert!(loads.get(3).is_none());
    }
}
