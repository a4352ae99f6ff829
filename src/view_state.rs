//! View State
//!
//! Transient per-view parameters (page, page size, filter, sort) and the
//! reducer that applies user actions to them.

use crate::pipeline::{Query, SortDirection, SortKey};
use crate::resource::ResourceDef;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Transient list parameters for one view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// 1-based
    pub page: usize,
    pub page_size: usize,
    pub filter_text: String,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

/// Every transition a view's list parameters can make
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    SetFilter(String),
    PushFilterChar(char),
    PopFilterChar,
    ClearFilter,
    SetPageSize(usize),
    GoToPage(usize),
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    SetSort(SortKey),
    ToggleSortDirection,
    /// Re-clamp after the collection changed underneath the view
    Clamp,
}

impl ViewState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            filter_text: String::new(),
            sort_key: SortKey::Default,
            sort_direction: SortDirection::Ascending,
        }
    }

    /// Apply `action`. `total_pages` is the page count of the filtered
    /// collection as it stands before the action; actions that change the
    /// filter or page size reset to page 1 instead of using it.
    pub fn reduce(&mut self, action: ViewAction, total_pages: usize) {
        let total_pages = total_pages.max(1);

        match action {
            ViewAction::SetFilter(text) => {
                self.filter_text = text;
                self.page = 1;
            }
            ViewAction::PushFilterChar(c) => {
                self.filter_text.push(c);
                self.page = 1;
            }
            ViewAction::PopFilterChar => {
                if self.filter_text.pop().is_some() {
                    self.page = 1;
                }
            }
            ViewAction::ClearFilter => {
                if !self.filter_text.is_empty() {
                    self.filter_text.clear();
                    self.page = 1;
                }
            }
            ViewAction::SetPageSize(size) => {
                self.page_size = size.max(1);
                self.page = 1;
            }
            ViewAction::GoToPage(page) => {
                self.page = page.clamp(1, total_pages);
            }
            ViewAction::NextPage => {
                self.page = (self.page + 1).min(total_pages);
            }
            ViewAction::PrevPage => {
                self.page = self.page.saturating_sub(1).max(1);
            }
            ViewAction::FirstPage => {
                self.page = 1;
            }
            ViewAction::LastPage => {
                self.page = total_pages;
            }
            ViewAction::SetSort(key) => {
                self.sort_key = key;
            }
            ViewAction::ToggleSortDirection => {
                self.sort_direction = self.sort_direction.toggled();
            }
            ViewAction::Clamp => {
                self.page = self.page.clamp(1, total_pages);
            }
        }

        tracing::trace!("view state -> page {} / size {}", self.page, self.page_size);
    }

    /// Pipeline query for this state against `resource`
    pub fn query<'a>(&'a self, resource: &'a ResourceDef) -> Query<'a> {
        Query {
            display_field: &resource.title_field,
            filter_text: &self.filter_text,
            sort_key: &self.sort_key,
            sort_direction: self.sort_direction,
            default_order: &resource.default_order,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_change_resets_page() {
        let mut state = ViewState::default();
        state.reduce(ViewAction::GoToPage(3), 5);
        assert_eq!(state.page, 3);

        state.reduce(ViewAction::PushFilterChar('a'), 5);
        assert_eq!(state.page, 1);
        assert_eq!(state.filter_text, "a");

        state.reduce(ViewAction::GoToPage(2), 5);
        state.reduce(ViewAction::PopFilterChar, 5);
        assert_eq!(state.page, 1);
        assert!(state.filter_text.is_empty());
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let mut state = ViewState::default();
        state.reduce(ViewAction::LastPage, 4);
        assert_eq!(state.page, 4);
        state.reduce(ViewAction::SetPageSize(20), 4);
        assert_eq!(state.page, 1);
        assert_eq!(state.page_size, 20);
    }

    #[test]
    fn test_page_navigation_is_clamped() {
        let mut state = ViewState::default();
        state.reduce(ViewAction::PrevPage, 3);
        assert_eq!(state.page, 1);
        state.reduce(ViewAction::NextPage, 3);
        state.reduce(ViewAction::NextPage, 3);
        state.reduce(ViewAction::NextPage, 3);
        assert_eq!(state.page, 3);
        state.reduce(ViewAction::GoToPage(99), 3);
        assert_eq!(state.page, 3);
        state.reduce(ViewAction::GoToPage(0), 3);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_clamp_after_collection_shrinks() {
        let mut state = ViewState::default();
        state.reduce(ViewAction::GoToPage(3), 3);
        state.reduce(ViewAction::Clamp, 2);
        assert_eq!(state.page, 2);
        state.reduce(ViewAction::Clamp, 0);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_sort_actions() {
        let mut state = ViewState::default();
        state.reduce(ViewAction::SetSort(SortKey::Field("title".into())), 1);
        state.reduce(ViewAction::ToggleSortDirection, 1);
        assert_eq!(state.sort_key, SortKey::Field("title".into()));
        assert_eq!(state.sort_direction, SortDirection::Descending);
    }

    #[test]
    fn test_zero_page_size_is_coerced() {
        let mut state = ViewState::with_page_size(0);
        assert_eq!(state.page_size, 1);
        state.reduce(ViewAction::SetPageSize(0), 1);
        assert_eq!(state.page_size, 1);
    }
}
