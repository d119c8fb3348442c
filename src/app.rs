//! Viewer state: the item list, the selection and the status line.

use std::collections::HashSet;

use ratatui::widgets::ListState;

use crate::source::FeedItem;

pub struct App {
    /// De-duplicated, reverse-chronological items.
    pub items: Vec<FeedItem>,
    /// Ids already in `items`.
    seen: HashSet<String>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last stream status message.
    pub status: String,
    /// Communities being watched, shown in the title.
    pub communities: Vec<String>,
}

impl App {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            list_state: ListState::default(),
            quit: false,
            status: "Starting…".into(),
            communities: Vec::new(),
        }
    }

    pub fn with_communities(mut self, communities: Vec<String>) -> Self {
        self.communities = communities;
        self
    }

    /// Insert one streamed item.  Returns `false` if it was already shown.
    ///
    /// The selection follows the item it was on, so new arrivals above it
    /// don't move the reader.
    pub fn push_item(&mut self, item: FeedItem) -> bool {
        if !self.seen.insert(item.id.clone()) {
            return false;
        }
        let selected_id = self.selected_item().map(|item| item.id.clone());

        let at = self.items.partition_point(|existing| existing <= &item);
        self.items.insert(at, item);

        if let Some(id) = selected_id {
            let index = self.items.iter().position(|item| item.id == id);
            self.list_state.select(index);
        }
        true
    }

    /// Insert a batch of items, skipping ones already shown.  Returns how
    /// many were new.
    pub fn merge_items(&mut self, new_items: Vec<FeedItem>) -> usize {
        let mut added = 0;
        for item in new_items {
            if self.push_item(item) {
                added += 1;
            }
        }
        added
    }

    pub fn selected_item(&self) -> Option<&FeedItem> {
        self.list_state.selected().and_then(|i| self.items.get(i))
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{make_item, ItemKind};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2023, 6, day, 12, 0, 0).unwrap())
    }

    /// A post and two comments from one poll, out of order.
    fn thread() -> Vec<FeedItem> {
        let mut reply = make_item("comment_2", "Agreed", at(3));
        reply.kind = ItemKind::Comment;
        let mut first = make_item("comment_1", "Nice post", at(2));
        first.kind = ItemKind::Comment;
        vec![first, make_item("post_1", "Hello", at(1)), reply]
    }

    fn ids(app: &App) -> Vec<&str> {
        app.items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn starts_empty_with_no_selection() {
        let app = App::new();
        assert!(app.items.is_empty());
        assert!(app.selected_item().is_none());
        assert!(!app.quit);
    }

    #[test]
    fn batches_are_sorted_newest_first() {
        let mut app = App::new();
        assert_eq!(app.merge_items(thread()), 3);
        assert_eq!(ids(&app), vec!["comment_2", "comment_1", "post_1"]);
    }

    #[test]
    fn repeated_keys_are_dropped() {
        let mut app = App::new();
        app.merge_items(thread());
        let edited = make_item("post_1", "Hello (edited)", at(4));
        assert_eq!(app.merge_items(vec![edited, make_item("post_2", "Second", at(5))]), 1);

        assert_eq!(app.items.len(), 4);
        let kept = app.items.iter().find(|item| item.id == "post_1").unwrap();
        assert_eq!(kept.title, "Hello");
        assert!(!app.push_item(make_item("post_2", "again", None)));
    }

    #[test]
    fn selection_stays_on_the_item_being_read() {
        let mut app = App::new();
        app.merge_items(thread());
        app.select_last();
        assert_eq!(app.selected_item().map(|i| i.id.as_str()), Some("post_1"));

        app.push_item(make_item("post_2", "Newer", at(9)));
        assert_eq!(ids(&app)[0], "post_2");
        assert_eq!(app.list_state.selected(), Some(3));
        assert_eq!(app.selected_item().map(|i| i.id.as_str()), Some("post_1"));
    }

    #[test]
    fn same_timestamp_arrivals_go_below() {
        let mut app = App::new();
        app.push_item(make_item("post_1", "First", at(1)));
        app.push_item(make_item("post_2", "Second", at(1)));
        app.push_item(make_item("post_3", "Undated", None));
        assert_eq!(ids(&app), vec!["post_1", "post_2", "post_3"]);
    }

    #[test]
    fn navigation_is_a_noop_without_items() {
        let mut app = App::new();
        app.select_next();
        app.select_previous();
        app.select_first();
        app.select_last();
        assert!(app.list_state.selected().is_none());
    }

    #[test]
    fn navigation_clamps_to_the_list() {
        let mut app = App::new();
        app.merge_items(thread());

        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));
        app.select_next();
        app.select_next();
        app.select_next();
        assert_eq!(app.list_state.selected(), Some(2));
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(1));
        app.select_first();
        assert_eq!(app.list_state.selected(), Some(0));
        app.select_last();
        assert_eq!(app.list_state.selected(), Some(2));
    }
}
