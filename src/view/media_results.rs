//! Merged, ordered and navigable query results

use std::collections::HashSet;
use std::sync::Arc;

use crate::types::ViewMedia;

/// The merged result set of a query plus a selection cursor.
///
/// Items are kept sorted by [`ViewMedia::sort_order`] with duplicates removed
/// (first occurrence wins). The selection is `None` iff there are no items and
/// otherwise always within bounds. Items are shared behind an `Arc` so views
/// can be cloned cheaply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaQueriesResults {
    results: Arc<Vec<ViewMedia>>,
    selected: Option<usize>,
    wrap: bool,
}

impl MediaQueriesResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from unsorted, possibly duplicated media.
    pub fn from_media(media: Vec<ViewMedia>) -> Self {
        let mut results = Self::new();
        results.replace(media);
        results
    }

    /// Wrap around at the ends when navigating.
    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Replace every item, resetting the selection to the first item.
    pub fn replace(&mut self, media: Vec<ViewMedia>) {
        let mut media = media;
        // Stable: equal sort keys keep their arrival order, so "first
        // occurrence" below is well defined.
        media.sort_by(ViewMedia::sort_order);

        let mut seen = HashSet::with_capacity(media.len());
        media.retain(|item| seen.insert(item.key()));

        self.selected = if media.is_empty() { None } else { Some(0) };
        self.results = Arc::new(media);
    }

    pub fn results(&self) -> &[ViewMedia] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&ViewMedia> {
        self.selected.and_then(|i| self.results.get(i))
    }

    pub fn has_selection(&self) -> bool {
        self.selected.is_some()
    }

    pub fn wraps(&self) -> bool {
        self.wrap
    }

    /// Select `index`, clamped into range. No-op when empty.
    pub fn select(&mut self, index: usize) {
        if !self.results.is_empty() {
            self.selected = Some(index.min(self.results.len() - 1));
        }
    }

    /// Select the first item matching `predicate`. Returns whether one matched.
    pub fn select_where<F>(&mut self, predicate: F) -> bool
    where
        F: Fn(&ViewMedia) -> bool,
    {
        match self.results.iter().position(predicate) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }

    /// Move to the next item. Returns whether the selection moved.
    pub fn next(&mut self) -> bool {
        let Some(current) = self.selected else {
            return false;
        };
        let target = if current + 1 < self.results.len() {
            current + 1
        } else if self.wrap {
            0
        } else {
            current
        };
        self.move_to(current, target)
    }

    /// Move to the previous item. Returns whether the selection moved.
    pub fn previous(&mut self) -> bool {
        let Some(current) = self.selected else {
            return false;
        };
        let target = if current > 0 {
            current - 1
        } else if self.wrap {
            self.results.len() - 1
        } else {
            current
        };
        self.move_to(current, target)
    }

    fn move_to(&mut self, current: usize, target: usize) -> bool {
        self.selected = Some(target);
        current != target
    }

    /// New result set holding only the items matching `predicate`.
    ///
    /// The selected item stays selected if it survives the filter, otherwise
    /// the first remaining item is selected.
    pub fn filter<F>(&self, predicate: F) -> MediaQueriesResults
    where
        F: Fn(&ViewMedia) -> bool,
    {
        let selected_key = self.selected().map(ViewMedia::key);
        let media: Vec<ViewMedia> = self.results.iter().filter(|item| predicate(*item)).cloned().collect();
        let selected = match selected_key {
            Some(key) => media.iter().position(|item| item.key() == key).or(Some(0)),
            None => Some(0),
        }
        .filter(|_| !media.is_empty());

        MediaQueriesResults { results: Arc::new(media), selected, wrap: self.wrap }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{clip_at, generate_media};
    use crate::types::MediaKind;
    use proptest::prelude::*;

    #[test]
    fn merged_example_orders_across_cameras() {
        let results = MediaQueriesResults::from_media(vec![
            clip_at("A", "e1", 10),
            clip_at("A", "e2", 30),
            clip_at("B", "e3", 20),
        ]);
        let ids: Vec<_> = results.results().iter().map(|m| m.id().unwrap()).collect();
        assert_eq!(ids, vec!["e1", "e3", "e2"]);
        assert_eq!(results.selected_index(), Some(0));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let first = clip_at("A", "e1", 10).with_title("first");
        let second = clip_at("A", "e1", 10).with_title("second");
        let results = MediaQueriesResults::from_media(vec![first, second]);
        assert_eq!(results.len(), 1);
        assert_eq!(results.results()[0].title(), Some("first"));
    }

    #[test]
    fn empty_results_have_no_selection() {
        let mut results = MediaQueriesResults::from_media(Vec::new());
        assert_eq!(results.selected_index(), None);
        results.select(3);
        assert_eq!(results.selected_index(), None);
        assert!(!results.next());
        assert!(!results.previous());
    }

    #[test]
    fn navigation_clamps_by_default_and_wraps_when_configured() {
        let media = generate_media(&["A"], 3);
        let mut results = MediaQueriesResults::from_media(media.clone());
        assert!(!results.previous());
        assert!(results.next());
        assert!(results.next());
        assert!(!results.next());
        assert_eq!(results.selected_index(), Some(2));

        let mut wrapping = MediaQueriesResults::from_media(media).with_wrap(true);
        assert!(wrapping.previous());
        assert_eq!(wrapping.selected_index(), Some(2));
        assert!(wrapping.next());
        assert_eq!(wrapping.selected_index(), Some(0));
    }

    #[test]
    fn select_clamps_out_of_range() {
        let mut results = MediaQueriesResults::from_media(generate_media(&["A"], 4));
        results.select(100);
        assert_eq!(results.selected_index(), Some(3));
    }

    #[test]
    fn filter_preserves_surviving_selection() {
        let mut results = MediaQueriesResults::from_media(vec![
            clip_at("A", "e1", 10),
            clip_at("B", "e2", 20),
            clip_at("A", "e3", 30),
        ]);
        results.select(2);

        let only_a = results.filter(|m| m.camera_id() == "A");
        assert_eq!(only_a.len(), 2);
        assert_eq!(only_a.selected().and_then(ViewMedia::id), Some("e3"));
        // The original is untouched.
        assert_eq!(results.len(), 3);

        let none = results.filter(|m| m.kind() == MediaKind::Recording);
        assert!(none.is_empty());
        assert_eq!(none.selected_index(), None);

        results.select(1);
        let dropped_selection = results.filter(|m| m.camera_id() == "A");
        assert_eq!(dropped_selection.selected_index(), Some(0));
    }

    #[test]
    fn select_where_finds_media() {
        let mut results = MediaQueriesResults::from_media(generate_media(&["A", "B"], 2));
        assert!(results.select_where(|m| m.camera_id() == "B"));
        assert_eq!(results.selected().unwrap().camera_id(), "B");
        assert!(!results.select_where(|m| m.camera_id() == "C"));
    }

    fn arb_media() -> impl Strategy<Value = ViewMedia> {
        (
            prop::sample::select(vec!["A", "B", "C"]),
            prop::option::of(0u8..6),
            prop::option::of(0i64..50),
            prop::sample::select(vec![MediaKind::Clip, MediaKind::Snapshot]),
        )
            .prop_map(|(camera, id, start, kind)| {
                let content = format!("{camera}/{}", start.unwrap_or(-1));
                let mut media = ViewMedia::new(kind, camera, content);
                if let Some(id) = id {
                    media = media.with_id(format!("id-{id}"));
                }
                if let Some(start) = start {
                    media = media.with_start_time(crate::test_utils::at(start));
                }
                media
            })
    }

    #[derive(Debug, Clone)]
    enum Nav {
        Next,
        Previous,
        Select(usize),
    }

    fn arb_nav() -> impl Strategy<Value = Nav> {
        prop_oneof![Just(Nav::Next), Just(Nav::Previous), (0usize..40).prop_map(Nav::Select)]
    }

    proptest! {
        #[test]
        fn replace_yields_sorted_unique_results(media in prop::collection::vec(arb_media(), 0..40)) {
            let results = MediaQueriesResults::from_media(media);
            let items = results.results();
            for pair in items.windows(2) {
                prop_assert!(pair[0].start_time() <= pair[1].start_time());
            }
            for (i, a) in items.iter().enumerate() {
                for b in &items[i + 1..] {
                    prop_assert!(!a.is_same_media(b));
                }
            }
        }

        #[test]
        fn selection_stays_in_bounds(
            media in prop::collection::vec(arb_media(), 0..20),
            wrap in any::<bool>(),
            ops in prop::collection::vec(arb_nav(), 0..50)
        ) {
            let mut results = MediaQueriesResults::from_media(media).with_wrap(wrap);
            for op in ops {
                match op {
                    Nav::Next => { results.next(); }
                    Nav::Previous => { results.previous(); }
                    Nav::Select(i) => results.select(i),
                }
                match results.selected_index() {
                    Some(i) => prop_assert!(i < results.len()),
                    None => prop_assert!(results.is_empty()),
                }
            }
        }
    }
}
