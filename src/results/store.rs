use crate::data::model::RasterElement;
use crate::events::DeletionNotifier;

use super::page::ResultsPage;

// ---------------------------------------------------------------------------
// ResultSetStore – one results page per raster
// ---------------------------------------------------------------------------

/// Owns the results pages, at most one per raster display name.
///
/// Pages are kept in creation order (tab order). One of them may be
/// "current", the page the viewer shows and context actions apply to.
#[derive(Debug)]
pub struct ResultSetStore {
    pages: Vec<ResultsPage>,
    current: Option<usize>,
    max_pages: usize,
}

impl Default for ResultSetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSetStore {
    pub fn new() -> Self {
        Self::with_page_limit(usize::MAX)
    }

    /// A store that refuses to create more than `max_pages` pages.
    pub fn with_page_limit(max_pages: usize) -> Self {
        Self {
            pages: Vec::new(),
            current: None,
            max_pages,
        }
    }

    pub fn set_page_limit(&mut self, max_pages: usize) {
        self.max_pages = max_pages;
    }

    /// Find the page for `raster` and make it current.
    pub fn get_page(&mut self, raster: &RasterElement) -> Option<&mut ResultsPage> {
        let index = self.index_of(&raster.display_name)?;
        self.current = Some(index);
        self.pages.get_mut(index)
    }

    /// Create the page for `raster` and subscribe to the raster's deletion.
    ///
    /// Returns `None` when a page for the raster already exists (the existing
    /// page becomes current) or when the page limit is reached.
    pub fn create_page(
        &mut self,
        raster: &RasterElement,
        notifier: &mut dyn DeletionNotifier,
    ) -> Option<&mut ResultsPage> {
        if let Some(index) = self.index_of(&raster.display_name) {
            self.current = Some(index);
            return None;
        }
        if self.pages.len() >= self.max_pages {
            log::error!(
                "Cannot create a results page for '{}': limit of {} pages reached",
                raster.display_name,
                self.max_pages
            );
            return None;
        }

        let subscription = notifier.subscribe(&raster.name);
        self.pages.push(ResultsPage::new(raster, subscription));
        let index = self.pages.len() - 1;
        self.current = Some(index);
        log::info!("Created results page '{}'", raster.display_name);
        self.pages.get_mut(index)
    }

    /// Tear down the page of a deleted raster. No-op when it has no page.
    ///
    /// Releases exactly the subscription made by [`Self::create_page`] before
    /// the page is dropped.
    pub fn element_deleted(
        &mut self,
        raster: &RasterElement,
        notifier: &mut dyn DeletionNotifier,
    ) -> bool {
        let Some(index) = self.index_of(&raster.display_name) else {
            return false;
        };

        if !notifier.unsubscribe(self.pages[index].subscription()) {
            log::warn!(
                "Deletion subscription for '{}' was already released",
                raster.display_name
            );
        }
        self.pages.remove(index);
        self.current = match self.current {
            _ if self.pages.is_empty() => None,
            Some(c) if c > index => Some(c - 1),
            Some(c) if c == index => Some(index.min(self.pages.len() - 1)),
            other => other,
        };
        log::info!("Removed results page '{}'", raster.display_name);
        true
    }

    // -- Current page --

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Make the page at `index` current. Returns `false` if out of range.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.pages.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    pub fn current_page(&self) -> Option<&ResultsPage> {
        self.current.and_then(|i| self.pages.get(i))
    }

    pub fn current_page_mut(&mut self) -> Option<&mut ResultsPage> {
        self.current.and_then(|i| self.pages.get_mut(i))
    }

    /// Unique name of the raster behind the current page.
    pub fn raster_name_for_current_page(&self) -> Option<&str> {
        self.current_page().map(ResultsPage::raster_name)
    }

    /// Remove all results from the current page. The page itself stays.
    pub fn clear_current(&mut self) {
        if let Some(page) = self.current_page_mut() {
            page.clear();
        }
    }

    // -- Collection --

    pub fn pages(&self) -> &[ResultsPage] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn index_of(&self, display_name: &str) -> Option<usize> {
        self.pages
            .iter()
            .position(|p| p.display_name() == display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DeletionHub, SubscriptionId};

    /// Records every subscribe/unsubscribe call.
    #[derive(Default)]
    struct RecordingNotifier {
        hub: DeletionHub,
        subscribed: Vec<(String, SubscriptionId)>,
        unsubscribed: Vec<SubscriptionId>,
    }

    impl DeletionNotifier for RecordingNotifier {
        fn subscribe(&mut self, raster_name: &str) -> SubscriptionId {
            let id = self.hub.subscribe(raster_name);
            self.subscribed.push((raster_name.to_string(), id));
            id
        }

        fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
            self.unsubscribed.push(id);
            self.hub.unsubscribe(id)
        }
    }

    fn raster(display: &str) -> RasterElement {
        RasterElement::new(&format!("/data/{display}.hdr"), display, None)
    }

    #[test]
    fn at_most_one_page_per_raster() {
        let mut store = ResultSetStore::new();
        let mut notifier = RecordingNotifier::default();
        let scene = raster("Scene1");

        assert!(store.create_page(&scene, &mut notifier).is_some());
        assert!(store.create_page(&scene, &mut notifier).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(notifier.subscribed.len(), 1);
    }

    #[test]
    fn create_page_subscribes_to_that_raster() {
        let mut store = ResultSetStore::new();
        let mut notifier = RecordingNotifier::default();
        store.create_page(&raster("Scene1"), &mut notifier);

        assert_eq!(notifier.subscribed[0].0, "/data/Scene1.hdr");
        assert_eq!(notifier.hub.subscribers("/data/Scene1.hdr").len(), 1);
    }

    #[test]
    fn get_page_makes_page_current() {
        let mut store = ResultSetStore::new();
        let mut notifier = RecordingNotifier::default();
        let (a, b) = (raster("A"), raster("B"));
        store.create_page(&a, &mut notifier);
        store.create_page(&b, &mut notifier);
        assert_eq!(store.current_index(), Some(1));

        let page = store.get_page(&a).map(|p| p.display_name().to_string());
        assert_eq!(page.as_deref(), Some("A"));
        assert_eq!(store.current_index(), Some(0));
        assert!(store.get_page(&raster("C")).is_none());
        assert_eq!(store.current_index(), Some(0));
    }

    #[test]
    fn element_deleted_releases_exactly_its_subscription() {
        let mut store = ResultSetStore::new();
        let mut notifier = RecordingNotifier::default();
        let (a, b) = (raster("A"), raster("B"));
        store.create_page(&a, &mut notifier);
        store.create_page(&b, &mut notifier);
        let a_sub = notifier.subscribed[0].1;

        assert!(store.element_deleted(&a, &mut notifier));
        assert_eq!(notifier.unsubscribed, vec![a_sub]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.pages()[0].display_name(), "B");
        assert_eq!(notifier.hub.len(), 1);
    }

    #[test]
    fn deleting_raster_without_page_is_noop() {
        let mut store = ResultSetStore::new();
        let mut notifier = RecordingNotifier::default();
        store.create_page(&raster("A"), &mut notifier);

        assert!(!store.element_deleted(&raster("B"), &mut notifier));
        assert!(notifier.unsubscribed.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn current_index_follows_removal() {
        let mut store = ResultSetStore::new();
        let mut notifier = RecordingNotifier::default();
        let (a, b, c) = (raster("A"), raster("B"), raster("C"));
        for r in [&a, &b, &c] {
            store.create_page(r, &mut notifier);
        }
        // current is C (index 2); removing A shifts it down
        store.element_deleted(&a, &mut notifier);
        assert_eq!(store.current_page().map(|p| p.display_name()), Some("C"));

        store.element_deleted(&c, &mut notifier);
        assert_eq!(store.current_page().map(|p| p.display_name()), Some("B"));

        store.element_deleted(&b, &mut notifier);
        assert_eq!(store.current_index(), None);
    }

    #[test]
    fn page_limit_refuses_creation() {
        let mut store = ResultSetStore::with_page_limit(1);
        let mut notifier = RecordingNotifier::default();
        assert!(store.create_page(&raster("A"), &mut notifier).is_some());
        assert!(store.create_page(&raster("B"), &mut notifier).is_none());
        assert_eq!(notifier.subscribed.len(), 1);
    }

    #[test]
    fn current_page_resolves_raster_name() {
        let mut store = ResultSetStore::new();
        let mut notifier = RecordingNotifier::default();
        assert_eq!(store.raster_name_for_current_page(), None);
        store.create_page(&raster("A"), &mut notifier);
        assert_eq!(store.raster_name_for_current_page(), Some("/data/A.hdr"));
    }
}
