use eframe::egui::Color32;

use crate::color::SignatureColors;
use crate::data::model::{MatchResult, MatchRow, RasterElement};
use crate::events::SubscriptionId;

// ---------------------------------------------------------------------------
// Page contents
// ---------------------------------------------------------------------------

/// A matched signature as shown on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRow {
    pub row: MatchRow,
    /// Explicit display colour; `None` renders with the default text colour.
    pub color: Option<Color32>,
}

/// All matches for one in-scene target (a top-level tree node).
#[derive(Debug, Clone, PartialEq)]
pub struct PageEntry {
    pub target_name: String,
    pub algorithm: String,
    pub target_values: Vec<f64>,
    pub rows: Vec<PageRow>,
}

/// Something the user can select on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    /// A target node; selecting it selects every row below it.
    Target(usize),
    Row { entry: usize, row: usize },
}

// ---------------------------------------------------------------------------
// ResultsPage
// ---------------------------------------------------------------------------

/// Match results for exactly one raster.
#[derive(Debug, Clone)]
pub struct ResultsPage {
    raster_name: String,
    display_name: String,
    subscription: SubscriptionId,
    entries: Vec<PageEntry>,
    /// Selected items in the order they were selected.
    selection: Vec<PageItem>,
}

impl ResultsPage {
    pub(crate) fn new(raster: &RasterElement, subscription: SubscriptionId) -> Self {
        Self {
            raster_name: raster.name.clone(),
            display_name: raster.display_name.clone(),
            subscription,
            entries: Vec::new(),
            selection: Vec::new(),
        }
    }

    /// Unique name of the raster this page belongs to.
    pub fn raster_name(&self) -> &str {
        &self.raster_name
    }

    /// Tab text; the key the store looks pages up by.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub(crate) fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    pub fn row_count(&self) -> usize {
        self.entries.iter().map(|e| e.rows.len()).sum()
    }

    /// Append the rows of `result`. Earlier results for the same target are kept.
    pub fn add_results(&mut self, result: &MatchResult, colors: &SignatureColors) {
        let rows = result
            .rows
            .iter()
            .map(|row| PageRow {
                row: row.clone(),
                color: colors.get(&row.signature),
            })
            .collect();
        self.entries.push(PageEntry {
            target_name: result.target_name.clone(),
            algorithm: result.algorithm.clone(),
            target_values: result.target_values.clone(),
            rows,
        });
    }

    /// Remove every result from the page.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.selection.clear();
    }

    // -- Selection --

    #[cfg(test)]
    pub fn selection(&self) -> &[PageItem] {
        &self.selection
    }

    pub fn is_selected(&self, item: PageItem) -> bool {
        self.selection.contains(&item)
    }

    /// Replace the selection with a single item.
    pub fn select_only(&mut self, item: PageItem) {
        self.selection.clear();
        if self.contains(item) {
            self.selection.push(item);
        }
    }

    /// Add `item` to the selection, or remove it if already selected.
    pub fn toggle(&mut self, item: PageItem) {
        if let Some(pos) = self.selection.iter().position(|s| *s == item) {
            self.selection.remove(pos);
        } else if self.contains(item) {
            self.selection.push(item);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Signature names behind the selection, first occurrence wins.
    ///
    /// A selected target contributes all of its rows; a selected row
    /// contributes its own signature.
    pub fn selected_signatures(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        };
        for item in &self.selection {
            match *item {
                PageItem::Target(entry) => {
                    if let Some(entry) = self.entries.get(entry) {
                        for row in &entry.rows {
                            push(&row.row.signature);
                        }
                    }
                }
                PageItem::Row { entry, row } => {
                    if let Some(row) = self.entries.get(entry).and_then(|e| e.rows.get(row)) {
                        push(&row.row.signature);
                    }
                }
            }
        }
        names
    }

    fn contains(&self, item: PageItem) -> bool {
        match item {
            PageItem::Target(entry) => entry < self.entries.len(),
            PageItem::Row { entry, row } => self
                .entries
                .get(entry)
                .is_some_and(|e| row < e.rows.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::events::{DeletionHub, DeletionNotifier};

    fn page_with(results: &[(&str, &[&str])]) -> ResultsPage {
        let raster = Rc::new(RasterElement::new("/data/scene1.hdr", "Scene1", None));
        let mut hub = DeletionHub::new();
        let mut page = ResultsPage::new(&raster, hub.subscribe(&raster.name));
        for (target, sigs) in results {
            let scores = sigs.iter().map(|s| (s.to_string(), 1.0));
            let result = MatchResult::ranked(raster.clone(), target, vec![0.5], "SAM", scores);
            page.add_results(&result, &SignatureColors::new());
        }
        page
    }

    #[test]
    fn add_results_appends_without_merging() {
        let mut page = page_with(&[("Pixel (1, 1)", &["A", "B"][..])]);
        let raster = Rc::new(RasterElement::new("/data/scene1.hdr", "Scene1", None));
        let again = MatchResult::ranked(
            raster,
            "Pixel (1, 1)",
            vec![0.5],
            "SAM",
            vec![("A".to_string(), 1.0)],
        );
        page.add_results(&again, &SignatureColors::new());

        assert_eq!(page.entries().len(), 2);
        assert_eq!(page.row_count(), 3);
    }

    #[test]
    fn rows_pick_up_colors() {
        let raster = Rc::new(RasterElement::new("r", "r", None));
        let mut hub = DeletionHub::new();
        let mut page = ResultsPage::new(&raster, hub.subscribe("r"));
        let mut colors = SignatureColors::new();
        colors.insert("A", Color32::RED);
        let result = MatchResult::ranked(
            raster,
            "t",
            vec![1.0],
            "SAM",
            vec![("A".to_string(), 1.0), ("B".to_string(), 2.0)],
        );
        page.add_results(&result, &colors);

        let rows = &page.entries()[0].rows;
        assert_eq!(rows[0].color, Some(Color32::RED));
        assert_eq!(rows[1].color, None);
    }

    #[test]
    fn selected_signatures_dedup_in_selection_order() {
        let mut page = page_with(&[("t1", &["A", "B"][..]), ("t2", &["C", "A"][..])]);
        page.toggle(PageItem::Row { entry: 1, row: 0 });
        page.toggle(PageItem::Target(0));
        page.toggle(PageItem::Row { entry: 1, row: 1 });

        assert_eq!(page.selected_signatures(), vec!["C", "A", "B"]);
    }

    #[test]
    fn toggle_twice_deselects() {
        let mut page = page_with(&[("t1", &["A"][..])]);
        let item = PageItem::Row { entry: 0, row: 0 };
        page.toggle(item);
        assert!(page.is_selected(item));
        page.toggle(item);
        assert!(page.selected_signatures().is_empty());
    }

    #[test]
    fn out_of_range_items_are_not_selectable() {
        let mut page = page_with(&[("t1", &["A"][..])]);
        page.select_only(PageItem::Row { entry: 0, row: 5 });
        page.toggle(PageItem::Target(3));
        assert!(page.selection().is_empty());
    }

    #[test]
    fn clear_drops_rows_and_selection() {
        let mut page = page_with(&[("t1", &["A"][..])]);
        page.select_only(PageItem::Target(0));
        page.clear();
        assert!(page.entries().is_empty());
        assert!(page.selection().is_empty());
    }
}
