/// Results layer: per-raster pages of match results.
///
/// ```text
///   MatchResult (+ SignatureColors)
///        │
///        ▼
///   ┌────────────┐
///   │ aggregator │  drop invalid results, find-or-create page
///   └────────────┘
///        │
///        ▼
///   ┌────────────┐
///   │   store    │  one ResultsPage per raster, deletion subscriptions
///   └────────────┘
///        │
///        ▼
///   ┌────────────┐
///   │    page    │  appended rows, colours, selection
///   └────────────┘
/// ```

pub mod aggregator;
pub mod page;
pub mod store;
