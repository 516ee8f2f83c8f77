use std::fmt;

use crate::color::SignatureColors;
use crate::data::model::MatchResult;
use crate::events::DeletionNotifier;

use super::store::ResultSetStore;

pub const PAGE_UNAVAILABLE_MESSAGE: &str = "Error: Unable to access the results page";

// ---------------------------------------------------------------------------
// Progress / notification channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Errors,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Errors => write!(f, "error"),
        }
    }
}

pub trait ProgressReporter {
    fn report(&mut self, message: &str, percent: u8, severity: Severity);
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Merge a match result into the page of its raster, creating the page on
/// first use. Invalid results are dropped silently.
pub fn add_results(
    store: &mut ResultSetStore,
    result: &MatchResult,
    colors: &SignatureColors,
    notifier: &mut dyn DeletionNotifier,
    progress: Option<&mut dyn ProgressReporter>,
) {
    if !result.is_valid() {
        return;
    }
    let Some(raster) = result.raster.as_deref() else {
        return;
    };

    if store.get_page(raster).is_none() && store.create_page(raster, notifier).is_none() {
        if let Some(progress) = progress {
            progress.report(PAGE_UNAVAILABLE_MESSAGE, 0, Severity::Errors);
        }
        return;
    }
    // get_page/create_page both leave the raster's page current
    if let Some(page) = store.current_page_mut() {
        page.add_results(result, colors);
        log::debug!(
            "Added {} match(es) for '{}' to page '{}'",
            result.rows.len(),
            result.target_name,
            page.display_name()
        );
    }
}

/// [`add_results`] without signature colours.
pub fn add_results_uncolored(
    store: &mut ResultSetStore,
    result: &MatchResult,
    notifier: &mut dyn DeletionNotifier,
    progress: Option<&mut dyn ProgressReporter>,
) {
    add_results(store, result, &SignatureColors::new(), notifier, progress);
}
