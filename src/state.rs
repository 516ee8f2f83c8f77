use std::path::PathBuf;
use std::rc::Rc;

use crate::average::{self, AverageError};
use crate::color::SignatureColors;
use crate::data::library::SpectralLibrary;
use crate::data::loader::Session;
use crate::data::model::{MatchResult, RasterElement, Signature};
use crate::events::DeletionHub;
use crate::locate::{self, LocateOptions, LocateOutcome, PluginArg, PluginArgs, PluginHost};
use crate::results::aggregator::{self, ProgressReporter, Severity};
use crate::results::store::ResultSetStore;
use crate::settings::MatchSettings;

const NO_RASTER_MESSAGE: &str = "Unable to determine the RasterElement for the current page.";

// ---------------------------------------------------------------------------
// Host collaborators
// ---------------------------------------------------------------------------

/// A plugin call as the viewer recorded it.
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub plugin: String,
    pub args: PluginArgs,
}

impl DispatchRecord {
    pub fn arg_text(&self, name: &str) -> String {
        match self.args.get(name) {
            Some(PluginArg::Element(s)) | Some(PluginArg::Text(s)) => s.clone(),
            Some(PluginArg::SignatureSet(set)) => set.signatures.join(", "),
            Some(PluginArg::Float(v)) => format!("{v}"),
            Some(PluginArg::Bool(b)) => b.to_string(),
            Some(PluginArg::Aoi(aoi)) => aoi.clone().unwrap_or_else(|| "<whole scene>".to_string()),
            None => String::new(),
        }
    }
}

/// Stand-in plugin host: records each locate dispatch instead of running it.
#[derive(Debug, Default)]
pub struct DispatchLog {
    pub history: Vec<DispatchRecord>,
}

impl PluginHost for DispatchLog {
    fn invoke(&mut self, plugin_name: &str, args: PluginArgs) {
        log::info!("Dispatching plugin '{plugin_name}' with {} argument(s)", args.len());
        self.history.push(DispatchRecord {
            plugin: plugin_name.to_string(),
            args,
        });
    }
}

/// Routes progress reports to the status line.
struct StatusReporter<'a> {
    status: &'a mut Option<String>,
}

impl ProgressReporter for StatusReporter<'_> {
    fn report(&mut self, message: &str, percent: u8, severity: Severity) {
        log::error!("{message} ({severity}, {percent}%)");
        *self.status = Some(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// Pending dialogs
// ---------------------------------------------------------------------------

/// Locate options being edited before dispatch.
#[derive(Debug, Clone)]
pub struct LocateDialog {
    pub raster: Rc<RasterElement>,
    pub signatures: Vec<String>,
    pub options: LocateOptions,
    /// AOI name as typed; empty means the whole scene.
    pub aoi_text: String,
}

/// Name prompt for an average whose inputs already resampled cleanly.
#[derive(Debug, Clone)]
pub struct AverageDialog {
    pub raster: Rc<RasterElement>,
    pub signatures: Vec<Rc<Signature>>,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: MatchSettings,
    pub settings_path: PathBuf,

    /// Rasters of the loaded session, in load order.
    pub rasters: Vec<Rc<RasterElement>>,
    pub library: SpectralLibrary,
    pub store: ResultSetStore,
    pub deletions: DeletionHub,
    pub plugins: DispatchLog,

    /// Most recently created average signature and the raster it belongs to.
    pub last_average: Option<(String, Rc<Signature>)>,
    /// (raster name, signature name) of every average created so far.
    averages: Vec<(String, String)>,

    pub show_results_window: bool,
    pub show_settings: bool,
    pub show_history: bool,
    /// Set by Expand All / Collapse All; consumed by the next render.
    pub tree_open_override: Option<bool>,

    pub locate_dialog: Option<LocateDialog>,
    pub average_dialog: Option<AverageDialog>,
    /// Modal message box text.
    pub message: Option<String>,
    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_settings(MatchSettings::default(), MatchSettings::default_path())
    }
}

impl AppState {
    pub fn with_settings(settings: MatchSettings, settings_path: PathBuf) -> Self {
        Self {
            store: ResultSetStore::with_page_limit(settings.max_result_pages),
            settings,
            settings_path,
            rasters: Vec::new(),
            library: SpectralLibrary::new(),
            deletions: DeletionHub::new(),
            plugins: DispatchLog::default(),
            last_average: None,
            averages: Vec::new(),
            show_results_window: true,
            show_settings: false,
            show_history: false,
            tree_open_override: None,
            locate_dialog: None,
            average_dialog: None,
            message: None,
            status_message: None,
        }
    }

    // -- Session --

    /// Replace the session. Existing rasters are deleted first, which
    /// tears down their results pages.
    pub fn set_session(&mut self, session: Session) {
        let old: Vec<String> = self.rasters.iter().map(|r| r.name.clone()).collect();
        for name in old {
            self.delete_raster(&name);
        }

        self.status_message = None;
        self.rasters = session.rasters;
        for signature in session.signatures {
            self.library.insert(signature);
        }
        for (result, colors) in &session.results {
            self.add_results(result, colors);
        }
        log::info!(
            "Session loaded: {} raster(s), {} signature(s), {} page(s)",
            self.rasters.len(),
            self.library.len(),
            self.store.len()
        );
    }

    pub fn add_results(&mut self, result: &MatchResult, colors: &SignatureColors) {
        let mut reporter = StatusReporter {
            status: &mut self.status_message,
        };
        if colors.is_empty() {
            aggregator::add_results_uncolored(
                &mut self.store,
                result,
                &mut self.deletions,
                Some(&mut reporter),
            );
        } else {
            aggregator::add_results(
                &mut self.store,
                result,
                colors,
                &mut self.deletions,
                Some(&mut reporter),
            );
        }
    }

    pub fn add_library_signatures(&mut self, signatures: Vec<Signature>) {
        let n = signatures.len();
        for signature in signatures {
            self.library.insert(signature);
        }
        log::info!("Imported {n} library signature(s)");
    }

    /// Delete a raster from the session and deliver its deletion notification.
    /// Averages created on the raster go with it.
    pub fn delete_raster(&mut self, raster_name: &str) {
        let Some(pos) = self.rasters.iter().position(|r| r.name == raster_name) else {
            return;
        };
        let raster = self.rasters.remove(pos);

        if !self.deletions.fire(raster_name).is_empty() {
            self.store.element_deleted(&raster, &mut self.deletions);
        }
        self.deletions.retire(raster_name);
        self.library.forget_raster(raster_name);
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.averages)
            .into_iter()
            .partition(|(raster, _)| raster == raster_name);
        self.averages = kept;
        for (_, name) in removed {
            if self.library.remove(&name).is_some() {
                log::info!("Removed average signature '{name}'");
            }
        }
        if self
            .last_average
            .as_ref()
            .is_some_and(|(r, _)| r == raster_name)
        {
            self.last_average = None;
        }
        log::info!("Deleted raster '{}'", raster.display_name);
    }

    // -- Current page --

    /// The raster behind the current page, if it is still in the session.
    pub fn raster_for_current_page(&self) -> Option<Rc<RasterElement>> {
        let name = self.store.raster_name_for_current_page()?;
        let mut matches = self.rasters.iter().filter(|r| r.name == name);
        match (matches.next(), matches.next()) {
            (Some(raster), None) => Some(raster.clone()),
            _ => None,
        }
    }

    pub fn selected_signatures(&self) -> Vec<String> {
        self.store
            .current_page()
            .map(|p| p.selected_signatures())
            .unwrap_or_default()
    }

    pub fn clear_current_page(&mut self) {
        self.store.clear_current();
    }

    // -- Locate --

    /// "Locate Signatures": dispatch right away, or open the options window
    /// when the settings ask for it.
    pub fn request_locate(&mut self) {
        let Some(raster) = self.raster_for_current_page() else {
            self.message = Some(NO_RASTER_MESSAGE.to_string());
            return;
        };
        let signatures = self.selected_signatures();
        if signatures.is_empty() {
            self.message = Some(locate::LocateError::NoSignaturesSelected.to_string());
            return;
        }

        if self.settings.display_locate_options {
            self.locate_dialog = Some(LocateDialog {
                raster,
                signatures,
                options: LocateOptions::from_settings(&self.settings),
                aoi_text: String::new(),
            });
            return;
        }

        match locate::invoke_locate(
            &raster,
            &signatures,
            &self.settings,
            &mut locate::AcceptDefaults,
            &mut self.plugins,
        ) {
            Ok(LocateOutcome::Dispatched(request)) => {
                self.status_message = Some(format!("Sent to {}", request.plugin_name()));
            }
            Ok(LocateOutcome::Cancelled) => {}
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    /// Options window accepted.
    pub fn confirm_locate(&mut self) {
        let Some(mut dialog) = self.locate_dialog.take() else {
            return;
        };
        let aoi = dialog.aoi_text.trim();
        dialog.options.aoi = (!aoi.is_empty()).then(|| aoi.to_string());

        match locate::dispatch_locate(
            &dialog.raster,
            &dialog.signatures,
            &dialog.options,
            &mut self.plugins,
        ) {
            Ok(request) => {
                self.status_message = Some(format!("Sent to {}", request.plugin_name()));
            }
            Err(e) => {
                log::error!("Locate failed: {e}");
                self.message = Some(e.to_string());
            }
        }
    }

    pub fn cancel_locate(&mut self) {
        self.locate_dialog = None;
    }

    // -- Average --

    /// "Create average Signature": check the selection resamples, then ask for a name.
    pub fn request_average(&mut self) {
        let Some(raster) = self.raster_for_current_page() else {
            self.message = Some(NO_RASTER_MESSAGE.to_string());
            return;
        };
        let names = self.selected_signatures();
        let mut signatures = Vec::with_capacity(names.len());
        for name in &names {
            match self.library.get(name) {
                Some(sig) => signatures.push(sig.clone()),
                None => {
                    self.message = Some(format!(
                        "Unable to access the resampled signature values for {name}"
                    ));
                    return;
                }
            }
        }

        let refs: Vec<&Signature> = signatures.iter().map(|s| s.as_ref()).collect();
        if let Err(e) = average::average_spectrum(&raster, &refs, &self.library) {
            self.report_average_error(&e);
            return;
        }
        self.average_dialog = Some(AverageDialog {
            raster,
            signatures,
            name: String::new(),
        });
    }

    /// Name prompt accepted. An empty name cancels; a name already in the
    /// library keeps the prompt open.
    pub fn confirm_average(&mut self) {
        let Some(dialog) = self.average_dialog.take() else {
            return;
        };
        if self.library.contains(&dialog.name) {
            self.message = Some(format!(
                "A signature named '{}' already exists. Enter a different name.",
                dialog.name
            ));
            self.average_dialog = Some(dialog);
            return;
        }
        let refs: Vec<&Signature> = dialog.signatures.iter().map(|s| s.as_ref()).collect();
        match average::compute_average(&dialog.raster, &refs, &self.library, &dialog.name) {
            Ok(Some(signature)) => {
                let name = signature.name.clone();
                self.library.insert(signature);
                self.averages.push((dialog.raster.name.clone(), name.clone()));
                self.last_average = self
                    .library
                    .get(&name)
                    .map(|s| (dialog.raster.name.clone(), s.clone()));
                self.status_message = Some(format!("Created signature '{name}'"));
            }
            Ok(None) => {}
            Err(e) => self.report_average_error(&e),
        }
    }

    pub fn cancel_average(&mut self) {
        self.average_dialog = None;
    }

    fn report_average_error(&mut self, e: &AverageError) {
        log::error!("Average signature failed: {e:#}");
        self.message = Some(e.to_string());
    }

    // -- Settings --

    pub fn apply_settings(&mut self) {
        self.store.set_page_limit(self.settings.max_result_pages);
        if let Err(e) = self.settings.save(&self.settings_path) {
            log::error!("Failed to save settings: {e:#}");
            self.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
