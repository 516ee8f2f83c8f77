use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::RasterElement;
use crate::settings::MatchSettings;

/// Name of the signature set handed to a locate plugin.
pub const SIGNATURE_SET_NAME: &str = "Match Result signatures";
const RESULTS_NAME_PREFIX: &str = "Spectral Library Match Locate Results - ";

// ---------------------------------------------------------------------------
// Algorithm policy
// ---------------------------------------------------------------------------

/// Algorithms that can locate matched signatures in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocateAlgorithm {
    #[serde(rename = "CEM")]
    Cem,
    #[default]
    #[serde(rename = "SAM")]
    Sam,
}

impl LocateAlgorithm {
    pub const ALL: [LocateAlgorithm; 2] = [LocateAlgorithm::Cem, LocateAlgorithm::Sam];

    /// Name of the plugin that runs this algorithm.
    pub fn plugin_name(self) -> &'static str {
        match self {
            LocateAlgorithm::Cem => "CEM",
            LocateAlgorithm::Sam => "SAM",
        }
    }

    /// Configured default threshold for this algorithm.
    pub fn default_threshold(self, settings: &MatchSettings) -> f64 {
        match self {
            LocateAlgorithm::Cem => settings.locate_cem_threshold,
            LocateAlgorithm::Sam => settings.locate_sam_threshold,
        }
    }

    /// Default name of the layer the plugin writes its results to.
    pub fn default_results_name(self) -> String {
        format!("{RESULTS_NAME_PREFIX}{}", self.plugin_name())
    }
}

impl fmt::Display for LocateAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.plugin_name())
    }
}

impl FromStr for LocateAlgorithm {
    type Err = LocateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CEM" => Ok(LocateAlgorithm::Cem),
            "SAM" => Ok(LocateAlgorithm::Sam),
            _ => Err(LocateError::UnknownAlgorithm(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum LocateError {
    #[error("No signatures are selected to be located.")]
    NoSignaturesSelected,

    #[error("Unknown value for Spectral Library Match locate algorithm: '{0}'")]
    UnknownAlgorithm(String),

    #[error("Locate threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),
}

// ---------------------------------------------------------------------------
// Options and request
// ---------------------------------------------------------------------------

/// User-adjustable locate parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LocateOptions {
    pub algorithm: LocateAlgorithm,
    pub threshold: f64,
    /// Empty means "derive from the plugin name".
    pub output_layer_name: String,
    /// Region of interest restricting the search; `None` searches the whole scene.
    pub aoi: Option<String>,
}

impl LocateOptions {
    pub fn from_settings(settings: &MatchSettings) -> Self {
        let algorithm = settings.locate_algorithm;
        Self {
            algorithm,
            threshold: algorithm.default_threshold(settings),
            output_layer_name: String::new(),
            aoi: None,
        }
    }
}

/// Signatures handed to a locate plugin as one target set.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureSet {
    pub name: String,
    pub signatures: Vec<String>,
}

/// Fully resolved locate call for one plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct LocateRequest {
    pub algorithm: LocateAlgorithm,
    pub raster: String,
    pub targets: SignatureSet,
    pub threshold: f64,
    pub aoi: Option<String>,
    pub display_results: bool,
    pub results_name: String,
}

impl LocateRequest {
    pub fn new(raster: &RasterElement, signatures: &[String], options: &LocateOptions) -> Self {
        let results_name = if options.output_layer_name.trim().is_empty() {
            options.algorithm.default_results_name()
        } else {
            options.output_layer_name.clone()
        };
        Self {
            algorithm: options.algorithm,
            raster: raster.name.clone(),
            targets: SignatureSet {
                name: SIGNATURE_SET_NAME.to_string(),
                signatures: signatures.to_vec(),
            },
            threshold: options.threshold,
            aoi: options.aoi.clone(),
            display_results: true,
            results_name,
        }
    }

    pub fn plugin_name(&self) -> &'static str {
        self.algorithm.plugin_name()
    }

    pub fn validate(&self) -> Result<(), LocateError> {
        if self.targets.signatures.is_empty() {
            return Err(LocateError::NoSignaturesSelected);
        }
        if !self.threshold.is_finite() {
            return Err(LocateError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    /// Named-argument form expected by the plugin host.
    pub fn to_plugin_args(&self) -> PluginArgs {
        let mut args = PluginArgs::new();
        args.insert("Data Element".to_string(), PluginArg::Element(self.raster.clone()));
        args.insert(
            "Target Signatures".to_string(),
            PluginArg::SignatureSet(self.targets.clone()),
        );
        args.insert("Threshold".to_string(), PluginArg::Float(self.threshold));
        args.insert("AOI".to_string(), PluginArg::Aoi(self.aoi.clone()));
        args.insert("Display Results".to_string(), PluginArg::Bool(self.display_results));
        args.insert("Results Name".to_string(), PluginArg::Text(self.results_name.clone()));
        args
    }
}

// ---------------------------------------------------------------------------
// Plugin host boundary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PluginArg {
    Element(String),
    SignatureSet(SignatureSet),
    Float(f64),
    Bool(bool),
    Text(String),
    Aoi(Option<String>),
}

pub type PluginArgs = BTreeMap<String, PluginArg>;

/// Executes plugins by name. The result of the plugin is not reported back.
pub trait PluginHost {
    fn invoke(&mut self, plugin_name: &str, args: PluginArgs);
}

/// Lets the user review and override the locate defaults.
pub trait LocateOptionsPrompt {
    /// `None` cancels the locate.
    fn prompt(&mut self, raster: &RasterElement, defaults: &LocateOptions) -> Option<LocateOptions>;
}

/// Prompt that accepts the defaults unchanged.
pub struct AcceptDefaults;

impl LocateOptionsPrompt for AcceptDefaults {
    fn prompt(&mut self, _raster: &RasterElement, defaults: &LocateOptions) -> Option<LocateOptions> {
        Some(defaults.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocateOutcome {
    Dispatched(LocateRequest),
    Cancelled,
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// Build, validate and send a locate request with already chosen options.
pub fn dispatch_locate(
    raster: &RasterElement,
    signatures: &[String],
    options: &LocateOptions,
    host: &mut dyn PluginHost,
) -> Result<LocateRequest, LocateError> {
    let request = LocateRequest::new(raster, signatures, options);
    request.validate()?;
    log::info!(
        "Locating {} signature(s) in '{}' with {} (threshold {})",
        request.targets.signatures.len(),
        raster.display_name,
        request.plugin_name(),
        request.threshold
    );
    host.invoke(request.plugin_name(), request.to_plugin_args());
    Ok(request)
}

/// Locate the selected signatures in `raster`.
///
/// Defaults come from `settings`; when the settings ask for it, `prompt`
/// may override them or cancel.
pub fn invoke_locate(
    raster: &RasterElement,
    signatures: &[String],
    settings: &MatchSettings,
    prompt: &mut dyn LocateOptionsPrompt,
    host: &mut dyn PluginHost,
) -> Result<LocateOutcome, LocateError> {
    if signatures.is_empty() {
        return Err(LocateError::NoSignaturesSelected);
    }

    let mut options = LocateOptions::from_settings(settings);
    if settings.display_locate_options {
        match prompt.prompt(raster, &options) {
            Some(chosen) => options = chosen,
            None => return Ok(LocateOutcome::Cancelled),
        }
    }

    dispatch_locate(raster, signatures, &options, host).map(LocateOutcome::Dispatched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<(String, PluginArgs)>,
    }

    impl PluginHost for RecordingHost {
        fn invoke(&mut self, plugin_name: &str, args: PluginArgs) {
            self.calls.push((plugin_name.to_string(), args));
        }
    }

    struct Scripted(Option<LocateOptions>);

    impl LocateOptionsPrompt for Scripted {
        fn prompt(&mut self, _raster: &RasterElement, _defaults: &LocateOptions) -> Option<LocateOptions> {
            self.0.clone()
        }
    }

    fn scene() -> RasterElement {
        RasterElement::new("/data/scene1.hdr", "Scene1", None)
    }

    fn selection() -> Vec<String> {
        vec!["Alunite".to_string(), "Kaolinite".to_string()]
    }

    fn non_interactive(algorithm: LocateAlgorithm) -> MatchSettings {
        MatchSettings {
            locate_algorithm: algorithm,
            locate_sam_threshold: 4.5,
            locate_cem_threshold: 0.25,
            display_locate_options: false,
            ..MatchSettings::default()
        }
    }

    #[test]
    fn sam_defaults_without_prompt() {
        let mut host = RecordingHost::default();
        let outcome = invoke_locate(
            &scene(),
            &selection(),
            &non_interactive(LocateAlgorithm::Sam),
            &mut Scripted(None),
            &mut host,
        )
        .unwrap();

        let LocateOutcome::Dispatched(request) = outcome else {
            panic!("expected a dispatch");
        };
        assert_eq!(request.plugin_name(), "SAM");
        assert_eq!(request.threshold, 4.5);
        assert_eq!(request.results_name, "Spectral Library Match Locate Results - SAM");
        assert_eq!(host.calls.len(), 1);
        assert_eq!(host.calls[0].0, "SAM");
    }

    #[test]
    fn cem_uses_cem_threshold() {
        let mut host = RecordingHost::default();
        let outcome = invoke_locate(
            &scene(),
            &selection(),
            &non_interactive(LocateAlgorithm::Cem),
            &mut AcceptDefaults,
            &mut host,
        )
        .unwrap();

        let LocateOutcome::Dispatched(request) = outcome else {
            panic!("expected a dispatch");
        };
        assert_eq!(request.plugin_name(), "CEM");
        assert_eq!(request.threshold, 0.25);
        assert_eq!(host.calls[0].1["Threshold"], PluginArg::Float(0.25));
    }

    #[test]
    fn prompt_overrides_defaults() {
        let mut settings = non_interactive(LocateAlgorithm::Sam);
        settings.display_locate_options = true;
        let chosen = LocateOptions {
            algorithm: LocateAlgorithm::Cem,
            threshold: 0.9,
            output_layer_name: "My layer".to_string(),
            aoi: Some("Field AOI".to_string()),
        };
        let mut host = RecordingHost::default();
        invoke_locate(&scene(), &selection(), &settings, &mut Scripted(Some(chosen)), &mut host)
            .unwrap();

        let (plugin, args) = &host.calls[0];
        assert_eq!(plugin, "CEM");
        assert_eq!(args["Threshold"], PluginArg::Float(0.9));
        assert_eq!(args["Results Name"], PluginArg::Text("My layer".to_string()));
        assert_eq!(args["AOI"], PluginArg::Aoi(Some("Field AOI".to_string())));
    }

    #[test]
    fn cancelled_prompt_dispatches_nothing() {
        let mut settings = non_interactive(LocateAlgorithm::Sam);
        settings.display_locate_options = true;
        let mut host = RecordingHost::default();
        let outcome =
            invoke_locate(&scene(), &selection(), &settings, &mut Scripted(None), &mut host).unwrap();

        assert_eq!(outcome, LocateOutcome::Cancelled);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn empty_layer_name_falls_back_to_plugin_name() {
        let options = LocateOptions {
            algorithm: LocateAlgorithm::Cem,
            threshold: 0.3,
            output_layer_name: "  ".to_string(),
            aoi: None,
        };
        let request = LocateRequest::new(&scene(), &selection(), &options);
        assert_eq!(request.results_name, "Spectral Library Match Locate Results - CEM");
    }

    #[test]
    fn argument_bag_carries_exactly_the_selection() {
        let options = LocateOptions::from_settings(&non_interactive(LocateAlgorithm::Sam));
        let args = LocateRequest::new(&scene(), &selection(), &options).to_plugin_args();

        assert_eq!(args.len(), 6);
        assert_eq!(args["Data Element"], PluginArg::Element("/data/scene1.hdr".to_string()));
        assert_eq!(args["Display Results"], PluginArg::Bool(true));
        assert_eq!(args["AOI"], PluginArg::Aoi(None));
        assert_eq!(
            args["Target Signatures"],
            PluginArg::SignatureSet(SignatureSet {
                name: SIGNATURE_SET_NAME.to_string(),
                signatures: selection(),
            })
        );
    }

    #[test]
    fn empty_selection_is_rejected() {
        let mut host = RecordingHost::default();
        let err = invoke_locate(
            &scene(),
            &[],
            &non_interactive(LocateAlgorithm::Sam),
            &mut AcceptDefaults,
            &mut host,
        )
        .unwrap_err();
        assert_eq!(err, LocateError::NoSignaturesSelected);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let options = LocateOptions {
            threshold: f64::NAN,
            ..LocateOptions::from_settings(&MatchSettings::default())
        };
        let mut host = RecordingHost::default();
        let err = dispatch_locate(&scene(), &selection(), &options, &mut host).unwrap_err();
        assert!(matches!(err, LocateError::InvalidThreshold(_)));
        assert!(host.calls.is_empty());
    }

    #[test]
    fn algorithm_names_parse() {
        assert_eq!("sam".parse::<LocateAlgorithm>(), Ok(LocateAlgorithm::Sam));
        assert_eq!(" CEM ".parse::<LocateAlgorithm>(), Ok(LocateAlgorithm::Cem));
        assert_eq!(
            "ACE".parse::<LocateAlgorithm>(),
            Err(LocateError::UnknownAlgorithm("ACE".to_string()))
        );
    }
}
