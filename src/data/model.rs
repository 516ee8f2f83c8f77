use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Name of the data vector holding a signature's spectral values.
pub const REFLECTANCE: &str = "Reflectance";
/// Name of the data vector holding a signature's wavelength axis.
pub const WAVELENGTH: &str = "Wavelength";

/// Metadata path of a raster's band center wavelengths.
const CENTER_WAVELENGTHS_PATH: [&str; 3] = ["Special", "Wavelengths", "Center Values"];

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Physical quantity measured by a data vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitType {
    #[default]
    Reflectance,
    Radiance,
    Emissance,
    Transmittance,
    Absorbance,
    #[serde(rename = "Digital Number")]
    DigitalNumber,
    Custom,
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitType::Reflectance => "Reflectance",
            UnitType::Radiance => "Radiance",
            UnitType::Emissance => "Emissance",
            UnitType::Transmittance => "Transmittance",
            UnitType::Absorbance => "Absorbance",
            UnitType::DigitalNumber => "Digital Number",
            UnitType::Custom => "Custom",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Units {
    pub unit_name: String,
    #[serde(default)]
    pub unit_type: UnitType,
    /// Multiplier taking stored values to standard units.
    #[serde(default = "default_scale")]
    pub scale_from_standard: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for Units {
    fn default() -> Self {
        Self {
            unit_name: "Reflectance".to_string(),
            unit_type: UnitType::Reflectance,
            scale_from_standard: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// RasterElement – a scene with per-band spectral structure
// ---------------------------------------------------------------------------

/// Band layout and measurement units of a raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterDataDescriptor {
    pub band_count: usize,
    #[serde(default)]
    pub units: Units,
}

/// A scene loaded in the session. Referenced by the results store, never owned by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterElement {
    /// Unique name (typically the file the scene was loaded from).
    pub name: String,
    /// Short name shown on the results tab; unique per session.
    pub display_name: String,
    #[serde(default)]
    pub descriptor: Option<RasterDataDescriptor>,
    #[serde(default)]
    pub metadata: JsonValue,
}

impl RasterElement {
    #[cfg(test)]
    pub fn new(name: &str, display_name: &str, descriptor: Option<RasterDataDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            descriptor,
            metadata: JsonValue::Null,
        }
    }

    pub fn band_count(&self) -> Option<usize> {
        self.descriptor.as_ref().map(|d| d.band_count)
    }

    /// Band center wavelengths read from the metadata tree. Empty when absent.
    pub fn center_wavelengths(&self) -> Vec<f64> {
        let mut node = &self.metadata;
        for key in CENTER_WAVELENGTHS_PATH {
            match node.get(key) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        node.as_array()
            .map(|values| values.iter().filter_map(JsonValue::as_f64).collect())
            .unwrap_or_default()
    }

    /// Store band center wavelengths at the standard metadata path.
    #[cfg(test)]
    pub fn set_center_wavelengths(&mut self, centers: &[f64]) {
        let [special, wavelengths, center_values] = CENTER_WAVELENGTHS_PATH;
        let node = object_child(object_child(&mut self.metadata, special), wavelengths);
        *object_child(node, center_values) = serde_json::json!(centers);
    }
}

/// Child `key` of `node`, turning `node` into an object first if it is not one.
#[cfg(test)]
fn object_child<'a>(node: &'a mut JsonValue, key: &str) -> &'a mut JsonValue {
    if !node.is_object() {
        *node = JsonValue::Object(Default::default());
    }
    &mut node[key]
}

// ---------------------------------------------------------------------------
// Signature – a named spectrum with one or more data vectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    #[serde(default)]
    pub data: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub units: BTreeMap<String, Units>,
}

impl Signature {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn set_data(&mut self, key: &str, values: Vec<f64>) {
        self.data.insert(key.to_string(), values);
    }

    pub fn data(&self, key: &str) -> Option<&[f64]> {
        self.data.get(key).map(Vec::as_slice)
    }

    pub fn set_units(&mut self, key: &str, units: Units) {
        self.units.insert(key.to_string(), units);
    }

    #[cfg(test)]
    pub fn units(&self, key: &str) -> Option<&Units> {
        self.units.get(key)
    }
}

// ---------------------------------------------------------------------------
// MatchResult – output of a spectral library match
// ---------------------------------------------------------------------------

/// One matched library signature.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRow {
    pub signature: String,
    pub score: f64,
    /// 1-based position in the match list.
    pub rank: usize,
}

/// Library matches for one in-scene target (a pixel or AOI average).
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub raster: Option<Rc<RasterElement>>,
    pub target_name: String,
    pub target_values: Vec<f64>,
    /// Label of the algorithm that produced the scores (e.g. "SAM").
    pub algorithm: String,
    pub rows: Vec<MatchRow>,
}

impl MatchResult {
    /// Build a result whose rows are ranked in the order given.
    #[cfg(test)]
    pub fn ranked(
        raster: Rc<RasterElement>,
        target_name: &str,
        target_values: Vec<f64>,
        algorithm: &str,
        scores: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        let rows = scores
            .into_iter()
            .enumerate()
            .map(|(i, (signature, score))| MatchRow {
                signature,
                score,
                rank: i + 1,
            })
            .collect();
        Self {
            raster: Some(raster),
            target_name: target_name.to_string(),
            target_values,
            algorithm: algorithm.to_string(),
            rows,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.raster.is_some() && !self.target_name.is_empty() && !self.target_values.is_empty()
    }
}
