use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use eframe::egui::Color32;
use serde::Deserialize;

use crate::color::SignatureColors;

use super::model::{
    MatchResult, MatchRow, RasterElement, Signature, UnitType, Units, REFLECTANCE, WAVELENGTH,
};

// ---------------------------------------------------------------------------
// Session files
// ---------------------------------------------------------------------------

/// Everything a session file describes.
#[derive(Debug, Default)]
pub struct Session {
    pub rasters: Vec<Rc<RasterElement>>,
    pub signatures: Vec<Signature>,
    /// Match results in file order, each with its row colours.
    pub results: Vec<(MatchResult, SignatureColors)>,
}

#[derive(Deserialize)]
struct SessionFile {
    #[serde(default)]
    rasters: Vec<RasterElement>,
    #[serde(default)]
    signatures: Vec<Signature>,
    #[serde(default)]
    results: Vec<ResultRecord>,
}

#[derive(Deserialize)]
struct ResultRecord {
    raster: String,
    target: String,
    #[serde(default)]
    target_values: Vec<f64>,
    #[serde(default)]
    algorithm: String,
    #[serde(default)]
    matches: Vec<MatchRecord>,
}

#[derive(Deserialize)]
struct MatchRecord {
    signature: String,
    score: f64,
    #[serde(default)]
    color: Option<[u8; 3]>,
}

/// Load a session: rasters, library signatures and match results.
///
/// Expected JSON layout:
///
/// ```json
/// {
///   "rasters":    [{ "name": "/data/scene1.hdr", "display_name": "Scene1",
///                    "descriptor": { "band_count": 4, "units": { "unit_name": "Reflectance" } },
///                    "metadata": { "Special": { "Wavelengths": { "Center Values": [...] } } } }],
///   "signatures": [{ "name": "Alunite", "data": { "Wavelength": [...], "Reflectance": [...] } }],
///   "results":    [{ "raster": "/data/scene1.hdr", "target": "Pixel (10, 12)",
///                    "target_values": [...], "algorithm": "SAM",
///                    "matches": [{ "signature": "Alunite", "score": 3.2, "color": [255, 0, 0] }] }]
/// }
/// ```
///
/// Results are matched to rasters by unique name; a result naming an unknown
/// raster is kept without one and is therefore invalid.
pub fn load_session(path: &Path) -> Result<Session> {
    let text = std::fs::read_to_string(path).context("reading session file")?;
    parse_session(&text).with_context(|| format!("loading session {}", path.display()))
}

pub fn parse_session(text: &str) -> Result<Session> {
    let file: SessionFile = serde_json::from_str(text).context("parsing session JSON")?;

    let mut display_names = BTreeSet::new();
    let mut rasters: Vec<Rc<RasterElement>> = Vec::with_capacity(file.rasters.len());
    let mut by_name: BTreeMap<String, Rc<RasterElement>> = BTreeMap::new();
    for raster in file.rasters {
        if !display_names.insert(raster.display_name.clone()) {
            bail!("Duplicate raster display name '{}'", raster.display_name);
        }
        let raster = Rc::new(raster);
        if by_name.insert(raster.name.clone(), raster.clone()).is_some() {
            bail!("Duplicate raster name '{}'", raster.name);
        }
        rasters.push(raster);
    }
    let known_signatures: BTreeSet<&str> = file.signatures.iter().map(|s| s.name.as_str()).collect();

    let mut results = Vec::with_capacity(file.results.len());
    for (i, record) in file.results.into_iter().enumerate() {
        let raster = by_name.get(&record.raster).cloned();
        if raster.is_none() {
            log::warn!("Result {i} refers to unknown raster '{}'", record.raster);
        }

        let mut colors = SignatureColors::new();
        let mut rows = Vec::with_capacity(record.matches.len());
        for (rank, m) in record.matches.into_iter().enumerate() {
            if !known_signatures.contains(m.signature.as_str()) {
                log::warn!("Result {i} matches unknown signature '{}'", m.signature);
            }
            if let Some([r, g, b]) = m.color {
                colors.insert(&m.signature, Color32::from_rgb(r, g, b));
            }
            rows.push(MatchRow {
                signature: m.signature,
                score: m.score,
                rank: rank + 1,
            });
        }

        let result = MatchResult {
            raster,
            target_name: record.target,
            target_values: record.target_values,
            algorithm: record.algorithm,
            rows,
        };
        results.push((result, colors));
    }

    Ok(Session {
        rasters,
        signatures: file.signatures,
        results,
    })
}

// ---------------------------------------------------------------------------
// Signature library files
// ---------------------------------------------------------------------------

/// Load library signatures from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json` – `[{ "name": ..., "data": { "Wavelength": [...], "Reflectance": [...] } }, ...]`
/// * `.csv`  – columns `name`, `wavelength`, `reflectance` (semicolon-separated floats)
///             and an optional `units` column
pub fn load_signature_library(path: &Path) -> Result<Vec<Signature>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            serde_json::from_str(&text).context("parsing signature JSON")
        }
        "csv" => {
            let reader = csv::Reader::from_path(path).context("opening CSV")?;
            read_signature_csv(reader)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn read_signature_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Signature>> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let name_idx = column("name").context("CSV missing 'name' column")?;
    let wl_idx = column("wavelength").context("CSV missing 'wavelength' column")?;
    let refl_idx = column("reflectance").context("CSV missing 'reflectance' column")?;
    let units_idx = column("units");

    let mut signatures = Vec::new();
    for (row_no, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("CSV row {row_no}"))?;

        let name = record.get(name_idx).unwrap_or("").trim();
        if name.is_empty() {
            bail!("CSV row {row_no}: empty signature name");
        }
        let wavelengths =
            parse_semicolon_floats(record.get(wl_idx).unwrap_or(""), row_no, "wavelength")?;
        let reflectance =
            parse_semicolon_floats(record.get(refl_idx).unwrap_or(""), row_no, "reflectance")?;
        if wavelengths.len() != reflectance.len() {
            bail!(
                "CSV row {row_no}: wavelength has {} values but reflectance has {}",
                wavelengths.len(),
                reflectance.len()
            );
        }

        let mut signature = Signature::new(name);
        signature.set_data(WAVELENGTH, wavelengths);
        signature.set_data(REFLECTANCE, reflectance);
        if let Some(unit_name) = units_idx.and_then(|i| record.get(i)).map(str::trim) {
            if !unit_name.is_empty() {
                signature.set_units(
                    REFLECTANCE,
                    Units {
                        unit_name: unit_name.to_string(),
                        unit_type: UnitType::Reflectance,
                        scale_from_standard: 1.0,
                    },
                );
            }
        }
        signatures.push(signature);
    }
    Ok(signatures)
}

fn parse_semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}
