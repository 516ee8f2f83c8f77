use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{bail, Context, Result};

use crate::average::ResamplingService;

use super::model::{RasterElement, Signature, REFLECTANCE, WAVELENGTH};

// ---------------------------------------------------------------------------
// SpectralLibrary – signatures plus a per-raster resampling cache
// ---------------------------------------------------------------------------

/// Library signatures, resampled on demand to the band centres of a raster.
#[derive(Debug, Default)]
pub struct SpectralLibrary {
    signatures: BTreeMap<String, Rc<Signature>>,
    /// (raster name, signature name) → resampled values.
    resampled: RefCell<BTreeMap<(String, String), Vec<f64>>>,
}

impl SpectralLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a signature. Replacing drops its cached resamplings.
    pub fn insert(&mut self, signature: Signature) {
        let name = signature.name.clone();
        self.resampled
            .get_mut()
            .retain(|(_, sig), _| *sig != name);
        self.signatures.insert(name, Rc::new(signature));
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Signature>> {
        self.signatures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.signatures.contains_key(name)
    }

    /// Drop a signature and its cached resamplings.
    pub fn remove(&mut self, name: &str) -> Option<Rc<Signature>> {
        self.resampled
            .get_mut()
            .retain(|(_, sig), _| sig != name);
        self.signatures.remove(name)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Forget cached resamplings for a raster that went away.
    pub fn forget_raster(&mut self, raster_name: &str) {
        self.resampled
            .get_mut()
            .retain(|(raster, _), _| raster != raster_name);
    }

    #[cfg(test)]
    pub fn cached_count(&self) -> usize {
        self.resampled.borrow().len()
    }
}

impl ResamplingService for SpectralLibrary {
    fn resample(&self, raster: &RasterElement, signature: &Signature) -> Result<Vec<f64>> {
        let key = (raster.name.clone(), signature.name.clone());
        if let Some(values) = self.resampled.borrow().get(&key) {
            log::debug!("Resample cache hit for '{}' on '{}'", key.1, raster.display_name);
            return Ok(values.clone());
        }

        let values = resample_to_raster(raster, signature)?;
        self.resampled.borrow_mut().insert(key, values.clone());
        Ok(values)
    }
}

// ---------------------------------------------------------------------------
// Linear resampling
// ---------------------------------------------------------------------------

/// Interpolate a signature's reflectance at the raster's band centres.
///
/// A raster without wavelength metadata only accepts signatures that
/// already have one value per band.
pub fn resample_to_raster(raster: &RasterElement, signature: &Signature) -> Result<Vec<f64>> {
    let band_count = raster
        .band_count()
        .with_context(|| format!("raster '{}' has no data descriptor", raster.display_name))?;
    let values = signature
        .data(REFLECTANCE)
        .with_context(|| format!("signature '{}' has no {REFLECTANCE} data", signature.name))?;

    let centers = raster.center_wavelengths();
    if centers.is_empty() {
        if values.len() == band_count {
            return Ok(values.to_vec());
        }
        bail!(
            "raster '{}' has no wavelengths and signature '{}' has {} values for {} bands",
            raster.display_name,
            signature.name,
            values.len(),
            band_count
        );
    }

    let wavelengths = signature
        .data(WAVELENGTH)
        .with_context(|| format!("signature '{}' has no {WAVELENGTH} data", signature.name))?;
    if wavelengths.len() != values.len() {
        bail!(
            "signature '{}': {} wavelengths but {} values",
            signature.name,
            wavelengths.len(),
            values.len()
        );
    }
    interpolate(wavelengths, values, &centers)
        .with_context(|| format!("resampling '{}' to '{}'", signature.name, raster.display_name))
}

/// Piecewise-linear interpolation of `(xs, ys)` at each of `at`.
/// Every point of `at` must lie within the range of `xs`.
pub fn interpolate(xs: &[f64], ys: &[f64], at: &[f64]) -> Result<Vec<f64>> {
    if xs.is_empty() {
        bail!("no samples to interpolate");
    }
    let mut points: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (lo, hi) = (points[0].0, points[points.len() - 1].0);

    at.iter()
        .map(|&x| {
            if !(lo..=hi).contains(&x) {
                bail!("wavelength {x} lies outside {lo}..{hi}");
            }
            // first sample at or beyond x
            let i = points.partition_point(|p| p.0 < x);
            let (x1, y1) = points[i];
            if i == 0 || x1 == x {
                return Ok(y1);
            }
            let (x0, y0) = points[i - 1];
            Ok(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RasterDataDescriptor;

    fn raster_with_centers(centers: &[f64]) -> RasterElement {
        let mut raster = RasterElement::new(
            "/data/scene1.hdr",
            "Scene1",
            Some(RasterDataDescriptor {
                band_count: centers.len(),
                units: Default::default(),
            }),
        );
        raster.set_center_wavelengths(centers);
        raster
    }

    fn library_sig(name: &str, wavelengths: &[f64], values: &[f64]) -> Signature {
        let mut s = Signature::new(name);
        s.set_data(WAVELENGTH, wavelengths.to_vec());
        s.set_data(REFLECTANCE, values.to_vec());
        s
    }

    #[test]
    fn interpolates_between_samples() {
        let out = interpolate(&[1.0, 2.0, 3.0], &[10.0, 20.0, 40.0], &[1.0, 1.5, 2.5, 3.0]).unwrap();
        assert_eq!(out, vec![10.0, 15.0, 30.0, 40.0]);
    }

    #[test]
    fn descending_wavelengths_are_sorted() {
        let out = interpolate(&[3.0, 2.0, 1.0], &[40.0, 20.0, 10.0], &[1.5]).unwrap();
        assert_eq!(out, vec![15.0]);
    }

    #[test]
    fn out_of_range_band_fails() {
        assert!(interpolate(&[1.0, 2.0], &[0.0, 1.0], &[2.5]).is_err());
        assert!(interpolate(&[], &[], &[1.0]).is_err());
    }

    #[test]
    fn raster_without_wavelengths_requires_matching_length() {
        let raster = RasterElement::new(
            "r",
            "r",
            Some(RasterDataDescriptor {
                band_count: 3,
                units: Default::default(),
            }),
        );
        let mut fits = Signature::new("fits");
        fits.set_data(REFLECTANCE, vec![1.0, 2.0, 3.0]);
        assert_eq!(resample_to_raster(&raster, &fits).unwrap(), vec![1.0, 2.0, 3.0]);

        let mut short = Signature::new("short");
        short.set_data(REFLECTANCE, vec![1.0]);
        assert!(resample_to_raster(&raster, &short).is_err());
    }

    #[test]
    fn resample_caches_per_raster_and_signature() {
        let raster = raster_with_centers(&[0.5, 1.5]);
        let mut library = SpectralLibrary::new();
        library.insert(library_sig("Alunite", &[0.0, 1.0, 2.0], &[0.0, 0.2, 0.4]));

        let sig = library.get("Alunite").unwrap().clone();
        let first = library.resample(&raster, &sig).unwrap();
        let second = library.resample(&raster, &sig).unwrap();
        assert_eq!(first, second);
        assert_eq!(library.cached_count(), 1);

        library.insert(library_sig("Alunite", &[0.0, 2.0], &[1.0, 1.0]));
        assert_eq!(library.cached_count(), 0);
        let sig = library.get("Alunite").unwrap().clone();
        assert_eq!(library.resample(&raster, &sig).unwrap(), vec![1.0, 1.0]);

        library.forget_raster("/data/scene1.hdr");
        assert_eq!(library.cached_count(), 0);
    }

    #[test]
    fn remove_drops_signature_and_cache() {
        let raster = raster_with_centers(&[0.5, 1.5]);
        let mut library = SpectralLibrary::new();
        library.insert(library_sig("Alunite", &[0.0, 2.0], &[1.0, 1.0]));
        let sig = library.get("Alunite").unwrap().clone();
        library.resample(&raster, &sig).unwrap();

        assert!(library.remove("Alunite").is_some());
        assert!(library.remove("Alunite").is_none());
        assert!(library.is_empty());
        assert_eq!(library.cached_count(), 0);
    }

    #[test]
    fn missing_reflectance_is_an_error() {
        let raster = raster_with_centers(&[0.5]);
        let err = resample_to_raster(&raster, &Signature::new("empty")).unwrap_err();
        assert!(format!("{err:#}").contains("no Reflectance data"));
    }
}
