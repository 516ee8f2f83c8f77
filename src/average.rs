use thiserror::Error;

use crate::data::model::{RasterElement, Signature, Units, REFLECTANCE, WAVELENGTH};

// ---------------------------------------------------------------------------
// Resampling service
// ---------------------------------------------------------------------------

/// Maps a signature onto the band centres of a raster.
pub trait ResamplingService {
    fn resample(&self, raster: &RasterElement, signature: &Signature) -> anyhow::Result<Vec<f64>>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AverageError {
    #[error("No signatures are selected for use in generating an average signature.")]
    NoSignaturesSelected,

    #[error("Unable to access the RasterDataDescriptor for the RasterElement of the current page.")]
    MetadataUnavailable,

    #[error("Unable to access the resampled signature values for {signature}")]
    ResampleFailed {
        signature: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Resampled values for {signature} have {actual} bands, expected {expected}")]
    BandCountMismatch {
        signature: String,
        expected: usize,
        actual: usize,
    },
}

// ---------------------------------------------------------------------------
// Averaging
// ---------------------------------------------------------------------------

/// Per-band mean of the selected signatures, resampled to `raster`.
///
/// Bands are summed in selection order, then divided by the number of
/// signatures. Any resampling failure aborts the whole average.
pub fn average_spectrum(
    raster: &RasterElement,
    signatures: &[&Signature],
    resampler: &dyn ResamplingService,
) -> Result<Vec<f64>, AverageError> {
    if signatures.is_empty() {
        return Err(AverageError::NoSignaturesSelected);
    }
    let band_count = raster.band_count().ok_or(AverageError::MetadataUnavailable)?;

    let mut sums = vec![0.0_f64; band_count];
    for signature in signatures {
        let values = resampler.resample(raster, signature).map_err(|source| {
            AverageError::ResampleFailed {
                signature: signature.name.clone(),
                source,
            }
        })?;
        if values.len() < band_count {
            return Err(AverageError::BandCountMismatch {
                signature: signature.name.clone(),
                expected: band_count,
                actual: values.len(),
            });
        }
        for (sum, value) in sums.iter_mut().zip(&values) {
            *sum += value;
        }
    }

    let n = signatures.len() as f64;
    for sum in &mut sums {
        *sum /= n;
    }
    Ok(sums)
}

/// Package averaged values as a new signature named `name`.
///
/// Wavelengths come from the raster metadata; units copy the raster's unit
/// name and type with scale-from-standard 1.0, since resampled values are
/// already in standard units. Returns `None` when `name` is blank; any other
/// name is used exactly as given.
pub fn build_average_signature(
    raster: &RasterElement,
    name: &str,
    values: Vec<f64>,
) -> Result<Option<Signature>, AverageError> {
    if name.trim().is_empty() {
        return Ok(None);
    }
    let descriptor = raster
        .descriptor
        .as_ref()
        .ok_or(AverageError::MetadataUnavailable)?;

    let mut signature = Signature::new(name);
    signature.set_data(REFLECTANCE, values);
    signature.set_data(WAVELENGTH, raster.center_wavelengths());
    signature.set_units(
        REFLECTANCE,
        Units {
            unit_name: descriptor.units.unit_name.clone(),
            unit_type: descriptor.units.unit_type,
            scale_from_standard: 1.0,
        },
    );
    Ok(Some(signature))
}

/// Average `signatures` over the bands of `raster` into a signature called `name`.
///
/// `Ok(None)` means the user cancelled by leaving the name empty.
pub fn compute_average(
    raster: &RasterElement,
    signatures: &[&Signature],
    resampler: &dyn ResamplingService,
    name: &str,
) -> Result<Option<Signature>, AverageError> {
    let values = average_spectrum(raster, signatures, resampler)?;
    let average = build_average_signature(raster, name, values)?;
    if let Some(sig) = &average {
        log::info!(
            "Created average signature '{}' from {} signature(s) on '{}'",
            sig.name,
            signatures.len(),
            raster.display_name
        );
    }
    Ok(average)
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;
    use crate::data::model::{RasterDataDescriptor, UnitType};

    /// Returns each signature's reflectance as-is, or fails for listed names.
    #[derive(Default)]
    struct PassThrough {
        failing: Vec<String>,
    }

    impl ResamplingService for PassThrough {
        fn resample(&self, _raster: &RasterElement, signature: &Signature) -> anyhow::Result<Vec<f64>> {
            if self.failing.contains(&signature.name) {
                bail!("no overlap with raster wavelengths");
            }
            Ok(signature.data(REFLECTANCE).unwrap_or_default().to_vec())
        }
    }

    fn scene1() -> RasterElement {
        let mut raster = RasterElement::new(
            "/data/scene1.hdr",
            "Scene1",
            Some(RasterDataDescriptor {
                band_count: 4,
                units: Units {
                    unit_name: "Reflectance".to_string(),
                    unit_type: UnitType::Reflectance,
                    scale_from_standard: 0.0001,
                },
            }),
        );
        raster.set_center_wavelengths(&[0.45, 0.55, 0.65, 0.75]);
        raster
    }

    fn sig(name: &str, values: &[f64]) -> Signature {
        let mut s = Signature::new(name);
        s.set_data(REFLECTANCE, values.to_vec());
        s
    }

    #[test]
    fn average_of_two_signatures() {
        let (s1, s2) = (sig("S1", &[1.0, 2.0, 3.0, 4.0]), sig("S2", &[3.0, 4.0, 5.0, 6.0]));
        let values = average_spectrum(&scene1(), &[&s1, &s2], &PassThrough::default()).unwrap();
        assert_eq!(values, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn singleton_average_is_identity() {
        let s = sig("S", &[0.11, 0.27, 0.31, 0.49]);
        let values = average_spectrum(&scene1(), &[&s], &PassThrough::default()).unwrap();
        assert_eq!(values, vec![0.11, 0.27, 0.31, 0.49]);
    }

    #[test]
    fn average_matches_per_band_mean() {
        let sigs: Vec<Signature> = (0..7)
            .map(|i| {
                let f = i as f64;
                sig(&format!("S{i}"), &[f * 0.1, f.sqrt(), 1.0 / (f + 1.0), f * f])
            })
            .collect();
        let refs: Vec<&Signature> = sigs.iter().collect();
        let values = average_spectrum(&scene1(), &refs, &PassThrough::default()).unwrap();

        for band in 0..4 {
            let expected: f64 =
                sigs.iter().map(|s| s.data(REFLECTANCE).unwrap()[band]).sum::<f64>() / 7.0;
            assert!((values[band] - expected).abs() < 1e-12, "band {band}");
        }
    }

    #[test]
    fn extra_resampled_values_are_ignored() {
        let s = sig("S", &[1.0, 2.0, 3.0, 4.0, 99.0]);
        let values = average_spectrum(&scene1(), &[&s], &PassThrough::default()).unwrap();
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn empty_selection_is_rejected() {
        let err = average_spectrum(&scene1(), &[], &PassThrough::default()).unwrap_err();
        assert!(matches!(err, AverageError::NoSignaturesSelected));
    }

    #[test]
    fn missing_descriptor_fails() {
        let raster = RasterElement::new("r", "r", None);
        let s = sig("S", &[1.0]);
        let err = average_spectrum(&raster, &[&s], &PassThrough::default()).unwrap_err();
        assert!(matches!(err, AverageError::MetadataUnavailable));
    }

    #[test]
    fn resample_failure_names_the_signature() {
        let (good, bad) = (sig("Good", &[1.0; 4]), sig("Bad", &[1.0; 4]));
        let resampler = PassThrough {
            failing: vec!["Bad".to_string()],
        };
        let err = average_spectrum(&scene1(), &[&good, &bad], &resampler).unwrap_err();
        match err {
            AverageError::ResampleFailed { signature, .. } => assert_eq!(signature, "Bad"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_resample_is_rejected() {
        let s = sig("Short", &[1.0, 2.0]);
        let err = average_spectrum(&scene1(), &[&s], &PassThrough::default()).unwrap_err();
        assert!(matches!(
            err,
            AverageError::BandCountMismatch { expected: 4, actual: 2, .. }
        ));
    }

    #[test]
    fn averaged_signature_carries_wavelengths_and_units() {
        let (s1, s2) = (sig("S1", &[1.0, 2.0, 3.0, 4.0]), sig("S2", &[3.0, 4.0, 5.0, 6.0]));
        let avg = compute_average(&scene1(), &[&s1, &s2], &PassThrough::default(), "Mean")
            .unwrap()
            .unwrap();

        assert_eq!(avg.name, "Mean");
        assert_eq!(avg.data(REFLECTANCE), Some(&[2.0, 3.0, 4.0, 5.0][..]));
        assert_eq!(avg.data(WAVELENGTH), Some(&[0.45, 0.55, 0.65, 0.75][..]));
        let units = avg.units(REFLECTANCE).unwrap();
        assert_eq!(units.unit_name, "Reflectance");
        assert_eq!(units.unit_type, UnitType::Reflectance);
        assert_eq!(units.scale_from_standard, 1.0);
    }

    #[test]
    fn blank_name_cancels() {
        let s = sig("S", &[1.0; 4]);
        for name in ["", "   "] {
            let avg = compute_average(&scene1(), &[&s], &PassThrough::default(), name).unwrap();
            assert!(avg.is_none());
        }
    }

    #[test]
    fn name_is_kept_as_typed() {
        let s = sig("S", &[1.0; 4]);
        let avg = compute_average(&scene1(), &[&s], &PassThrough::default(), "  Mean ")
            .unwrap()
            .unwrap();
        assert_eq!(avg.name, "  Mean ");
    }

    #[test]
    fn raster_without_wavelengths_gives_empty_axis() {
        let mut raster = scene1();
        raster.metadata = serde_json::Value::Null;
        let avg = build_average_signature(&raster, "Mean", vec![0.0; 4])
            .unwrap()
            .unwrap();
        assert_eq!(avg.data(WAVELENGTH), Some(&[][..]));
        assert_eq!(avg.units.len(), 1);
    }
}
