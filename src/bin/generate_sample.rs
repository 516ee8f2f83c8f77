use anyhow::{Context, Result};
use serde_json::{json, Value};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Reflectance curve: a sloped continuum with gaussian absorption features.
fn generate_spectrum(
    wavelengths: &[f64],
    continuum: (f64, f64),
    absorptions: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wl| {
            let base = continuum.0 + continuum.1 * wl;
            let depth: f64 = absorptions
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(wl, mu, sigma, amp))
                .sum();
            (base - depth + rng.gauss(0.0, noise_level)).max(0.0)
        })
        .collect()
}

/// Spectral angle in degrees.
fn spectral_angle(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|y| y * y).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 90.0;
    }
    (dot / (na * nb)).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const MATCHES_PER_TARGET: usize = 5;
const ROW_COLORS: [[u8; 3]; MATCHES_PER_TARGET] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // Library wavelengths: 0.40 → 2.50 µm, step 0.01
    let library_wavelengths: Vec<f64> = (0..=210).map(|i| 0.40 + i as f64 * 0.01).collect();
    // Sensor band centres: 0.41 → 2.49 µm, 53 bands
    let band_centers: Vec<f64> = (0..53).map(|i| 0.41 + i as f64 * 0.04).collect();

    let minerals: Vec<(&str, (f64, f64), Vec<(f64, f64, f64)>)> = vec![
        ("Alunite", (0.55, 0.05), vec![(1.76, 0.03, 0.12), (2.17, 0.04, 0.25)]),
        ("Kaolinite", (0.60, 0.04), vec![(1.40, 0.02, 0.10), (2.16, 0.03, 0.18), (2.21, 0.02, 0.20)]),
        ("Calcite", (0.70, 0.02), vec![(2.34, 0.05, 0.30)]),
        ("Muscovite", (0.58, 0.03), vec![(1.41, 0.02, 0.08), (2.20, 0.03, 0.22), (2.35, 0.03, 0.10)]),
        ("Hematite", (0.20, 0.15), vec![(0.53, 0.06, 0.08), (0.87, 0.08, 0.12)]),
        ("Jarosite", (0.35, 0.12), vec![(0.92, 0.08, 0.10), (2.27, 0.03, 0.15)]),
        ("Montmorillonite", (0.62, 0.03), vec![(1.41, 0.03, 0.12), (1.91, 0.04, 0.20), (2.21, 0.03, 0.15)]),
        ("Dolomite", (0.68, 0.02), vec![(2.32, 0.05, 0.28)]),
    ];

    // ---- Library signatures ----
    let mut resampled: Vec<(&str, Vec<f64>)> = Vec::new();
    let mut signatures: Vec<Value> = Vec::new();
    for (name, continuum, absorptions) in &minerals {
        let reflectance =
            generate_spectrum(&library_wavelengths, *continuum, absorptions, 0.002, &mut rng);
        let at_bands = generate_spectrum(&band_centers, *continuum, absorptions, 0.0, &mut rng);
        resampled.push((*name, at_bands));
        signatures.push(json!({
            "name": name,
            "data": { "Wavelength": library_wavelengths, "Reflectance": reflectance },
            "units": { "Reflectance": { "unit_name": "Reflectance", "unit_type": "Reflectance",
                                        "scale_from_standard": 1.0 } },
        }));
    }

    // ---- Rasters ----
    let rasters = json!([
        {
            "name": "/data/cuprite_subset.hdr",
            "display_name": "cuprite_subset",
            "descriptor": { "band_count": band_centers.len(),
                            "units": { "unit_name": "Reflectance", "unit_type": "Reflectance",
                                       "scale_from_standard": 0.0001 } },
            "metadata": { "Special": { "Wavelengths": { "Center Values": band_centers } } }
        },
        {
            "name": "/data/goldfield_subset.hdr",
            "display_name": "goldfield_subset",
            "descriptor": { "band_count": band_centers.len() },
            "metadata": { "Special": { "Wavelengths": { "Center Values": band_centers } } }
        }
    ]);

    // ---- Match results: mixed pixels scored by spectral angle ----
    let mut results: Vec<Value> = Vec::new();
    for raster in ["/data/cuprite_subset.hdr", "/data/goldfield_subset.hdr"] {
        for _ in 0..4 {
            let (x, y) = (rng.below(512), rng.below(614));
            let a = rng.below(resampled.len());
            let b = rng.below(resampled.len());
            let fraction = 0.5 + 0.5 * rng.next_f64();
            let pixel: Vec<f64> = resampled[a]
                .1
                .iter()
                .zip(&resampled[b].1)
                .map(|(&p, &q)| fraction * p + (1.0 - fraction) * q + rng.gauss(0.0, 0.004))
                .collect();

            let mut scored: Vec<(&str, f64)> = resampled
                .iter()
                .map(|(name, values)| (*name, spectral_angle(&pixel, values)))
                .collect();
            scored.sort_by(|l, r| l.1.total_cmp(&r.1));

            let matches: Vec<Value> = scored
                .iter()
                .take(MATCHES_PER_TARGET)
                .zip(ROW_COLORS)
                .map(|(&(name, score), color)| {
                    json!({ "signature": name, "score": score, "color": color })
                })
                .collect();

            results.push(json!({
                "raster": raster,
                "target": format!("Pixel ({x}, {y})"),
                "target_values": pixel,
                "algorithm": "SAM",
                "matches": matches,
            }));
        }
    }

    let session = json!({
        "rasters": rasters,
        "signatures": signatures,
        "results": results,
    });

    let output_path = "sample_session.json";
    let text = serde_json::to_string_pretty(&session).context("serializing session")?;
    std::fs::write(output_path, text)
        .with_context(|| format!("writing {output_path}"))?;

    println!(
        "Wrote {} signatures and {} match results ({} bands) to {output_path}",
        minerals.len(),
        results.len(),
        band_centers.len()
    );
    Ok(())
}
