use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Signature colours: signature name → Color32
// ---------------------------------------------------------------------------

/// Display colours for matched signatures. Empty means "no colouring".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureColors {
    mapping: BTreeMap<String, Color32>,
}

impl SignatureColors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, signature: &str, color: Color32) {
        self.mapping.insert(signature.to_string(), color);
    }

    /// Explicit colour of a signature, if one was assigned.
    pub fn get(&self, signature: &str) -> Option<Color32> {
        self.mapping.get(signature).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.mapping.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn explicit_colours_only() {
        let mut colors = SignatureColors::new();
        assert!(colors.is_empty());
        colors.insert("Alunite", Color32::RED);
        colors.insert("Calcite", Color32::BLUE);
        colors.insert("Alunite", Color32::GREEN);
        assert_eq!(colors.len(), 2);
        assert_eq!(colors.get("Alunite"), Some(Color32::GREEN));
        assert!(colors.get("Calcite").is_some());
        assert!(colors.get("Gypsum").is_none());
    }
}
