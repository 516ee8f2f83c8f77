use std::collections::BTreeMap;

use eframe::egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotPoints};

use crate::average::ResamplingService;
use crate::color::generate_palette;
use crate::data::model::REFLECTANCE;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Signature plot (central panel)
// ---------------------------------------------------------------------------

/// Plot the selected signatures, resampled to the current page's raster,
/// together with the last average created on that raster.
pub fn signature_plot(ui: &mut Ui, state: &AppState) {
    let Some(raster) = state.raster_for_current_page() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a session to browse match results  (File → Open session…)");
        });
        return;
    };

    let centers = raster.center_wavelengths();
    let x_at = |band: usize| centers.get(band).copied().unwrap_or(band as f64);
    let x_label = if centers.is_empty() { "Band" } else { "Wavelength" };

    let selected = state.selected_signatures();
    let palette = generate_palette(selected.len());
    let row_colors = state.store.current_page().map(|page| {
        let mut colors = BTreeMap::new();
        for row in page.entries().iter().flat_map(|e| &e.rows) {
            if let Some(c) = row.color {
                colors.entry(row.row.signature.clone()).or_insert(c);
            }
        }
        colors
    });

    let average = state
        .last_average
        .as_ref()
        .filter(|(r, _)| *r == raster.name)
        .map(|(_, sig)| sig.clone());

    Plot::new("signature_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(REFLECTANCE)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (i, name) in selected.iter().enumerate() {
                let Some(signature) = state.library.get(name) else {
                    continue;
                };
                let values = match state.library.resample(&raster, signature) {
                    Ok(values) => values,
                    Err(e) => {
                        log::debug!("Not plotting '{name}': {e:#}");
                        continue;
                    }
                };
                let color = row_colors
                    .as_ref()
                    .and_then(|m| m.get(name).copied())
                    .unwrap_or(palette[i]);

                let points: PlotPoints = values
                    .iter()
                    .enumerate()
                    .map(|(band, &y)| [x_at(band), y])
                    .collect();
                plot_ui.line(Line::new(points).name(name).color(color).width(1.5));
            }

            if let Some(avg) = &average {
                if let Some(values) = avg.data(REFLECTANCE) {
                    let points: PlotPoints = values
                        .iter()
                        .enumerate()
                        .map(|(band, &y)| [x_at(band), y])
                        .collect();
                    plot_ui.line(
                        Line::new(points)
                            .name(format!("{} (average)", avg.name))
                            .color(Color32::WHITE)
                            .width(2.5),
                    );
                }
            }
        });
}
