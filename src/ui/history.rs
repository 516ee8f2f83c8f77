use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

/// Table of locate requests sent to plugins, newest first.
pub fn history_table(ui: &mut Ui, state: &AppState) {
    let history = &state.plugins.history;
    if history.is_empty() {
        ui.label("No locate requests yet.");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(50.0)) // Plugin
        .column(Column::auto().at_least(120.0)) // Raster
        .column(Column::auto().at_least(70.0)) // Threshold
        .column(Column::auto().at_least(100.0)) // AOI
        .column(Column::auto().at_least(200.0)) // Results name
        .column(Column::remainder()) // Signatures
        .header(20.0, |mut header| {
            for title in ["Plugin", "Raster", "Threshold", "AOI", "Results Name", "Signatures"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, history.len(), |mut row| {
                let record = &history[history.len() - 1 - row.index()];
                row.col(|ui| {
                    ui.label(record.plugin.as_str());
                });
                for arg in ["Data Element", "Threshold", "AOI", "Results Name", "Target Signatures"] {
                    row.col(|ui| {
                        ui.label(record.arg_text(arg));
                    });
                }
            });
        });
}
