use eframe::egui::{self, Context, Ui};

use crate::locate::LocateAlgorithm;
use crate::state::AppState;

const TITLE: &str = "Spectral Library Match";

// ---------------------------------------------------------------------------
// Modal-style windows
// ---------------------------------------------------------------------------

/// Draw whichever dialogs are open.
pub fn show_dialogs(ctx: &Context, state: &mut AppState) {
    message_box(ctx, state);
    locate_options(ctx, state);
    average_name(ctx, state);
    settings_window(ctx, state);
}

fn centered(title: &str) -> egui::Window<'_> {
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
}

fn message_box(ctx: &Context, state: &mut AppState) {
    let Some(message) = state.message.clone() else {
        return;
    };
    centered(TITLE).id(egui::Id::new("message_box")).show(ctx, |ui: &mut Ui| {
        ui.label(message);
        ui.add_space(6.0);
        if ui.button("OK").clicked() {
            state.message = None;
        }
    });
}

/// Locate options: algorithm, threshold, output layer name and AOI.
fn locate_options(ctx: &Context, state: &mut AppState) {
    let settings = state.settings.clone();
    let Some(dialog) = state.locate_dialog.as_mut() else {
        return;
    };

    let mut accepted = false;
    let mut cancelled = false;
    centered("Locate Signatures").show(ctx, |ui: &mut Ui| {
        ui.label(format!(
            "Locate {} signature(s) in {}",
            dialog.signatures.len(),
            dialog.raster.display_name
        ));
        ui.separator();

        egui::Grid::new("locate_grid").num_columns(2).show(ui, |ui: &mut Ui| {
            ui.label("Algorithm");
            let before = dialog.options.algorithm;
            egui::ComboBox::from_id_salt("locate_algorithm")
                .selected_text(dialog.options.algorithm.plugin_name())
                .show_ui(ui, |ui: &mut Ui| {
                    for algorithm in LocateAlgorithm::ALL {
                        ui.selectable_value(
                            &mut dialog.options.algorithm,
                            algorithm,
                            algorithm.plugin_name(),
                        );
                    }
                });
            if dialog.options.algorithm != before {
                dialog.options.threshold = dialog.options.algorithm.default_threshold(&settings);
            }
            ui.end_row();

            ui.label("Threshold");
            ui.add(egui::DragValue::new(&mut dialog.options.threshold).speed(0.01));
            ui.end_row();

            ui.label("Output layer");
            ui.add(
                egui::TextEdit::singleline(&mut dialog.options.output_layer_name)
                    .hint_text(dialog.options.algorithm.default_results_name()),
            );
            ui.end_row();

            ui.label("AOI");
            ui.add(egui::TextEdit::singleline(&mut dialog.aoi_text).hint_text("<whole scene>"));
            ui.end_row();
        });

        ui.separator();
        ui.horizontal(|ui: &mut Ui| {
            accepted = ui.button("OK").clicked();
            cancelled = ui.button("Cancel").clicked();
        });
    });

    if accepted {
        state.confirm_locate();
    } else if cancelled {
        state.cancel_locate();
    }
}

fn average_name(ctx: &Context, state: &mut AppState) {
    let Some(dialog) = state.average_dialog.as_mut() else {
        return;
    };

    let mut accepted = false;
    let mut cancelled = false;
    centered(TITLE).id(egui::Id::new("average_name")).show(ctx, |ui: &mut Ui| {
        ui.label("Enter the name to use for the average signature:");
        let edit = ui.text_edit_singleline(&mut dialog.name);
        let enter = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        ui.horizontal(|ui: &mut Ui| {
            accepted = ui.button("OK").clicked() || enter;
            cancelled = ui.button("Cancel").clicked();
        });
    });

    if accepted {
        state.confirm_average();
    } else if cancelled {
        state.cancel_average();
    }
}

fn settings_window(ctx: &Context, state: &mut AppState) {
    if !state.show_settings {
        return;
    }

    let mut save = false;
    let mut close = false;
    let settings = &mut state.settings;
    centered("Spectral Library Match Settings").show(ctx, |ui: &mut Ui| {
        egui::Grid::new("settings_grid").num_columns(2).show(ui, |ui: &mut Ui| {
            ui.label("Locate algorithm");
            egui::ComboBox::from_id_salt("settings_algorithm")
                .selected_text(settings.locate_algorithm.plugin_name())
                .show_ui(ui, |ui: &mut Ui| {
                    for algorithm in LocateAlgorithm::ALL {
                        ui.selectable_value(
                            &mut settings.locate_algorithm,
                            algorithm,
                            algorithm.plugin_name(),
                        );
                    }
                });
            ui.end_row();

            ui.label("SAM threshold (degrees)");
            ui.add(
                egui::DragValue::new(&mut settings.locate_sam_threshold)
                    .speed(0.1)
                    .range(0.0..=90.0),
            );
            ui.end_row();

            ui.label("CEM threshold");
            ui.add(egui::DragValue::new(&mut settings.locate_cem_threshold).speed(0.01));
            ui.end_row();

            ui.label("Show locate options");
            ui.checkbox(&mut settings.display_locate_options, "");
            ui.end_row();

            ui.label("Maximum results pages");
            ui.add(egui::DragValue::new(&mut settings.max_result_pages).range(1..=1024));
            ui.end_row();
        });

        ui.separator();
        ui.horizontal(|ui: &mut Ui| {
            save = ui.button("Save").clicked();
            close = ui.button("Close").clicked();
        });
    });

    if save {
        state.apply_settings();
    }
    if save || close {
        state.show_settings = false;
    }
}
