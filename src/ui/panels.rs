use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::loader;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open session…").clicked() {
                open_session_dialog(state);
                ui.close_menu();
            }
            if ui.button("Import signature library…").clicked() {
                import_library_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Settings…").clicked() {
                state.show_settings = true;
                ui.close_menu();
            }
        });

        ui.menu_button("Rasters", |ui: &mut Ui| {
            if state.rasters.is_empty() {
                ui.label("No rasters loaded.");
            }
            let names: Vec<(String, String)> = state
                .rasters
                .iter()
                .map(|r| (r.name.clone(), r.display_name.clone()))
                .collect();
            for (name, display) in names {
                if ui
                    .button(format!("Delete {display}"))
                    .on_hover_text(name.as_str())
                    .clicked()
                {
                    state.delete_raster(&name);
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        if ui
            .selectable_label(state.show_results_window, "Spectral Library Match Results Window")
            .on_hover_text("Toggles the display of the Spectral Library Match Results Window")
            .clicked()
        {
            state.show_results_window = !state.show_results_window;
        }
        if ui
            .selectable_label(state.show_history, "Locate History")
            .clicked()
        {
            state.show_history = !state.show_history;
        }

        ui.separator();
        ui.label(format!(
            "{} raster(s), {} library signature(s), {} results page(s)",
            state.rasters.len(),
            state.library.len(),
            state.store.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_session_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open match session")
        .add_filter("Session", &["json"])
        .pick_file();

    if let Some(path) = file {
        match loader::load_session(&path) {
            Ok(session) => {
                log::info!(
                    "Loaded session with {} raster(s) and {} result(s)",
                    session.rasters.len(),
                    session.results.len()
                );
                state.set_session(session);
            }
            Err(e) => {
                log::error!("Failed to load session: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn import_library_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Import signature library")
        .add_filter("Supported files", &["json", "csv"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match loader::load_signature_library(&path) {
            Ok(signatures) => state.add_library_signatures(signatures),
            Err(e) => {
                log::error!("Failed to import library: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
