use eframe::egui;

use crate::state::AppState;
use crate::ui::{dialogs, history, panels, plot, results};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct MatchResultsApp {
    pub state: AppState,
}

impl MatchResultsApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for MatchResultsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: results window ----
        if self.state.show_results_window {
            egui::SidePanel::left("results_panel")
                .default_width(340.0)
                .resizable(true)
                .show(ctx, |ui| {
                    results::results_window(ui, &mut self.state);
                });
        }

        // ---- Bottom panel: locate history ----
        if self.state.show_history {
            egui::TopBottomPanel::bottom("history_panel")
                .resizable(true)
                .default_height(160.0)
                .show(ctx, |ui| {
                    history::history_table(ui, &self.state);
                });
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::signature_plot(ui, &self.state);
        });

        dialogs::show_dialogs(ctx, &mut self.state);
    }
}
