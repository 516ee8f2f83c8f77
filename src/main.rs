mod app;
mod average;
mod color;
mod data;
mod events;
mod locate;
mod results;
mod settings;
mod state;
mod ui;

use app::MatchResultsApp;
use eframe::egui;
use settings::MatchSettings;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let settings_path = MatchSettings::default_path();
    let settings = MatchSettings::load_or_default(&settings_path);
    log::info!("Settings: {}", settings_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Spectral Library Match Results",
        options,
        Box::new(move |_cc| {
            let state = AppState::with_settings(settings, settings_path);
            Ok(Box::new(MatchResultsApp::new(state)))
        }),
    )
}
