use eframe::egui;

use crate::config::Settings;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TrackExplorerApp {
    pub state: AppState,
}

impl TrackExplorerApp {
    /// Start a session on the configured dataset.
    pub fn new(settings: Settings) -> Self {
        let mut state = AppState::new(settings);
        let path = state.settings.dataset.clone();
        state.open(&path);
        Self { state }
    }
}

impl eframe::App for TrackExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: controls ----
        egui::SidePanel::left("control_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics and charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::dashboard(ui, &mut self.state);
        });
    }
}
