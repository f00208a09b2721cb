mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use anyhow::Result;
use app::TrackExplorerApp;
use clap::Parser;
use config::{CliArgs, Settings};
use eframe::egui;

fn main() -> Result<()> {
    env_logger::init();
    let settings = Settings::from_args(CliArgs::parse())?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Track Explorer",
        options,
        Box::new(move |_cc| Ok(Box::new(TrackExplorerApp::new(settings)))),
    )
    .map_err(|e| anyhow::anyhow!("UI terminated: {e}"))
}
