use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use eframe::egui::{self, emath::Numeric, Color32, RichText, ScrollArea, Slider, Ui};

use crate::config::TOP_N_RANGE;
use crate::data::export::default_file_name;
use crate::data::filter::Selection;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – control widgets
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Controls");
    ui.separator();

    let Some(table) = state.table.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Artist ranking size ----
            ui.strong("Top artists");
            let mut top_n = state.params.top_n;
            ui.add(Slider::new(&mut top_n, TOP_N_RANGE).text("artists"));
            state.set_top_n(top_n);
            ui.separator();

            // Edit a copy; the state only recomputes when it differs.
            let mut constraints = state.constraints.clone();

            if let Some((lo, hi)) = table.year_bounds() {
                ui.strong("Release year");
                range_sliders(ui, &mut constraints.year, lo..=hi);
                ui.separator();
            }

            if let Some((lo, hi)) = table.bpm_bounds() {
                ui.strong("Tempo (BPM)");
                range_sliders(ui, &mut constraints.bpm, lo..=hi);
            }

            ui.horizontal(|ui: &mut Ui| {
                ui.label("Key");
                selection_combo(ui, "key_filter", &mut constraints.key, &table.keys);
                ui.label("Mode");
                selection_combo(ui, "mode_filter", &mut constraints.mode, &table.modes);
            });
            ui.separator();

            egui::CollapsingHeader::new(RichText::new("Advanced filters").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Danceability (%)");
                    range_sliders(ui, &mut constraints.danceability, 0..=100);
                    ui.label("Energy (%)");
                    range_sliders(ui, &mut constraints.energy, 0..=100);
                    ui.label("Positivity / valence (%)");
                    range_sliders(ui, &mut constraints.valence, 0..=100);
                });

            state.set_constraints(constraints);
            ui.separator();

            ui.strong("Data explorer");
            ui.checkbox(&mut state.show_raw_data, "Show raw data");
        });
}

/// Two sliders editing an inclusive range within `bounds`; `to` follows
/// `from` when dragged below it.
fn range_sliders<T: Numeric>(ui: &mut Ui, range: &mut RangeInclusive<T>, bounds: RangeInclusive<T>) {
    let (mut lo, mut hi) = (*range.start(), *range.end());
    ui.add(Slider::new(&mut lo, bounds.clone()).text("from"));
    ui.add(Slider::new(&mut hi, bounds).text("to"));
    if lo > hi {
        hi = lo;
    }
    *range = lo..=hi;
}

fn selection_combo(ui: &mut Ui, id: &str, selection: &mut Selection, options: &BTreeSet<String>) {
    let current = match selection {
        Selection::All => "All".to_string(),
        Selection::Only(value) => value.clone(),
    };
    egui::ComboBox::from_id_salt(id)
        .selected_text(current)
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut *selection, Selection::All, "All");
            for option in options {
                ui.selectable_value(&mut *selection, Selection::Only(option.clone()), option.as_str());
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.dataset_path.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
            ui.separator();
            let has_view = state.view.is_some();
            if ui
                .add_enabled(has_view, egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_file_dialog(state, "CSV", "csv");
                ui.close_menu();
            }
            if ui
                .add_enabled(has_view, egui::Button::new("Export JSON…"))
                .clicked()
            {
                export_file_dialog(state, "JSON", "json");
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(table), Some(view)) = (&state.table, &state.view) {
            ui.label(format!(
                "{} tracks loaded, {} visible",
                table.len(),
                view.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::LIGHT_GREEN
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open track dataset")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}

pub fn export_file_dialog(state: &mut AppState, label: &str, extension: &str) {
    let today = chrono::Local::now().date_naive();
    let file = rfd::FileDialog::new()
        .set_title("Export filtered tracks")
        .set_file_name(default_file_name(today, extension))
        .add_filter(label, &[extension])
        .save_file();

    if let Some(path) = file {
        state.export(&path);
    }
}
