use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::FilteredView;

/// Rows shown by the raw data explorer.
const PREVIEW_ROWS: usize = 100;

/// First rows of the view, every column, as a scrollable table.
pub fn raw_data(ui: &mut Ui, view: &FilteredView) {
    let table = view.table();
    let rows: Vec<usize> = view.indices().iter().take(PREVIEW_ROWS).copied().collect();

    ui.label(format!("Showing {} of {} tracks", rows.len(), view.len()));

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        let mut builder = TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(320.0);
        for _ in &table.columns {
            builder = builder.column(Column::auto().at_least(60.0));
        }

        builder
            .header(20.0, |mut header| {
                for col in &table.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(col.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, rows.len(), |mut row| {
                    let track = &table.tracks[rows[row.index()]];
                    for col in &table.columns {
                        row.col(|ui: &mut Ui| {
                            ui.label(table.cell(track, col).to_string());
                        });
                    }
                });
            });
    });
}
