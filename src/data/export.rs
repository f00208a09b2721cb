use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde_json::{Map, Value as JsonValue};

use super::error::ExportError;
use super::filter::FilteredView;

/// Default export file name: `tracks_filtered_YYYYMMDD.<ext>`.
pub fn default_file_name(date: NaiveDate, extension: &str) -> String {
    format!("tracks_filtered_{}.{extension}", date.format("%Y%m%d"))
}

/// Write the view as UTF-8 CSV with a byte-order mark: every table column,
/// header first.
pub fn write_csv<W: Write>(view: &FilteredView, mut writer: W) -> Result<(), ExportError> {
    let table = view.table();
    writer
        .write_all("\u{feff}".as_bytes())
        .map_err(csv::Error::from)?;
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&table.columns)?;
    for track in view.tracks() {
        writer.write_record(
            table
                .columns
                .iter()
                .map(|col| table.cell(track, col).to_string()),
        )?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the view as a JSON array of records keyed by column name.
pub fn write_json<W: Write>(view: &FilteredView, writer: W) -> Result<(), ExportError> {
    let table = view.table();
    let mut records = Vec::with_capacity(view.len());
    for track in view.tracks() {
        let mut record = Map::new();
        for col in &table.columns {
            record.insert(col.clone(), serde_json::to_value(table.cell(track, col))?);
        }
        records.push(JsonValue::Object(record));
    }
    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}

/// Export to a file, choosing the format from the extension (`.json`, else CSV).
pub fn export_file(view: &FilteredView, path: &Path) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        write_json(view, &mut writer)?;
    } else {
        write_csv(view, &mut writer)?;
    }
    writer.flush().map_err(io_err)?;

    log::info!("Exported {} tracks to {}", view.len(), path.display());
    Ok(())
}
