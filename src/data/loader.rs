use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::datatypes::DataType;
use chrono::NaiveDate;
use encoding_rs::{Encoding, WINDOWS_1252};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::model::{
    decade_of, NumericField, Track, TrackTable, ARTIST_NAME, BPM, DERIVED_COLUMNS, KEY, MODE,
    RELEASED_DAY, RELEASED_MONTH, RELEASED_YEAR, STREAMS, TRACK_NAME,
};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How to read a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Text encoding of CSV input. JSON and Parquet are always UTF-8.
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    /// Latin-1, which encoding_rs maps onto windows-1252.
    fn default() -> Self {
        Self {
            encoding: WINDOWS_1252,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and normalize a track dataset.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one record per track (the usual case)
/// * `.json`    – `[{ "track_name": ..., "streams": ..., ... }, ...]`
/// * `.parquet` – flat columns of strings / numbers
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<TrackTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "csv" => read_csv(open(path)?, options)?,
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };
    let table = normalize(raw)?;
    log::info!(
        "Loaded {} tracks from {} ({} columns)",
        table.len(),
        path.display(),
        table.columns.len()
    );
    Ok(table)
}

/// Load CSV from any reader, e.g. an in-memory buffer.
pub fn load_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<TrackTable, LoadError> {
    normalize(read_csv(reader, options)?)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Raw rows – what every format is parsed into before normalization
// ---------------------------------------------------------------------------

/// Untyped rows of named fields straight from the source. `None` is an empty
/// or null cell.
#[derive(Debug, Default)]
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// A byte-order mark overrides the configured encoding, so files written by
/// the CSV export (UTF-8 with BOM) load back unchanged.
fn read_csv<R: Read>(mut reader: R, options: &LoadOptions) -> Result<RawTable, LoadError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| LoadError::malformed("CSV", e))?;
    let (encoding, bom_len) = Encoding::for_bom(&bytes).unwrap_or((options.encoding, 0));
    // Ragged rows are read as-is; missing cells drop the row in `normalize`.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(&bytes[bom_len..]);

    let headers = reader
        .byte_headers()
        .map_err(|e| LoadError::malformed("CSV", e))?
        .iter()
        .map(|h| decode(h, encoding))
        .collect();

    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return Err(LoadError::malformed("CSV", e)),
        }
        let row = record
            .iter()
            .map(|field| Some(decode(field, encoding)).filter(|s| !s.is_empty()))
            .collect();
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    encoding.decode_without_bom_handling(bytes).0.into_owned()
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, as written by the JSON export):
///
/// ```json
/// [
///   { "track_name": "Seven", "artist_name": "Latto, Jung Kook", "streams": 141381703, ... },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<RawTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::InvalidData {
            LoadError::malformed("JSON", source)
        } else {
            LoadError::DataUnavailable {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|e| LoadError::malformed("JSON", e))?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::malformed("JSON", "expected top-level array"))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::malformed("JSON", format!("row {i} is not an object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).and_then(json_to_text))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<RawTable, LoadError> {
    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| LoadError::malformed("Parquet", e))?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder
        .build()
        .map_err(|e| LoadError::malformed("Parquet", e))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::malformed("Parquet", e))?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_text(col, row))
                .collect();
            rows.push(cells);
        }
    }

    Ok(RawTable { headers, rows })
}

/// Render a single Arrow cell as text, `None` for nulls.
fn extract_text(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    let any = col.as_any();
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => any.downcast_ref::<Int32Array>()?.value(row).to_string(),
        DataType::Int64 => any.downcast_ref::<Int64Array>()?.value(row).to_string(),
        DataType::Float32 => any.downcast_ref::<Float32Array>()?.value(row).to_string(),
        DataType::Float64 => any.downcast_ref::<Float64Array>()?.value(row).to_string(),
        DataType::Boolean => any.downcast_ref::<BooleanArray>()?.value(row).to_string(),
        _ => arrow::util::display::array_value_to_string(col, row).ok()?,
    };
    Some(text).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Lowercase and join whitespace-separated words with `_`, then apply the
/// explicit overrides for symbol-laden source names.
pub fn normalize_column_name(name: &str) -> String {
    let generic = name
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    if generic == "artist(s)_name" {
        return ARTIST_NAME.to_string();
    }
    if let Some(bare) = generic.strip_suffix("_%") {
        if NumericField::AUDIO_FEATURES.iter().any(|f| f.column() == bare) {
            return bare.to_string();
        }
    }
    generic
}

/// Column positions of the canonical fields within a raw row.
struct Layout {
    track_name: usize,
    artist_name: usize,
    year: usize,
    month: usize,
    day: usize,
    streams: usize,
    bpm: usize,
    key: usize,
    mode: usize,
    features: [usize; 7],
    /// (name, position) of every carried-through non-canonical column.
    extra: Vec<(String, usize)>,
}

impl Layout {
    fn resolve(names: &[String]) -> Result<Self, LoadError> {
        let find = |col: &'static str| {
            names
                .iter()
                .position(|n| n == col)
                .ok_or(LoadError::MissingColumn(col))
        };

        let mut features = [0; 7];
        for (slot, field) in features.iter_mut().zip(NumericField::AUDIO_FEATURES) {
            *slot = find(field.column())?;
        }

        let canonical: Vec<&str> = [
            TRACK_NAME,
            ARTIST_NAME,
            RELEASED_YEAR,
            RELEASED_MONTH,
            RELEASED_DAY,
            STREAMS,
            BPM,
            KEY,
            MODE,
        ]
        .into_iter()
        .chain(NumericField::AUDIO_FEATURES.iter().map(|f| f.column()))
        .chain(DERIVED_COLUMNS)
        .collect();

        let mut extra: Vec<(String, usize)> = Vec::new();
        for (idx, name) in names.iter().enumerate() {
            if canonical.contains(&name.as_str()) || extra.iter().any(|(n, _)| n == name) {
                continue;
            }
            extra.push((name.clone(), idx));
        }

        Ok(Layout {
            track_name: find(TRACK_NAME)?,
            artist_name: find(ARTIST_NAME)?,
            year: find(RELEASED_YEAR)?,
            month: find(RELEASED_MONTH)?,
            day: find(RELEASED_DAY)?,
            streams: find(STREAMS)?,
            bpm: find(BPM)?,
            key: find(KEY)?,
            mode: find(MODE)?,
            features,
            extra,
        })
    }
}

#[derive(Debug, Default)]
struct DropCounts {
    bad_streams: usize,
    bad_fields: usize,
    duplicates: usize,
}

fn normalize(raw: RawTable) -> Result<TrackTable, LoadError> {
    let names: Vec<String> = raw.headers.iter().map(|h| normalize_column_name(h)).collect();
    let layout = Layout::resolve(&names)?;

    let mut columns: Vec<String> = Vec::new();
    for name in &names {
        if !DERIVED_COLUMNS.contains(&name.as_str()) && !columns.contains(name) {
            columns.push(name.clone());
        }
    }
    columns.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));

    let mut drops = DropCounts::default();
    let mut tracks = Vec::with_capacity(raw.rows.len());

    for (row_no, row) in raw.rows.iter().enumerate() {
        let cell = |idx: usize| row.get(idx).and_then(|c| c.as_deref());

        let Some(streams) = parse_int::<u64>(cell(layout.streams)) else {
            log::debug!("Row {row_no}: dropping unparseable streams {:?}", cell(layout.streams));
            drops.bad_streams += 1;
            continue;
        };
        let Some(track) = build_track(&layout, &cell, streams) else {
            log::debug!("Row {row_no}: dropping row with malformed numeric fields");
            drops.bad_fields += 1;
            continue;
        };
        tracks.push(track);
    }

    let mut seen = HashSet::with_capacity(tracks.len());
    let before = tracks.len();
    tracks.retain(|t| seen.insert(t.clone()));
    drops.duplicates = before - tracks.len();

    log::info!(
        "Normalized {} of {} rows (dropped: {} bad stream counts, {} malformed, {} duplicates)",
        tracks.len(),
        raw.rows.len(),
        drops.bad_streams,
        drops.bad_fields,
        drops.duplicates
    );

    let extra_columns = layout.extra.into_iter().map(|(name, _)| name).collect();
    Ok(TrackTable::from_tracks(tracks, columns, extra_columns))
}

fn build_track<'r>(
    layout: &Layout,
    cell: &impl Fn(usize) -> Option<&'r str>,
    streams: u64,
) -> Option<Track> {
    let released_year: i32 = parse_int(cell(layout.year))?;
    let released_month: u32 = parse_int(cell(layout.month))?;
    let released_day: u32 = parse_int(cell(layout.day))?;
    let bpm: u32 = parse_int(cell(layout.bpm)).filter(|b| *b > 0)?;

    let mut features = [0u8; 7];
    for (slot, idx) in features.iter_mut().zip(layout.features) {
        *slot = parse_int::<u8>(cell(idx)).filter(|v| *v <= 100)?;
    }
    let [danceability, valence, energy, acousticness, instrumentalness, liveness, speechiness] =
        features;

    let category = |idx: usize| {
        cell(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(Track {
        track_name: cell(layout.track_name).unwrap_or_default().to_string(),
        artist_name: cell(layout.artist_name).unwrap_or_default().to_string(),
        released_year,
        released_month,
        released_day,
        released_date: NaiveDate::from_ymd_opt(released_year, released_month, released_day),
        decade: decade_of(released_year),
        streams,
        bpm,
        key: category(layout.key),
        mode: category(layout.mode),
        danceability,
        valence,
        energy,
        acousticness,
        instrumentalness,
        liveness,
        speechiness,
        extra: layout
            .extra
            .iter()
            .map(|(_, idx)| cell(*idx).map(str::to_string))
            .collect(),
    })
}

/// Integer coercion. Accepts integral floats such as `"2023.0"` (what
/// float-typed columns round-trip as); anything else is `None`.
fn parse_int<T: FromStr>(cell: Option<&str>) -> Option<T> {
    let text = cell?.trim();
    if let Ok(v) = text.parse::<T>() {
        return Some(v);
    }
    let float = text.parse::<f64>().ok()?;
    if !float.is_finite() || float.fract() != 0.0 {
        return None;
    }
    format!("{float:.0}").parse::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;
    use std::io::Write;

    #[test]
    fn normalizes_source_column_names() {
        assert_eq!(normalize_column_name("artist(s)_name"), "artist_name");
        assert_eq!(normalize_column_name("Artist(s) Name"), "artist_name");
        assert_eq!(normalize_column_name("danceability_%"), "danceability");
        assert_eq!(normalize_column_name("Energy  %"), "energy");
        assert_eq!(normalize_column_name("In Spotify Playlists"), "in_spotify_playlists");
        assert_eq!(normalize_column_name("\u{feff}track_name"), "track_name");
        // only the known features lose their suffix
        assert_eq!(normalize_column_name("loudness_%"), "loudness_%");
    }

    #[test]
    fn loads_and_cleans_small_dataset() {
        let table = fixtures::table(fixtures::SMALL_CSV);

        // 8 rows: one bad stream count, one exact duplicate
        assert_eq!(table.len(), 6);
        let names: Vec<&str> = table.tracks.iter().map(|t| t.track_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Seven", "LALA", "vampire", "Cruel Summer", "Leap Ghost", "Old One"]
        );
        assert_eq!(table.columns.first().map(String::as_str), Some("track_name"));
        assert_eq!(
            &table.columns[table.columns.len() - 2..],
            &["released_date".to_string(), "decade".to_string()]
        );
        assert_eq!(table.extra_columns, vec!["artist_count", "in_spotify_playlists"]);
    }

    #[test]
    fn unparseable_streams_drop_the_row() {
        let table = fixtures::table(fixtures::SMALL_CSV);
        assert!(table.tracks.iter().all(|t| t.track_name != "Bad Streams"));
    }

    #[test]
    fn negative_and_fractional_streams_are_dropped() {
        let csv = format!(
            "{}\n{}\n{}\n{}\n",
            fixtures::HEADER,
            fixtures::row("neg", "X", 2020, 100, "A", "Major", 50, 50, 50, "-5"),
            fixtures::row("frac", "X", 2020, 100, "A", "Major", 50, 50, 50, "1.5"),
            fixtures::row("ok", "X", 2020, 100, "A", "Major", 50, 50, 50, "2.0"),
        );
        let table = fixtures::table(&csv);
        assert_eq!(table.len(), 1);
        assert_eq!(table.tracks[0].streams, 2);
    }

    #[test]
    fn short_row_is_dropped_without_failing_the_load() {
        let good = fixtures::row("ok", "X", 2020, 100, "A", "Major", 50, 50, 50, "10");
        let full = fixtures::row("short", "Y", 2021, 110, "B", "Minor", 40, 40, 40, "20");
        let (short, _speechiness) = full.rsplit_once(',').unwrap();
        let csv = format!("{}\n{good}\n{short}\n", fixtures::HEADER);

        let table = load_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.tracks[0].track_name, "ok");
    }

    #[test]
    fn invalid_date_is_null_but_row_is_kept() {
        let table = fixtures::table(fixtures::SMALL_CSV);
        let ghost = table
            .tracks
            .iter()
            .find(|t| t.track_name == "Leap Ghost")
            .unwrap();
        assert_eq!(ghost.released_date, None);
        assert_eq!(ghost.key, None);
        assert_eq!(ghost.decade, 2020);
    }

    #[test]
    fn derived_columns_in_input_are_recomputed() {
        let csv = "\
track_name,artist_name,released_year,released_month,released_day,streams,bpm,key,mode,danceability,valence,energy,acousticness,instrumentalness,liveness,speechiness,released_date,decade
Song,Artist,1987,1,2,10,100,A,Major,1,2,3,4,5,6,7,1900-01-01,1900
";
        let table = fixtures::table(csv);
        let track = &table.tracks[0];
        assert_eq!(track.decade, 1980);
        assert_eq!(track.released_date, NaiveDate::from_ymd_opt(1987, 1, 2));
        assert!(table.extra_columns.is_empty());
        assert_eq!(table.columns.iter().filter(|c| *c == "decade").count(), 1);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let csv = "track_name,streams\nA,1\n";
        let err = load_reader(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(_)));
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("nope.csv"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::DataUnavailable { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("tracks.xlsx"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn decodes_latin1_source() {
        let csv = format!(
            "{}\n{}\n",
            fixtures::HEADER,
            fixtures::row("Canción", "Rosalía", 2022, 100, "A", "Major", 50, 50, 50, "10"),
        );
        let (bytes, _, _) = WINDOWS_1252.encode(&csv);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        File::create(&path).unwrap().write_all(&bytes).unwrap();

        let table = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.tracks[0].track_name, "Canción");
        assert_eq!(table.tracks[0].artist_name, "Rosalía");
    }

    #[test]
    fn utf8_bom_overrides_configured_encoding() {
        let csv = format!(
            "\u{feff}{}\n{}\n",
            fixtures::HEADER,
            fixtures::row("Canción", "Rosalía", 2022, 100, "A", "Major", 50, 50, 50, "10"),
        );
        let table = load_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(table.tracks[0].track_name, "Canción");
        assert_eq!(table.columns[0], "track_name");
    }

    #[test]
    fn loading_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");
        std::fs::write(&path, fixtures::SMALL_CSV).unwrap();

        let first = load_file(&path, &LoadOptions::default()).unwrap();
        let second = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn loads_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.json");
        let json = r#"[
            {"track_name": "Seven", "artist(s)_name": "Latto, Jung Kook", "released_year": 2023,
             "released_month": 7, "released_day": 14, "streams": 141381703, "bpm": 125,
             "key": "B", "mode": "Major", "danceability_%": 80, "valence_%": 89, "energy_%": 74,
             "acousticness_%": 31, "instrumentalness_%": 0, "liveness_%": 8, "speechiness_%": 4},
            {"track_name": "Broken", "artist(s)_name": "X", "released_year": 2023,
             "released_month": 7, "released_day": 14, "streams": "N/A", "bpm": 125,
             "key": null, "mode": "Major", "danceability_%": 80, "valence_%": 89, "energy_%": 74,
             "acousticness_%": 31, "instrumentalness_%": 0, "liveness_%": 8, "speechiness_%": 4}
        ]"#;
        std::fs::write(&path, json).unwrap();

        let table = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.tracks[0].artist_name, "Latto, Jung Kook");
        assert_eq!(table.tracks[0].energy, 74);
    }

    #[test]
    fn non_utf8_json_is_malformed_not_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.json");
        std::fs::write(&path, [b'[', 0xff, b']']).unwrap();

        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { format: "JSON", .. }));
    }

    #[test]
    fn integer_coercion_accepts_integral_floats_only() {
        assert_eq!(parse_int::<i32>(Some("2023.0")), Some(2023));
        assert_eq!(parse_int::<i32>(Some(" 7 ")), Some(7));
        assert_eq!(parse_int::<u64>(Some("N/A")), None);
        assert_eq!(parse_int::<u64>(Some("1e3")), Some(1000));
        assert_eq!(parse_int::<u64>(None), None);
    }
}
