use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Canonical column names
// ---------------------------------------------------------------------------

pub const TRACK_NAME: &str = "track_name";
pub const ARTIST_NAME: &str = "artist_name";
pub const RELEASED_YEAR: &str = "released_year";
pub const RELEASED_MONTH: &str = "released_month";
pub const RELEASED_DAY: &str = "released_day";
pub const STREAMS: &str = "streams";
pub const BPM: &str = "bpm";
pub const KEY: &str = "key";
pub const MODE: &str = "mode";
pub const RELEASED_DATE: &str = "released_date";
pub const DECADE: &str = "decade";

/// Columns computed by the loader; never taken from input.
pub const DERIVED_COLUMNS: [&str; 2] = [RELEASED_DATE, DECADE];

// ---------------------------------------------------------------------------
// FieldValue – a single cell of the normalized table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, used wherever the table is walked column by
/// column (export, raw data explorer). Serializes as the bare value, `Null`
/// as JSON `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    /// Stream counts, which may exceed `i64::MAX`.
    Count(u64),
    /// ISO-8601 date string kept as text.
    Date(String),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Date(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Count(n) => write!(f, "{n}"),
            FieldValue::Null => Ok(()),
        }
    }
}

impl FieldValue {
    fn optional_text(value: &Option<String>) -> Self {
        match value {
            Some(s) => FieldValue::Text(s.clone()),
            None => FieldValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// NumericField – the fields aggregates can average or correlate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericField {
    Danceability,
    Valence,
    Energy,
    Acousticness,
    Instrumentalness,
    Liveness,
    Speechiness,
    Streams,
    Bpm,
}

impl NumericField {
    /// The seven percentage metrics, in display order.
    pub const AUDIO_FEATURES: [NumericField; 7] = [
        NumericField::Danceability,
        NumericField::Valence,
        NumericField::Energy,
        NumericField::Acousticness,
        NumericField::Instrumentalness,
        NumericField::Liveness,
        NumericField::Speechiness,
    ];

    /// Fields that take part in the correlation matrix.
    pub const CORRELATED: [NumericField; 9] = [
        NumericField::Danceability,
        NumericField::Valence,
        NumericField::Energy,
        NumericField::Acousticness,
        NumericField::Instrumentalness,
        NumericField::Liveness,
        NumericField::Speechiness,
        NumericField::Streams,
        NumericField::Bpm,
    ];

    /// Column name in the normalized table.
    pub fn column(self) -> &'static str {
        match self {
            NumericField::Danceability => "danceability",
            NumericField::Valence => "valence",
            NumericField::Energy => "energy",
            NumericField::Acousticness => "acousticness",
            NumericField::Instrumentalness => "instrumentalness",
            NumericField::Liveness => "liveness",
            NumericField::Speechiness => "speechiness",
            NumericField::Streams => STREAMS,
            NumericField::Bpm => BPM,
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Track – one row of the normalized table
// ---------------------------------------------------------------------------

/// A single track after normalization.
///
/// `Eq + Hash` cover every column, including the verbatim `extra` ones, so
/// exact-duplicate detection is plain set membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Track {
    pub track_name: String,
    /// One or more artists, joined by the source's delimiter.
    pub artist_name: String,
    pub released_year: i32,
    pub released_month: u32,
    pub released_day: u32,
    /// `None` when year/month/day do not form a calendar date.
    pub released_date: Option<NaiveDate>,
    pub decade: i32,
    pub streams: u64,
    pub bpm: u32,
    pub key: Option<String>,
    pub mode: Option<String>,
    pub danceability: u8,
    pub valence: u8,
    pub energy: u8,
    pub acousticness: u8,
    pub instrumentalness: u8,
    pub liveness: u8,
    pub speechiness: u8,
    /// Non-canonical source columns, aligned with [`TrackTable::extra_columns`].
    pub extra: Vec<Option<String>>,
}

/// floor(year / 10) * 10, also for years before 0.
pub fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

impl Track {
    pub fn numeric(&self, field: NumericField) -> f64 {
        match field {
            NumericField::Danceability => f64::from(self.danceability),
            NumericField::Valence => f64::from(self.valence),
            NumericField::Energy => f64::from(self.energy),
            NumericField::Acousticness => f64::from(self.acousticness),
            NumericField::Instrumentalness => f64::from(self.instrumentalness),
            NumericField::Liveness => f64::from(self.liveness),
            NumericField::Speechiness => f64::from(self.speechiness),
            NumericField::Streams => self.streams as f64,
            NumericField::Bpm => f64::from(self.bpm),
        }
    }

    /// Value of a canonical (typed) column, `None` for any other name.
    fn canonical_value(&self, column: &str) -> Option<FieldValue> {
        let value = match column {
            TRACK_NAME => FieldValue::Text(self.track_name.clone()),
            ARTIST_NAME => FieldValue::Text(self.artist_name.clone()),
            RELEASED_YEAR => FieldValue::Integer(i64::from(self.released_year)),
            RELEASED_MONTH => FieldValue::Integer(i64::from(self.released_month)),
            RELEASED_DAY => FieldValue::Integer(i64::from(self.released_day)),
            RELEASED_DATE => match self.released_date {
                Some(date) => FieldValue::Date(date.format("%Y-%m-%d").to_string()),
                None => FieldValue::Null,
            },
            DECADE => FieldValue::Integer(i64::from(self.decade)),
            STREAMS => FieldValue::Count(self.streams),
            KEY => FieldValue::optional_text(&self.key),
            MODE => FieldValue::optional_text(&self.mode),
            other => {
                let field = NumericField::AUDIO_FEATURES
                    .into_iter()
                    .chain([NumericField::Bpm])
                    .find(|f| f.column() == other)?;
                FieldValue::Integer(self.numeric(field) as i64)
            }
        };
        Some(value)
    }
}

// ---------------------------------------------------------------------------
// TrackTable – the complete normalized dataset
// ---------------------------------------------------------------------------

/// The immutable, normalized dataset with pre-computed control domains.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackTable {
    pub tracks: Vec<Track>,
    /// All columns in output order: source order, then derived columns.
    pub columns: Vec<String>,
    /// Names of the non-canonical columns carried in [`Track::extra`].
    pub extra_columns: Vec<String>,
    /// Sorted distinct non-null keys.
    pub keys: BTreeSet<String>,
    /// Sorted distinct non-null modes.
    pub modes: BTreeSet<String>,
}

impl TrackTable {
    /// Build the table and its control domains from normalized tracks.
    pub fn from_tracks(tracks: Vec<Track>, columns: Vec<String>, extra_columns: Vec<String>) -> Self {
        let keys = tracks.iter().filter_map(|t| t.key.clone()).collect();
        let modes = tracks.iter().filter_map(|t| t.mode.clone()).collect();
        TrackTable {
            tracks,
            columns,
            extra_columns,
            keys,
            modes,
        }
    }

    /// Number of tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Value of `column` for `track`, `Null` if the table has no such column.
    pub fn cell(&self, track: &Track, column: &str) -> FieldValue {
        if let Some(value) = track.canonical_value(column) {
            return value;
        }
        self.extra_columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| track.extra.get(idx).cloned().flatten())
            .map(FieldValue::Text)
            .unwrap_or(FieldValue::Null)
    }

    /// Inclusive (min, max) release year, `None` on an empty table.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        bounds(self.tracks.iter().map(|t| t.released_year))
    }

    /// Inclusive (min, max) tempo, `None` on an empty table.
    pub fn bpm_bounds(&self) -> Option<(u32, u32)> {
        bounds(self.tracks.iter().map(|t| t.bpm))
    }
}

fn bounds<T: Ord + Copy>(mut values: impl Iterator<Item = T>) -> Option<(T, T)> {
    let first = values.next()?;
    Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    #[test]
    fn decade_is_floor_of_year() {
        assert_eq!(decade_of(2023), 2020);
        assert_eq!(decade_of(1990), 1990);
        assert_eq!(decade_of(1999), 1990);
        assert_eq!(decade_of(-5), -10);
    }

    #[test]
    fn cell_reads_canonical_and_extra_columns() {
        let table = fixtures::table(fixtures::SMALL_CSV);
        let track = &table.tracks[0];

        assert_eq!(
            table.cell(track, TRACK_NAME),
            FieldValue::Text("Seven".to_string())
        );
        assert_eq!(table.cell(track, "energy"), FieldValue::Integer(74));
        assert_eq!(table.cell(track, DECADE), FieldValue::Integer(2020));
        assert_eq!(table.cell(track, STREAMS), FieldValue::Count(141_381_703));
        assert_eq!(
            table.cell(track, RELEASED_DATE),
            FieldValue::Date("2023-07-14".to_string())
        );
        assert_eq!(
            table.cell(track, "in_spotify_playlists"),
            FieldValue::Text("553".to_string())
        );
        assert_eq!(table.cell(track, "no_such_column"), FieldValue::Null);
    }

    #[test]
    fn cells_serialize_as_bare_values() {
        let cells = vec![
            FieldValue::Text("Seven".to_string()),
            FieldValue::Integer(-3),
            FieldValue::Count(u64::MAX),
            FieldValue::Date("2023-07-14".to_string()),
            FieldValue::Null,
        ];
        assert_eq!(
            serde_json::to_string(&cells).unwrap(),
            r#"["Seven",-3,18446744073709551615,"2023-07-14",null]"#
        );
        assert_eq!(FieldValue::Count(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(FieldValue::Null.to_string(), "");
    }

    #[test]
    fn control_domains_skip_missing_values() {
        let table = fixtures::table(fixtures::SMALL_CSV);
        let keys: Vec<&str> = table.keys.iter().map(String::as_str).collect();
        assert_eq!(keys, vec!["A", "B", "C#"]);
        let modes: Vec<&str> = table.modes.iter().map(String::as_str).collect();
        assert_eq!(modes, vec!["Major", "Minor"]);
        assert_eq!(table.year_bounds(), Some((1999, 2023)));
        assert_eq!(table.bpm_bounds(), Some((92, 170)));
    }

    #[test]
    fn empty_table_has_no_bounds() {
        let table = TrackTable::from_tracks(Vec::new(), Vec::new(), Vec::new());
        assert!(table.is_empty());
        assert_eq!(table.year_bounds(), None);
        assert_eq!(table.bpm_bounds(), None);
    }
}
