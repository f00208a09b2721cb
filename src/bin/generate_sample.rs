//! Writes a synthetic track chart dataset in two flavours:
//!
//! * `sample_tracks.csv`     – Latin-1 encoded, source-style column names,
//!   with a few unparseable stream counts and duplicated rows
//! * `sample_tracks.parquet` – the same rows as typed Arrow columns
//!
//! Usage: `cargo run --bin generate-sample [OUTPUT_DIR]`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use encoding_rs::WINDOWS_1252;
use parquet::arrow::ArrowWriter;

const TRACKS: usize = 400;
const DUPLICATES: usize = 6;

const HEADER: [&str; 18] = [
    "track_name",
    "artist(s)_name",
    "artist_count",
    "released_year",
    "released_month",
    "released_day",
    "in_spotify_playlists",
    "streams",
    "bpm",
    "key",
    "mode",
    "danceability_%",
    "valence_%",
    "energy_%",
    "acousticness_%",
    "instrumentalness_%",
    "liveness_%",
    "speechiness_%",
];

const ARTISTS: [&str; 14] = [
    "Nova Reyes",
    "The Paper Kites",
    "Björn Ahlström",
    "Luna Park",
    "DJ Cobalt",
    "Marisol",
    "Echo Valley",
    "Sinéad Quinn",
    "Kid Meridian",
    "Velvet Static",
    "Aurora Lane",
    "Tomás Ibáñez",
    "Glass Harbor",
    "MC Orbit",
];

const WORDS: [&str; 24] = [
    "Midnight", "Summer", "Love", "City", "Lights", "Dream", "Fire", "Heart", "Rain", "Golden",
    "Ocean", "Danger", "Paradise", "Echo", "Wild", "Neon", "Blue", "Forever", "Corazón", "Stars",
    "Road", "Shadow", "Velvet", "Runaway",
];

const KEYS: [&str; 11] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `lo..=hi`.
    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_u64() % (hi - lo + 1) as u64) as i64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.next_u64() as usize % items.len()]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn percent(&mut self, mean: f64, std_dev: f64) -> i64 {
        self.gauss(mean, std_dev).round().clamp(0.0, 100.0) as i64
    }
}

/// One generated row. `streams` is `None` for rows written as `N/A`.
#[derive(Clone)]
struct SampleTrack {
    name: String,
    artists: Vec<&'static str>,
    year: i64,
    month: i64,
    day: i64,
    playlists: i64,
    streams: Option<i64>,
    bpm: i64,
    key: Option<&'static str>,
    mode: &'static str,
    features: [i64; 7],
}

impl SampleTrack {
    fn random(rng: &mut SimpleRng) -> Self {
        let words = rng.range(1, 3);
        let name = (0..words)
            .map(|_| rng.pick(&WORDS))
            .collect::<Vec<_>>()
            .join(" ");

        let artist_count = if rng.next_f64() < 0.25 { rng.range(2, 3) } else { 1 };
        let mut artists: Vec<&'static str> = Vec::new();
        while (artists.len() as i64) < artist_count {
            let artist = rng.pick(&ARTISTS);
            if !artists.contains(&artist) {
                artists.push(artist);
            }
        }

        // Mostly recent releases with a long tail back to the 1970s.
        let year = if rng.next_f64() < 0.8 {
            rng.range(2018, 2023)
        } else {
            rng.range(1970, 2017)
        };

        let streams = if rng.next_f64() < 0.01 {
            None
        } else {
            Some((rng.gauss(17.5, 1.2).exp()) as i64)
        };

        let key = if rng.next_f64() < 0.1 {
            None
        } else {
            Some(rng.pick(&KEYS))
        };

        let danceability = rng.percent(67.0, 14.0);
        let energy = rng.percent(64.0, 16.0);
        Self {
            name,
            artists,
            year,
            month: rng.range(1, 12),
            day: rng.range(1, 28),
            playlists: rng.range(30, 50_000),
            streams,
            bpm: rng.gauss(122.0, 28.0).round().clamp(65.0, 206.0) as i64,
            key,
            mode: if rng.next_f64() < 0.55 { "Major" } else { "Minor" },
            features: [
                danceability,
                rng.percent(51.0, 23.0),
                energy,
                rng.percent(27.0, 26.0),
                rng.percent(2.0, 8.0),
                rng.percent(18.0, 13.0),
                rng.percent(10.0, 9.0),
            ],
        }
    }

    fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.name.clone(),
            self.artists.join(", "),
            self.artists.len().to_string(),
            self.year.to_string(),
            self.month.to_string(),
            self.day.to_string(),
            self.playlists.to_string(),
            self.streams.map_or_else(|| "N/A".to_string(), |s| s.to_string()),
            self.bpm.to_string(),
            self.key.unwrap_or_default().to_string(),
            self.mode.to_string(),
        ];
        fields.extend(self.features.iter().map(|f| f.to_string()));
        fields
    }
}

fn write_csv(path: &Path, tracks: &[SampleTrack]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let encode = |field: &str| WINDOWS_1252.encode(field).0.into_owned();
    writer.write_record(HEADER.iter().map(|h| encode(*h)))?;
    for track in tracks {
        writer.write_record(track.fields().iter().map(|f| encode(f.as_str())))?;
    }
    writer.flush()?;
    Ok(())
}

fn text_column(tracks: &[SampleTrack], f: impl Fn(&SampleTrack) -> Option<String>) -> ArrayRef {
    Arc::new(tracks.iter().map(f).collect::<StringArray>())
}

fn int_column(tracks: &[SampleTrack], f: impl Fn(&SampleTrack) -> Option<i64>) -> ArrayRef {
    Arc::new(tracks.iter().map(f).collect::<Int64Array>())
}

fn write_parquet(path: &Path, tracks: &[SampleTrack]) -> Result<()> {
    let mut columns: Vec<ArrayRef> = vec![
        text_column(tracks, |t| Some(t.name.clone())),
        text_column(tracks, |t| Some(t.artists.join(", "))),
        int_column(tracks, |t| Some(t.artists.len() as i64)),
        int_column(tracks, |t| Some(t.year)),
        int_column(tracks, |t| Some(t.month)),
        int_column(tracks, |t| Some(t.day)),
        int_column(tracks, |t| Some(t.playlists)),
        int_column(tracks, |t| t.streams),
        int_column(tracks, |t| Some(t.bpm)),
        text_column(tracks, |t| t.key.map(str::to_string)),
        text_column(tracks, |t| Some(t.mode.to_string())),
    ];
    for i in 0..7 {
        columns.push(int_column(tracks, |t| Some(t.features[i])));
    }

    let fields: Vec<Field> = HEADER
        .iter()
        .zip(&columns)
        .map(|(name, col)| Field::new(*name, col.data_type().clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let mut tracks: Vec<SampleTrack> = (0..TRACKS).map(|_| SampleTrack::random(&mut rng)).collect();

    // Re-append a few rows verbatim so the loader has duplicates to drop.
    for _ in 0..DUPLICATES {
        let i = rng.range(0, TRACKS as i64 - 1) as usize;
        tracks.push(tracks[i].clone());
    }

    let csv_path = out_dir.join("sample_tracks.csv");
    write_csv(&csv_path, &tracks)?;

    let parquet_path = out_dir.join("sample_tracks.parquet");
    write_parquet(&parquet_path, &tracks)?;

    let bad = tracks.iter().filter(|t| t.streams.is_none()).count();
    println!(
        "Wrote {} tracks ({DUPLICATES} duplicates, {bad} with N/A streams) to {} and {}",
        tracks.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
