//! Read-only aggregates over a [`FilteredView`].
//!
//! Every function here recomputes from the view it is given; nothing is
//! cached, so two calls on the same view always agree. An empty view yields
//! empty collections and zero counts, never an error.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use super::filter::FilteredView;
use super::model::{NumericField, Track};

// ---------------------------------------------------------------------------
// Scalar summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub tracks: usize,
    /// Distinct individual artists after splitting multi-artist strings.
    pub artists: usize,
    pub streams: u64,
}

pub fn summary(view: &FilteredView, delimiter: &str) -> Summary {
    let mut artists = HashSet::new();
    let mut streams = 0u64;
    for track in view.tracks() {
        artists.extend(split_artists(&track.artist_name, delimiter));
        streams = streams.saturating_add(track.streams);
    }
    Summary {
        tracks: view.len(),
        artists: artists.len(),
        streams,
    }
}

/// Individual artist names in a joined artist string. Pieces are trimmed and
/// empty ones skipped; an empty delimiter disables splitting.
pub fn split_artists<'a>(artists: &'a str, delimiter: &'a str) -> impl Iterator<Item = &'a str> {
    let pieces: Box<dyn Iterator<Item = &'a str> + 'a> = if delimiter.is_empty() {
        Box::new(std::iter::once(artists))
    } else {
        Box::new(artists.split(delimiter))
    };
    pieces.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Top-N rankings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    /// Number of tracks the artist appears on.
    Tracks,
    /// Streams summed over those tracks.
    Streams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked {
    pub name: String,
    pub value: u64,
}

/// Accumulates per-name totals while remembering first-encounter order, so
/// a stable sort breaks ties by that order.
#[derive(Default)]
struct Tally<'a> {
    index: HashMap<&'a str, usize>,
    entries: Vec<(&'a str, u64)>,
}

impl<'a> Tally<'a> {
    fn add(&mut self, name: &'a str, amount: u64) {
        let slot = *self.index.entry(name).or_insert_with(|| {
            self.entries.push((name, 0));
            self.entries.len() - 1
        });
        self.entries[slot].1 = self.entries[slot].1.saturating_add(amount);
    }

    fn top(mut self, n: usize) -> Vec<Ranked> {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries.truncate(n);
        self.entries
            .into_iter()
            .map(|(name, value)| Ranked {
                name: name.to_string(),
                value,
            })
            .collect()
    }
}

/// The `n` highest-ranked artists. A track credited to several artists
/// counts once for each of them. Returns fewer than `n` entries when there
/// are fewer artists.
pub fn top_artists(view: &FilteredView, rank_by: RankBy, n: usize, delimiter: &str) -> Vec<Ranked> {
    let mut tally = Tally::default();
    for track in view.tracks() {
        let amount = match rank_by {
            RankBy::Tracks => 1,
            RankBy::Streams => track.streams,
        };
        for artist in split_artists(&track.artist_name, delimiter) {
            tally.add(artist, amount);
        }
    }
    tally.top(n)
}

/// The `n` most streamed tracks, ties kept in table order.
pub fn top_tracks(view: &FilteredView, n: usize) -> Vec<&Track> {
    let mut tracks: Vec<&Track> = view.tracks().collect();
    tracks.sort_by(|a, b| b.streams.cmp(&a.streams));
    tracks.truncate(n);
    tracks
}

const TITLE_STOPWORDS: &[&str] = &[
    "a", "an", "and", "de", "el", "feat", "ft", "for", "i", "in", "is", "it", "la", "me", "my",
    "of", "on", "the", "to", "with", "you",
];

/// Most frequent words across track names (lowercased, alphanumeric runs of
/// at least two characters, common filler words skipped).
pub fn title_word_counts(view: &FilteredView, n: usize) -> Vec<Ranked> {
    let lowered: Vec<String> = view.tracks().map(|t| t.track_name.to_lowercase()).collect();
    let mut tally = Tally::default();
    for name in &lowered {
        for word in name.split(|c: char| !c.is_alphanumeric()) {
            if word.chars().count() >= 2 && !TITLE_STOPWORDS.contains(&word) {
                tally.add(word, 1);
            }
        }
    }
    tally.top(n)
}

// ---------------------------------------------------------------------------
// Group-by
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Decade,
    Year,
    Month,
    /// Key and mode together; rows missing either are left out.
    KeyMode,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Number(i64),
    KeyMode { key: String, mode: String },
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Number(n) => write!(f, "{n}"),
            GroupKey::KeyMode { key, mode } => write!(f, "{key} {mode}"),
        }
    }
}

impl GroupKey {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GroupKey::Number(n) => Some(*n as f64),
            GroupKey::KeyMode { .. } => None,
        }
    }
}

fn group_key(track: &Track, by: GroupBy) -> Option<GroupKey> {
    match by {
        GroupBy::Decade => Some(GroupKey::Number(i64::from(track.decade))),
        GroupBy::Year => Some(GroupKey::Number(i64::from(track.released_year))),
        GroupBy::Month => Some(GroupKey::Number(i64::from(track.released_month))),
        GroupBy::KeyMode => Some(GroupKey::KeyMode {
            key: track.key.clone()?,
            mode: track.mode.clone()?,
        }),
    }
}

/// Per-partition means of `fields`, in ascending key order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub key: GroupKey,
    pub count: usize,
    /// Aligned with the requested fields.
    pub means: Vec<f64>,
}

/// Mean of each field per partition. Only partitions that received at least
/// one row appear.
pub fn group_means(view: &FilteredView, by: GroupBy, fields: &[NumericField]) -> Vec<GroupMean> {
    let mut sums: BTreeMap<GroupKey, (usize, Vec<f64>)> = BTreeMap::new();
    for track in view.tracks() {
        let Some(key) = group_key(track, by) else {
            continue;
        };
        let (count, totals) = sums
            .entry(key)
            .or_insert_with(|| (0, vec![0.0; fields.len()]));
        *count += 1;
        for (total, field) in totals.iter_mut().zip(fields) {
            *total += track.numeric(*field);
        }
    }

    sums.into_iter()
        .map(|(key, (count, totals))| GroupMean {
            key,
            count,
            means: totals.into_iter().map(|t| t / count as f64).collect(),
        })
        .collect()
}

/// Rows per partition, in ascending key order.
pub fn group_counts(view: &FilteredView, by: GroupBy) -> Vec<(GroupKey, usize)> {
    let mut counts: BTreeMap<GroupKey, usize> = BTreeMap::new();
    for key in view.tracks().filter_map(|t| group_key(t, by)) {
        *counts.entry(key).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Mean of each audio feature over the whole view; empty for an empty view.
pub fn feature_means(view: &FilteredView) -> Vec<(NumericField, f64)> {
    if view.is_empty() {
        return Vec::new();
    }
    let n = view.len() as f64;
    NumericField::AUDIO_FEATURES
        .iter()
        .map(|&field| (field, view.tracks().map(|t| t.numeric(field)).sum::<f64>() / n))
        .collect()
}

// ---------------------------------------------------------------------------
// Tempo histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins spanning the view's tempo range. The last bin is closed
/// on the right so the maximum is counted.
pub fn bpm_histogram(view: &FilteredView, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = view.tracks().map(|t| t.numeric(NumericField::Bpm)).collect();
    if bins == 0 || values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        return vec![HistogramBin {
            start: min,
            end: min + 1.0,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correlation {
    Value(f64),
    /// Fewer than two rows, or one side has zero variance.
    NotComputable,
}

impl Correlation {
    pub fn value(self) -> Option<f64> {
        match self {
            Correlation::Value(v) => Some(v),
            Correlation::NotComputable => None,
        }
    }
}

/// Pairwise Pearson correlation; `cells[i][j]` pairs `fields[i]` with `fields[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub fields: Vec<NumericField>,
    pub cells: Vec<Vec<Correlation>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericField, b: NumericField) -> Option<Correlation> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        Some(self.cells[i][j])
    }
}

pub fn correlation_matrix(view: &FilteredView) -> CorrelationMatrix {
    let fields = NumericField::CORRELATED.to_vec();
    let columns: Vec<Vec<f64>> = fields
        .iter()
        .map(|&f| view.tracks().map(|t| t.numeric(f)).collect())
        .collect();

    let cells = columns
        .iter()
        .map(|xs| columns.iter().map(|ys| pearson(xs, ys)).collect())
        .collect();

    CorrelationMatrix { fields, cells }
}

fn pearson(xs: &[f64], ys: &[f64]) -> Correlation {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return Correlation::NotComputable;
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return Correlation::NotComputable;
    }
    Correlation::Value((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply, FilterConstraints};
    use crate::data::fixtures;

    fn small_view() -> FilteredView {
        FilteredView::all(fixtures::shared(fixtures::SMALL_CSV))
    }

    fn empty_view() -> FilteredView {
        let table = fixtures::shared(fixtures::SMALL_CSV);
        let constraints = FilterConstraints {
            year: 3000..=3001,
            ..FilterConstraints::default()
        };
        apply(table, &constraints)
    }

    fn names(ranked: &[Ranked]) -> Vec<(&str, u64)> {
        ranked.iter().map(|r| (r.name.as_str(), r.value)).collect()
    }

    #[test]
    fn splits_multi_artist_strings() {
        let artists: Vec<&str> = split_artists("A, B", ",").collect();
        assert_eq!(artists, vec!["A", "B"]);
        let artists: Vec<&str> = split_artists(" Solo ", ",").collect();
        assert_eq!(artists, vec!["Solo"]);
        let artists: Vec<&str> = split_artists("A,,B, ", ",").collect();
        assert_eq!(artists, vec!["A", "B"]);
        let artists: Vec<&str> = split_artists("A, B", "").collect();
        assert_eq!(artists, vec!["A, B"]);
    }

    #[test]
    fn joined_artists_count_once_each() {
        let csv = format!(
            "{}\n{}\n",
            fixtures::HEADER,
            fixtures::row("duet", "A, B", 2020, 100, "A", "Major", 50, 50, 50, "10"),
        );
        let view = FilteredView::all(fixtures::shared(&csv));
        let top = top_artists(&view, RankBy::Tracks, 10, ",");
        assert_eq!(names(&top), vec![("A", 1), ("B", 1)]);
        assert!(top.iter().all(|r| r.name != "A, B"));
    }

    #[test]
    fn summary_counts_individual_artists() {
        let s = summary(&small_view(), ",");
        assert_eq!(s.tracks, 6);
        assert_eq!(s.artists, 5);
        assert_eq!(s.streams, 1_215_950_280);
    }

    #[test]
    fn top_artists_by_count_is_stable_on_ties() {
        let top = top_artists(&small_view(), RankBy::Tracks, 3, ",");
        assert_eq!(
            names(&top),
            vec![("Latto", 2), ("Myke Towers", 2), ("Taylor Swift", 2)]
        );
    }

    #[test]
    fn top_artists_by_streams() {
        let top = top_artists(&small_view(), RankBy::Streams, 2, ",");
        assert_eq!(
            names(&top),
            vec![("Taylor Swift", 800_843_317), ("Latto", 141_384_203)]
        );
    }

    #[test]
    fn top_n_is_clamped_to_group_count() {
        let top = top_artists(&small_view(), RankBy::Tracks, 50, ",");
        assert_eq!(top.len(), 5);
        assert_eq!(top_tracks(&small_view(), 50).len(), 6);
    }

    #[test]
    fn top_tracks_by_streams() {
        let view = small_view();
        let top: Vec<&str> = top_tracks(&view, 2)
            .iter()
            .map(|t| t.track_name.as_str())
            .collect();
        assert_eq!(top, vec!["Cruel Summer", "Seven"]);
    }

    #[test]
    fn group_means_by_decade_omit_empty_decades() {
        let means = group_means(
            &small_view(),
            GroupBy::Decade,
            &[NumericField::Energy, NumericField::Bpm],
        );
        let keys: Vec<GroupKey> = means.iter().map(|m| m.key.clone()).collect();
        assert_eq!(keys, vec![GroupKey::Number(1990), GroupKey::Number(2010), GroupKey::Number(2020)]);

        assert_eq!(means[0].count, 1);
        assert_eq!(means[0].means, vec![35.0, 100.0]);
        // 2020s: Seven, LALA, vampire, Leap Ghost
        assert_eq!(means[2].count, 4);
        assert_eq!(means[2].means[0], (74.0 + 74.0 + 53.0 + 65.0) / 4.0);
    }

    #[test]
    fn key_mode_groups_skip_missing_key() {
        let counts = group_counts(&small_view(), GroupBy::KeyMode);
        let total: usize = counts.iter().map(|(_, c)| c).sum();
        assert_eq!(total, 5);
        assert_eq!(
            counts[0],
            (
                GroupKey::KeyMode {
                    key: "A".to_string(),
                    mode: "Major".to_string()
                },
                1
            )
        );
    }

    #[test]
    fn feature_profile_covers_all_audio_features() {
        let profile = feature_means(&small_view());
        assert_eq!(profile.len(), 7);
        let (field, instrumental) = profile[4];
        assert_eq!(field, NumericField::Instrumentalness);
        assert_eq!(instrumental, 3.0 / 6.0);
    }

    #[test]
    fn histogram_counts_every_row() {
        let bins = bpm_histogram(&small_view(), 30);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 6);
        assert_eq!(bins[0].start, 92.0);
        assert_eq!(bins[29].count, 1); // the 170 bpm maximum
    }

    #[test]
    fn correlation_of_identical_columns_is_one() {
        let matrix = correlation_matrix(&small_view());
        assert_eq!(matrix.fields.len(), 9);
        let diag = matrix
            .get(NumericField::Energy, NumericField::Energy)
            .and_then(Correlation::value)
            .unwrap();
        assert!((diag - 1.0).abs() < 1e-12);
        let cross = matrix
            .get(NumericField::Energy, NumericField::Valence)
            .and_then(Correlation::value)
            .unwrap();
        assert!((-1.0..=1.0).contains(&cross));
    }

    #[test]
    fn zero_variance_is_not_computable() {
        let csv = format!(
            "{}\n{}\n{}\n",
            fixtures::HEADER,
            fixtures::row("one", "A", 2020, 100, "A", "Major", 40, 50, 50, "10"),
            fixtures::row("two", "B", 2021, 120, "A", "Major", 60, 50, 50, "20"),
        );
        let matrix = correlation_matrix(&FilteredView::all(fixtures::shared(&csv)));
        // energy is 50 on both rows
        assert_eq!(
            matrix.get(NumericField::Energy, NumericField::Danceability),
            Some(Correlation::NotComputable)
        );
        assert_eq!(
            matrix.get(NumericField::Danceability, NumericField::Bpm),
            Some(Correlation::Value(1.0))
        );
    }

    #[test]
    fn single_row_correlation_is_not_computable() {
        let csv = format!(
            "{}\n{}\n",
            fixtures::HEADER,
            fixtures::row("one", "A", 2020, 100, "A", "Major", 40, 50, 50, "10"),
        );
        let matrix = correlation_matrix(&FilteredView::all(fixtures::shared(&csv)));
        assert!(matrix
            .cells
            .iter()
            .flatten()
            .all(|c| *c == Correlation::NotComputable));
    }

    #[test]
    fn empty_view_yields_empty_results() {
        let view = empty_view();
        assert_eq!(summary(&view, ","), Summary::default());
        assert!(top_artists(&view, RankBy::Streams, 10, ",").is_empty());
        assert!(top_tracks(&view, 10).is_empty());
        assert!(group_means(&view, GroupBy::Year, &[NumericField::Bpm]).is_empty());
        assert!(group_counts(&view, GroupBy::Month).is_empty());
        assert!(feature_means(&view).is_empty());
        assert!(bpm_histogram(&view, 30).is_empty());
        assert!(title_word_counts(&view, 10).is_empty());
        assert!(correlation_matrix(&view)
            .cells
            .iter()
            .flatten()
            .all(|c| *c == Correlation::NotComputable));
    }

    #[test]
    fn aggregates_are_idempotent() {
        let view = small_view();
        assert_eq!(correlation_matrix(&view), correlation_matrix(&view));
        assert_eq!(
            top_artists(&view, RankBy::Streams, 5, ","),
            top_artists(&view, RankBy::Streams, 5, ",")
        );
        assert_eq!(
            group_means(&view, GroupBy::Year, &NumericField::AUDIO_FEATURES),
            group_means(&view, GroupBy::Year, &NumericField::AUDIO_FEATURES)
        );
    }

    #[test]
    fn title_words_skip_filler() {
        let csv = format!(
            "{}\n{}\n{}\n",
            fixtures::HEADER,
            fixtures::row("Love of the Night", "A", 2020, 100, "A", "Major", 40, 50, 50, "10"),
            fixtures::row("Night Love (feat. X)", "B", 2021, 120, "A", "Major", 60, 50, 50, "20"),
        );
        let words = title_word_counts(&FilteredView::all(fixtures::shared(&csv)), 10);
        assert_eq!(names(&words), vec![("love", 2), ("night", 2)]);
    }
}
