use std::ops::RangeInclusive;
use std::sync::Arc;

use super::model::{Track, TrackTable};

// ---------------------------------------------------------------------------
// Filter predicate: the current user selection
// ---------------------------------------------------------------------------

/// A categorical control. `All` is the "no filter" sentinel and also matches
/// rows where the value is absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(wanted.as_str()),
        }
    }
}

/// The conjunction of every active control. Ranges are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConstraints {
    pub year: RangeInclusive<i32>,
    pub bpm: RangeInclusive<u32>,
    pub key: Selection,
    pub mode: Selection,
    pub danceability: RangeInclusive<u8>,
    pub energy: RangeInclusive<u8>,
    pub valence: RangeInclusive<u8>,
}

impl Default for FilterConstraints {
    /// Matches every possible track.
    fn default() -> Self {
        Self {
            year: i32::MIN..=i32::MAX,
            bpm: 0..=u32::MAX,
            key: Selection::All,
            mode: Selection::All,
            danceability: 0..=100,
            energy: 0..=100,
            valence: 0..=100,
        }
    }
}

impl FilterConstraints {
    /// Initial controls for a freshly loaded table: full year and tempo
    /// spans, every key and mode, full percentage ranges.
    pub fn spanning(table: &TrackTable) -> Self {
        let mut constraints = Self::default();
        if let Some((lo, hi)) = table.year_bounds() {
            constraints.year = lo..=hi;
        }
        if let Some((lo, hi)) = table.bpm_bounds() {
            constraints.bpm = lo..=hi;
        }
        constraints
    }

    /// Whether a single track passes every constraint.
    pub fn matches(&self, track: &Track) -> bool {
        self.year.contains(&track.released_year)
            && self.bpm.contains(&track.bpm)
            && self.key.matches(track.key.as_deref())
            && self.mode.matches(track.mode.as_deref())
            && self.danceability.contains(&track.danceability)
            && self.energy.contains(&track.energy)
            && self.valence.contains(&track.valence)
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// The rows of a shared table that passed a [`FilterConstraints`], in table
/// order. Never mutates the table.
#[derive(Debug, Clone)]
pub struct FilteredView {
    table: Arc<TrackTable>,
    indices: Vec<usize>,
}

impl FilteredView {
    /// A view over every row.
    pub fn all(table: Arc<TrackTable>) -> Self {
        let indices = (0..table.len()).collect();
        Self { table, indices }
    }

    /// A view over every row of the same table, for baseline comparisons.
    pub fn unfiltered(&self) -> Self {
        Self::all(Arc::clone(&self.table))
    }

    pub fn table(&self) -> &TrackTable {
        &self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> + '_ {
        self.indices.iter().map(|&i| &self.table.tracks[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// The `EmptyResult` state: nothing matched.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Return indices of tracks that pass all constraints.
pub fn filtered_indices(table: &TrackTable, constraints: &FilterConstraints) -> Vec<usize> {
    table
        .tracks
        .iter()
        .enumerate()
        .filter(|(_, track)| constraints.matches(track))
        .map(|(i, _)| i)
        .collect()
}

/// Recompute the view from scratch for the given constraints.
pub fn apply(table: Arc<TrackTable>, constraints: &FilterConstraints) -> FilteredView {
    let indices = filtered_indices(&table, constraints);
    FilteredView { table, indices }
}
