use super::aggregate::{
    bpm_histogram, correlation_matrix, feature_means, group_counts, group_means, summary,
    title_word_counts, top_artists, top_tracks, CorrelationMatrix, GroupBy, GroupKey, GroupMean,
    HistogramBin, RankBy, Ranked, Summary,
};
use super::filter::FilteredView;
use super::model::{NumericField, Track};

const TOP_TRACKS: usize = 10;
const SCATTER_TRACKS: usize = 100;
const BPM_BINS: usize = 30;
const TITLE_WORDS: usize = 25;

/// Knobs for a dashboard pass that are not filter constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardParams {
    pub top_n: usize,
    pub artist_delimiter: String,
}

impl Default for DashboardParams {
    fn default() -> Self {
        Self {
            top_n: 15,
            artist_delimiter: ",".to_string(),
        }
    }
}

/// The handful of track fields the charts need.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStat {
    pub track_name: String,
    pub artist_name: String,
    pub streams: u64,
    pub danceability: u8,
}

impl From<&Track> for TrackStat {
    fn from(track: &Track) -> Self {
        Self {
            track_name: track.track_name.clone(),
            artist_name: track.artist_name.clone(),
            streams: track.streams,
            danceability: track.danceability,
        }
    }
}

/// Every aggregate the dashboard renders, for one filtered view.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub summary: Summary,
    pub artists_by_tracks: Vec<Ranked>,
    pub artists_by_streams: Vec<Ranked>,
    pub top_tracks: Vec<TrackStat>,
    pub most_streamed: Vec<TrackStat>,
    pub title_words: Vec<Ranked>,
    pub key_mode_counts: Vec<(GroupKey, usize)>,
    pub bpm_histogram: Vec<HistogramBin>,
    pub feature_profile: Vec<(NumericField, f64)>,
    pub overall_profile: Vec<(NumericField, f64)>,
    pub correlation: CorrelationMatrix,
    pub tracks_per_year: Vec<(GroupKey, usize)>,
    pub tracks_per_month: Vec<(GroupKey, usize)>,
    pub decade_features: Vec<GroupMean>,
    pub bpm_by_year: Vec<GroupMean>,
}

/// Outcome of one filter-and-aggregate pass.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    /// Nothing matched; no aggregate was computed.
    EmptyResult,
    Ready(Box<Dashboard>),
}

impl Dashboard {
    /// Compute everything from scratch for `view`.
    pub fn build(view: &FilteredView, params: &DashboardParams) -> DashboardState {
        if view.is_empty() {
            return DashboardState::EmptyResult;
        }
        let delimiter = params.artist_delimiter.as_str();

        let dashboard = Dashboard {
            summary: summary(view, delimiter),
            artists_by_tracks: top_artists(view, RankBy::Tracks, params.top_n, delimiter),
            artists_by_streams: top_artists(view, RankBy::Streams, params.top_n, delimiter),
            top_tracks: top_tracks(view, TOP_TRACKS).into_iter().map(TrackStat::from).collect(),
            most_streamed: top_tracks(view, SCATTER_TRACKS)
                .into_iter()
                .map(TrackStat::from)
                .collect(),
            title_words: title_word_counts(view, TITLE_WORDS),
            key_mode_counts: group_counts(view, GroupBy::KeyMode),
            bpm_histogram: bpm_histogram(view, BPM_BINS),
            feature_profile: feature_means(view),
            overall_profile: feature_means(&view.unfiltered()),
            correlation: correlation_matrix(view),
            tracks_per_year: group_counts(view, GroupBy::Year),
            tracks_per_month: group_counts(view, GroupBy::Month),
            decade_features: group_means(view, GroupBy::Decade, &NumericField::AUDIO_FEATURES),
            bpm_by_year: group_means(view, GroupBy::Year, &[NumericField::Bpm]),
        };
        log::debug!(
            "Dashboard for {} tracks ({} artists)",
            dashboard.summary.tracks,
            dashboard.summary.artists
        );
        DashboardState::Ready(Box::new(dashboard))
    }
}
