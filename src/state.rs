use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::color::ColorMap;
use crate::config::Settings;
use crate::data::cache::DatasetCache;
use crate::data::dashboard::{Dashboard, DashboardParams, DashboardState};
use crate::data::export::export_file;
use crate::data::filter::{apply, FilterConstraints, FilteredView};
use crate::data::model::TrackTable;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    ArtistsAndTracks,
    Audio,
    Trends,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Overview, Tab::ArtistsAndTracks, Tab::Audio, Tab::Trends];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::ArtistsAndTracks => "Artists & Tracks",
            Tab::Audio => "Audio",
            Tab::Trends => "Trends",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    cache: DatasetCache,

    /// File the current table came from.
    pub dataset_path: Option<PathBuf>,

    /// Loaded table (None until a load succeeds, and again after a failed one).
    pub table: Option<Arc<TrackTable>>,

    /// Current control values.
    pub constraints: FilterConstraints,

    /// Top-N and artist splitting.
    pub params: DashboardParams,

    /// Rows passing the current constraints.
    pub view: Option<FilteredView>,

    /// Aggregates for `view`, rebuilt on every change.
    pub dashboard: Option<DashboardState>,

    /// Colours for artists in the top-tracks chart.
    pub artist_colors: Option<ColorMap>,

    pub tab: Tab,

    pub show_raw_data: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            params: settings.dashboard.clone(),
            settings,
            cache: DatasetCache::new(),
            dataset_path: None,
            table: None,
            constraints: FilterConstraints::default(),
            view: None,
            dashboard: None,
            artist_colors: None,
            tab: Tab::default(),
            show_raw_data: false,
            status_message: None,
        }
    }

    /// Load `path` (through the cache) and make it the current dataset.
    /// A failure ends the session: the previous table is dropped as well.
    pub fn open(&mut self, path: &Path) {
        match self.cache.get_or_load(path, &self.settings.load) {
            Ok(table) => {
                log::info!("Opened {} ({} tracks)", path.display(), table.len());
                self.dataset_path = Some(path.to_path_buf());
                self.set_dataset(table);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.dataset_path = None;
                self.table = None;
                self.view = None;
                self.dashboard = None;
                self.artist_colors = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Forget the cached copy of the current file and load it again.
    pub fn reload(&mut self) {
        if let Some(path) = self.dataset_path.clone() {
            self.cache.invalidate(&path);
            self.open(&path);
        }
    }

    /// Ingest a newly loaded table and reset the controls to span it.
    pub fn set_dataset(&mut self, table: Arc<TrackTable>) {
        self.constraints = FilterConstraints::spanning(&table);
        self.table = Some(table);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the view and every aggregate from scratch.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let view = apply(Arc::clone(table), &self.constraints);
        let dashboard = Dashboard::build(&view, &self.params);
        self.artist_colors = match &dashboard {
            DashboardState::Ready(d) => Some(ColorMap::new(
                d.top_tracks.iter().map(|t| t.artist_name.as_str()),
            )),
            DashboardState::EmptyResult => None,
        };
        self.view = Some(view);
        self.dashboard = Some(dashboard);
    }

    /// Apply new control values; recomputes only when something changed.
    pub fn set_constraints(&mut self, constraints: FilterConstraints) {
        if constraints != self.constraints {
            self.constraints = constraints;
            self.refilter();
        }
    }

    pub fn set_top_n(&mut self, top_n: usize) {
        if top_n != self.params.top_n {
            self.params.top_n = top_n;
            self.refilter();
        }
    }

    /// Write the current view to `path` (CSV, or JSON by extension).
    pub fn export(&mut self, path: &Path) {
        let Some(view) = &self.view else {
            return;
        };
        self.status_message = match export_file(view, path) {
            Ok(()) => Some(format!("Exported {} tracks to {}", view.len(), path.display())),
            Err(e) => {
                log::error!("Export failed: {e:#}");
                Some(format!("Error: {e}"))
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::Selection;
    use crate::data::fixtures;

    fn state_with_small_dataset() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");
        std::fs::write(&path, fixtures::SMALL_CSV).unwrap();
        let mut state = AppState::new(Settings::default());
        state.open(&path);
        (state, dir)
    }

    #[test]
    fn opening_builds_view_and_dashboard() {
        let (state, _dir) = state_with_small_dataset();
        assert_eq!(state.view.as_ref().map(FilteredView::len), Some(6));
        assert!(matches!(state.dashboard, Some(DashboardState::Ready(_))));
        assert_eq!(state.constraints.year, 1999..=2023);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn missing_file_halts_the_session() {
        let (mut state, dir) = state_with_small_dataset();
        state.open(&dir.path().join("missing.csv"));
        assert!(state.table.is_none());
        assert!(state.view.is_none());
        assert!(state.dashboard.is_none());
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("not found")));
    }

    #[test]
    fn constraint_change_recomputes() {
        let (mut state, _dir) = state_with_small_dataset();
        let mut constraints = state.constraints.clone();
        constraints.key = Selection::Only("G".to_string());
        state.set_constraints(constraints);
        assert_eq!(state.view.as_ref().map(FilteredView::len), Some(0));
        assert_eq!(state.dashboard, Some(DashboardState::EmptyResult));
        assert!(state.artist_colors.is_none());
    }

    #[test]
    fn export_reports_status() {
        let (mut state, dir) = state_with_small_dataset();
        let out = dir.path().join("out.csv");
        state.export(&out);
        assert!(out.exists());
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Exported 6 tracks")));
    }
}
