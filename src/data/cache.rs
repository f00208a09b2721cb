use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::error::LoadError;
use super::loader::{load_file, LoadOptions};
use super::model::TrackTable;

struct Entry {
    modified: SystemTime,
    table: Arc<TrackTable>,
}

/// Memoizes [`load_file`] per (path, encoding). An entry is reused only
/// while the file's modification time is unchanged.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<(PathBuf, &'static str), Entry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it when absent or stale.
    pub fn get_or_load(
        &mut self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Arc<TrackTable>, LoadError> {
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|source| LoadError::DataUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        let key = (path.to_path_buf(), options.encoding.name());

        if let Some(entry) = self.entries.get(&key) {
            if entry.modified == modified {
                log::debug!("Dataset cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.table));
            }
            log::debug!("Dataset {} changed on disk, reloading", path.display());
        } else {
            log::debug!("Dataset cache miss for {}", path.display());
        }

        let table = Arc::new(load_file(path, options)?);
        self.entries.insert(
            key,
            Entry {
                modified,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Drop the entry for `path`, whatever its encoding.
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.retain(|(p, _), _| p != path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
