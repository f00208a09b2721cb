/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐   cache: memoized per path, invalidated on mtime change
///   │  loader   │  parse → normalize columns → coerce → dedup → TrackTable
///   └──────────┘
///        │  Arc<TrackTable> (immutable)
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterConstraints → FilteredView (row indices)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  summaries, top-N, group-by means, correlation
///   └───────────┘   (dashboard: one pass over all of them; export: CSV / JSON)
/// ```

pub mod aggregate;
pub mod cache;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;

#[cfg(test)]
pub(crate) mod fixtures;
