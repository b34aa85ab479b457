/// Data layer: core types, loading, caching, filtering and summaries.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SalesTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  one Arc<SalesTable> per process, explicit reload
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  (store, dept) equality → FilteredSeries, date ascending
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  summary  │  total / mean / distinct weeks
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
