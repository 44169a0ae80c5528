/// Data layer: event records, derived tables, and selections.
///
/// Architecture:
/// ```text
///  {dataset}/{event}[.parquet|.json]
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  resolve + decode record → RawEvent
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  event    │  hit / particle tables, edge join → Event
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  layer selection → hits / pairs to plot
///   └──────────┘
/// ```
///
/// `predictions` joins GNN output against the hit table the same way the
/// true edges are joined; `export` writes the tables back out as CSV.

pub mod event;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod predictions;
