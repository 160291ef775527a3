/// Data layer: listing types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///   vehicles_us.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  coerce cells → ListingTable (cached per file signature)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ ListingTable  │  Vec<Listing>, schema, filter domains
///   └──────────────┘
///        │   FilterSelection
///        ▼
///   ┌──────────┐
///   │  filter   │  apply predicates → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  medians, histograms, scatter + trend
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
pub mod summary;
