/// Data layer: core types, loading, and polars-backed statistics.
///
/// Architecture:
/// ```text
///  bundled iris.csv / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse source → Dataset (species derived from target)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  polars DataFrame: null checks, drop, describe,
///   └──────────┘  group-by mean, cumulative sum
/// ```

pub mod loader;
pub mod model;
