/// Data layer: core types, loading, and the signature library.
///
/// Architecture:
/// ```text
///  session .json / library .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Session (rasters, signatures, results)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  RasterElement, Signature, MatchResult
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ library   │  signatures resampled to raster bands (cached)
///   └──────────┘
/// ```

pub mod library;
pub mod loader;
pub mod model;
