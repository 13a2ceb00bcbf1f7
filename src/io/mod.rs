//! File input and output.

/// Window series CSV export.
pub mod export;
/// Hourly data CSV loader.
pub mod loader;
