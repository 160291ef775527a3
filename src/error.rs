use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Data-layer errors
// ---------------------------------------------------------------------------

/// Whole-file failures of the listings loader.
///
/// Row-level problems (bad numbers, bad dates, missing columns) never show up
/// here; they are coerced to nulls while loading.
#[derive(Debug, Error)]
pub enum DataError {
    /// The data file does not exist or is not a regular file.
    #[error("data source not found: {}", path.display())]
    DataSourceNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV header row could not be read.
    #[error("invalid CSV header: {0}")]
    Csv(#[from] csv::Error),
}
