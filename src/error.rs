use std::path::PathBuf;
use thiserror::Error;

/// Errors the pipeline can return to callers.
///
/// Per-check problems never surface here; they are folded into the verdict
/// as failed checks. Only a missing input file and a filesystem failure
/// while routing are fatal.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The input path does not exist.
    #[error("image not found: {path}")]
    NotFound { path: PathBuf },

    /// Moving the image to its disposition directory failed.
    #[error("failed to route {path}: {source}")]
    Route {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
