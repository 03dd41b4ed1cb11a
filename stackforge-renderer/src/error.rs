//! Error types for stackforge-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from command rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Deployment manifest could not be serialized.
    #[error("manifest serialization error: {0}")]
    Manifest(#[from] toml::ser::Error),

    /// Filesystem error while loading template overrides.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
