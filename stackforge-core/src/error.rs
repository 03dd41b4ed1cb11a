//! Error types for stackforge-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from core types and run persistence.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stage name outside the fixed chain. Never treated as finished.
    #[error("unknown stage '{0}'")]
    UnknownStage(String),

    /// Run ids double as file stems; only `[A-Za-z0-9_-]` is allowed.
    #[error("invalid run id '{0}': use letters, digits, '-' or '_'")]
    InvalidRunId(String),

    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error (history save path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Run file exists but could not be parsed (includes unknown stages).
    #[error("failed to parse run at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// History file exists but could not be parsed.
    #[error("failed to parse history at {path}: {source}")]
    HistoryParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// `dirs::home_dir()` returned `None`, so cannot locate `~/.stackforge/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("run not found at {path}")]
    RunNotFound { path: PathBuf },

    #[error("run already exists at {path}")]
    RunExists { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
