//! Error types for stackforge-orchestrator.

use thiserror::Error;

use stackforge_core::Stage;
use stackforge_renderer::RenderError;

/// Errors `advance` can return. Missing configuration and missing
/// credentials are not errors; they come back as prompts.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// An error from the rendering engine. The stage was not advanced.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// A non-terminal stage with no registry entry.
    #[error("stage {0} has no registry entry")]
    UnregisteredStage(Stage),
}
