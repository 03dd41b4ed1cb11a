pub mod history;
pub mod next;
pub mod stages;
pub mod start;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use stackforge_core::{BuildRequest, HistoryEvent, RunState};
use stackforge_orchestrator::Orchestrator;
use stackforge_renderer::CommandRenderer;

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

/// `<home>/.stackforge/templates/`: `.tera` files here replace the embedded
/// templates of the same relative name.
pub(crate) fn templates_dir_at(home: &Path) -> PathBuf {
    home.join(".stackforge").join("templates")
}

pub(crate) fn orchestrator_at(home: &Path) -> Result<Orchestrator> {
    let dir = templates_dir_at(home);
    let renderer = CommandRenderer::with_overrides(Some(&dir))
        .with_context(|| format!("failed to load templates from '{}'", dir.display()))?;
    Ok(Orchestrator::with_renderer(renderer))
}

/// Mask every credential known to the run or recorded in its history.
pub(crate) fn redact(run: &RunState, history: &[HistoryEvent], text: &str) -> String {
    let recorded = history.iter().filter_map(|event| match event {
        HistoryEvent::StartBuild(record) => Some(BuildRequest::from_record(record)),
        _ => None,
    });
    run.build_request
        .iter()
        .cloned()
        .chain(recorded)
        .fold(text.to_string(), |acc, request| request.redact(&acc))
}
