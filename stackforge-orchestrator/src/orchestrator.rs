//! The run state machine.
//!
//! [`Orchestrator::advance`] is the single entry point: resolve the run's
//! configuration, look up the current stage, emit its command and move the
//! run to the successor. Nothing here performs I/O; the emitted command is
//! executed (or not) by the caller.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use stackforge_core::{resolve_config, BuildRequest, History, RunState, Stage};
use stackforge_renderer::CommandRenderer;

use crate::error::OrchestratorError;
use crate::report::{self, Completion, Prompt};
use crate::stages;

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// A command for the external executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// The stage that emitted this command.
    pub stage: Stage,
    /// POSIX shell script.
    pub script: String,
}

impl Command {
    /// Program and arguments for executors that spawn directly.
    pub fn argv(&self) -> [&str; 3] {
        ["sh", "-c", self.script.as_str()]
    }

    pub fn as_str(&self) -> &str {
        &self.script
    }
}

/// What one `advance` call produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Run this, then call `advance` again.
    Command(Command),
    /// Waiting on the user; the stage did not move.
    Prompt(Prompt),
    /// The run is complete.
    Finished(Completion),
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Stateless driver over [`stages::STAGES`]. All run state lives in the
/// [`RunState`] passed to each call, so one orchestrator serves any number
/// of independent runs.
pub struct Orchestrator {
    renderer: CommandRenderer,
}

impl Orchestrator {
    /// Orchestrator over the embedded command templates.
    pub fn new() -> Result<Self, OrchestratorError> {
        Ok(Self::with_renderer(CommandRenderer::new()?))
    }

    pub fn with_renderer(renderer: CommandRenderer) -> Self {
        Orchestrator { renderer }
    }

    /// Advance `run` by one stage.
    ///
    /// - No resolvable configuration: [`Step::Prompt`], stage unchanged.
    /// - A required credential is blank: [`Step::Prompt`], stage unchanged.
    /// - `FINISHED`: [`Step::Finished`], nothing emitted.
    /// - Otherwise: [`Step::Command`] and `run.stage` moves to the successor.
    ///
    /// On error the stage is left unchanged.
    pub fn advance<H>(&self, run: &mut RunState, history: &H) -> Result<Step, OrchestratorError>
    where
        H: History + ?Sized,
    {
        let stage = run.stage;
        let run_id = run.run_id.clone();
        let Some(request) = resolve_config(run, history) else {
            warn!(run = %run_id, %stage, "no build configuration yet");
            return Ok(Step::Prompt(Prompt::missing_configuration()));
        };

        let (step, next) = self.transition(stage, request)?;
        if let Some(next) = next {
            info!(run = %run_id, from = %stage, to = %next, "stage advanced");
            run.stage = next;
        }
        Ok(step)
    }

    /// The step for `stage` given `request`, and the stage to move to.
    ///
    /// Pure: the same inputs always produce the same output.
    pub fn transition(
        &self,
        stage: Stage,
        request: &BuildRequest,
    ) -> Result<(Step, Option<Stage>), OrchestratorError> {
        if stage.is_terminal() {
            debug!(project = %request.project_name(), "run already finished");
            return Ok((Step::Finished(report::complete(request)), None));
        }
        let descriptor = stages::lookup(stage).ok_or(OrchestratorError::UnregisteredStage(stage))?;
        debug!(%stage, template = descriptor.command.name, "stage lookup");

        if let Some(platform) = descriptor.requires {
            if !request.has_credential(platform) {
                warn!(%stage, platform, "required credential missing");
                return Ok((Step::Prompt(Prompt::missing_credential(platform)), None));
            }
        }

        let script = self.renderer.render(&descriptor.command, stage, request)?;
        trace!(%stage, command = %request.redact(&script), "rendered command");
        Ok((
            Step::Command(Command { stage, script }),
            Some(descriptor.successor),
        ))
    }
}
