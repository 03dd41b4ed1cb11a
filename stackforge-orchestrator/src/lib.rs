//! StackForge orchestrator: the resumable stage machine that turns a build
//! request into one shell command per call.
//!
//! ```no_run
//! use stackforge_core::{HistoryEvent, RunId, RunState};
//! use stackforge_orchestrator::{Orchestrator, Step};
//!
//! let orchestrator = Orchestrator::new().unwrap();
//! let mut run = RunState::new(RunId::new("demo-run").unwrap());
//! let history: Vec<HistoryEvent> = Vec::new();
//! match orchestrator.advance(&mut run, &history).unwrap() {
//!     Step::Command(cmd) => println!("{}", cmd.script),
//!     Step::Prompt(prompt) => println!("{prompt}"),
//!     Step::Finished(done) => println!("{done}"),
//! }
//! ```

pub mod error;
pub mod orchestrator;
pub mod report;
pub mod stages;

pub use error::OrchestratorError;
pub use orchestrator::{Command, Orchestrator, Step};
pub use report::{Completion, Prompt, PromptReason, Status};
pub use stages::{StageDescriptor, STAGES};
