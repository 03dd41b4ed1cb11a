//! # stackforge-renderer
//!
//! Tera-based renderer that turns a [`BuildRequest`](stackforge_core::BuildRequest)
//! into the shell command for one provisioning stage.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stackforge_core::{BuildRequest, Stage};
//! use stackforge_renderer::{templates, Artifact, CommandRenderer, CommandTemplate};
//!
//! fn init_command(request: &BuildRequest) -> Option<String> {
//!     let renderer = CommandRenderer::new().ok()?;
//!     let init = CommandTemplate::new(templates::INIT, &[Artifact::EnvFile, Artifact::CloudKey]);
//!     renderer.render(&init, Stage::Init, request).ok()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod shell;

pub use context::{Artifact, EnvEntry, GeneratedFile, StageContext};
pub use engine::{templates, CommandRenderer, CommandTemplate};
pub use error::RenderError;
pub use shell::shell_quote;
