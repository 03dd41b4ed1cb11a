//! Tera command engine: [`CommandTemplate`] and [`CommandRenderer`].
//!
//! # Stage templates
//!
//! | Stage                  | Template                               | Writes                                   |
//! |------------------------|----------------------------------------|------------------------------------------|
//! | `INIT`                 | `stages/init.sh.tera`                  | `.env`, `cloud-key.json`                 |
//! | `PROVISION_INFRA`      | `stages/provision_infra.sh.tera`       |                                          |
//! | `PROVISION_DATA_STORE` | `stages/provision_data_store.sh.tera`  |                                          |
//! | `PROVISION_BILLING`    | `stages/provision_billing.sh.tera`     |                                          |
//! | `GENERATE_CODE`        | `stages/generate_code.sh.tera`         | scaffold, `.gitignore`, `wrangler.toml`  |
//! | `PUBLISH_SOURCE`       | `stages/publish_source.sh.tera`        |                                          |
//! | `DEPLOY`               | `stages/deploy.sh.tera`                |                                          |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use stackforge_core::{BuildRequest, Stage};

use crate::context::{
    cloud_key_content, env_file_content, manifest_content, Artifact, GeneratedFile, StageContext,
};
use crate::error::RenderError;
use crate::shell::shell_quote_filter;

/// Embedded template names, as referenced by stage descriptors.
pub mod templates {
    pub const INIT: &str = "stages/init.sh.tera";
    pub const PROVISION_INFRA: &str = "stages/provision_infra.sh.tera";
    pub const PROVISION_DATA_STORE: &str = "stages/provision_data_store.sh.tera";
    pub const PROVISION_BILLING: &str = "stages/provision_billing.sh.tera";
    pub const GENERATE_CODE: &str = "stages/generate_code.sh.tera";
    pub const PUBLISH_SOURCE: &str = "stages/publish_source.sh.tera";
    pub const DEPLOY: &str = "stages/deploy.sh.tera";
}

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    (templates::INIT, include_str!("templates/stages/init.sh.tera")),
    (
        templates::PROVISION_INFRA,
        include_str!("templates/stages/provision_infra.sh.tera"),
    ),
    (
        templates::PROVISION_DATA_STORE,
        include_str!("templates/stages/provision_data_store.sh.tera"),
    ),
    (
        templates::PROVISION_BILLING,
        include_str!("templates/stages/provision_billing.sh.tera"),
    ),
    (
        templates::GENERATE_CODE,
        include_str!("templates/stages/generate_code.sh.tera"),
    ),
    (
        templates::PUBLISH_SOURCE,
        include_str!("templates/stages/publish_source.sh.tera"),
    ),
    (templates::DEPLOY, include_str!("templates/stages/deploy.sh.tera")),
    ("scaffold/gitignore.tera", include_str!("templates/scaffold/gitignore.tera")),
    (
        "scaffold/datastore.ts.tera",
        include_str!("templates/scaffold/datastore.ts.tera"),
    ),
    ("scaffold/page.tsx.tera", include_str!("templates/scaffold/page.tsx.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_overrides(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    files.sort();
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        tracing::debug!(template = %name, "loaded template override");
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(override_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert((*name).to_string(), (*content).to_string());
    }
    if let Some(dir) = override_dir {
        for (name, content) in load_overrides(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.register_filter("shell_quote", shell_quote_filter);
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// CommandTemplate
// ---------------------------------------------------------------------------

/// A stage's command: the template that renders it and the files it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTemplate {
    pub name: &'static str,
    pub artifacts: &'static [Artifact],
}

impl CommandTemplate {
    pub const fn new(name: &'static str, artifacts: &'static [Artifact]) -> Self {
        Self { name, artifacts }
    }
}

// ---------------------------------------------------------------------------
// CommandRenderer
// ---------------------------------------------------------------------------

/// Renders stage commands. Create once and reuse; rendering is read-only, so
/// one renderer can serve any number of independent runs.
pub struct CommandRenderer {
    tera: Tera,
}

impl CommandRenderer {
    /// Construct a renderer with the embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_overrides(None)
    }

    /// Construct a renderer, letting `.tera` files under `override_dir`
    /// replace embedded templates of the same relative name.
    pub fn with_overrides(override_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(CommandRenderer {
            tera: build_tera(override_dir)?,
        })
    }

    /// Names of every registered template, sorted.
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    /// Render `template` for `stage` against `request`.
    ///
    /// Output is a POSIX shell script. Every interpolated value has passed
    /// through `shell_quote`; line endings are LF and trailing whitespace is
    /// trimmed. The result depends only on the arguments.
    pub fn render(
        &self,
        template: &CommandTemplate,
        stage: Stage,
        request: &BuildRequest,
    ) -> Result<String, RenderError> {
        let mut ctx = StageContext::new(stage, request);
        ctx.files = self.artifacts(template.artifacts, &ctx, request)?;
        let tera_ctx = ctx.to_tera_context()?;
        let rendered = self.tera.render(template.name, &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n").trim_end().to_string())
    }

    fn artifacts(
        &self,
        artifacts: &[Artifact],
        ctx: &StageContext,
        request: &BuildRequest,
    ) -> Result<Vec<GeneratedFile>, RenderError> {
        if artifacts.is_empty() {
            return Ok(Vec::new());
        }
        let tera_ctx = ctx.to_tera_context()?;
        let mut files = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let content = match artifact {
                Artifact::EnvFile => env_file_content(&ctx.env),
                Artifact::CloudKey => cloud_key_content(request),
                Artifact::DeployManifest => manifest_content(request)?,
                Artifact::GitIgnore => self.tera.render("scaffold/gitignore.tera", &tera_ctx)?,
                Artifact::DataStoreClient => {
                    self.tera.render("scaffold/datastore.ts.tera", &tera_ctx)?
                }
                Artifact::HomePage => self.tera.render("scaffold/page.tsx.tera", &tera_ctx)?,
            };
            files.push(GeneratedFile {
                path: artifact.path().to_string(),
                content: content.replace("\r\n", "\n"),
            });
        }
        Ok(files)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
