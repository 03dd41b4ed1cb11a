//! Render context: the serializable payload a stage template sees, built from
//! a [`BuildRequest`].

use std::collections::BTreeMap;

use serde::Serialize;

use stackforge_core::{platform, BuildRequest, Stage};

use crate::error::RenderError;

/// Repository owner used when no `source_control_owner` credential is given.
pub const DEFAULT_SOURCE_OWNER: &str = "stackforge-user";

/// Credential key naming the source-control account that owns the repository.
pub const SOURCE_CONTROL_OWNER: &str = "source_control_owner";

/// Build output directory recorded in the deployment manifest.
pub const BUILD_OUTPUT_DIR: &str = ".next";

/// Well-known credentials and the `.env` key each is written under.
const ENV_KEYS: &[(&str, &str)] = &[
    (platform::INFRA, "INFRA_API_TOKEN"),
    (platform::DATA_STORE, "DATA_STORE_ACCESS_TOKEN"),
    (platform::BILLING, "BILLING_API_KEY"),
    (platform::SOURCE_CONTROL, "SOURCE_CONTROL_TOKEN"),
    (SOURCE_CONTROL_OWNER, "SOURCE_CONTROL_OWNER"),
    (platform::CLOUD_PROJECT, "CLOUD_PROJECT_ID"),
];

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// A file an emitted command writes. Paths are relative to the project dir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    EnvFile,
    CloudKey,
    GitIgnore,
    DataStoreClient,
    HomePage,
    DeployManifest,
}

impl Artifact {
    pub fn path(&self) -> &'static str {
        match self {
            Artifact::EnvFile => ".env",
            Artifact::CloudKey => "cloud-key.json",
            Artifact::GitIgnore => ".gitignore",
            Artifact::DataStoreClient => "src/lib/datastore.ts",
            Artifact::HomePage => "src/app/page.tsx",
            Artifact::DeployManifest => "wrangler.toml",
        }
    }
}

/// One file's path and full content, as handed to a stage template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// One `KEY=VALUE` line of the project `.env`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
}

#[derive(Serialize)]
struct DeployManifest<'a> {
    name: &'a str,
    pages_build_output_dir: &'a str,
    vars: BTreeMap<&'a str, &'a str>,
}

// ---------------------------------------------------------------------------
// StageContext
// ---------------------------------------------------------------------------

/// Everything a stage template may reference. Values are raw; templates pass
/// them through the `shell_quote` filter.
#[derive(Debug, Clone, Serialize)]
pub struct StageContext {
    pub stage: String,
    pub stage_label: String,
    pub position: usize,
    pub total: usize,
    pub project_name: String,
    /// `./<project_name>`: never mistaken for an option or `cd -`.
    pub project_dir: String,
    pub project_description: String,
    pub cloud_project_id: String,
    pub remote_url: String,
    pub commit_message: String,
    pub deploy_url: String,
    pub env: Vec<EnvEntry>,
    /// Filled by the engine with the stage's artifacts.
    pub files: Vec<GeneratedFile>,
}

impl StageContext {
    /// Build the context for `stage` from `request`. `files` starts empty.
    pub fn new(stage: Stage, request: &BuildRequest) -> Self {
        let project_name = request.project_name().0.clone();
        let owner = match request.credential(SOURCE_CONTROL_OWNER).trim() {
            "" => DEFAULT_SOURCE_OWNER,
            owner => owner,
        };
        StageContext {
            stage: stage.as_str().to_string(),
            stage_label: stage.label().to_string(),
            position: stage.position(),
            total: Stage::all().len() - 1,
            project_dir: format!("./{project_name}"),
            project_description: request.description().to_string(),
            cloud_project_id: request.credential(platform::CLOUD_PROJECT).to_string(),
            remote_url: format!(
                "https://stackforge:{}@github.com/{}/{}.git",
                request.credential(platform::SOURCE_CONTROL),
                owner,
                project_name
            ),
            commit_message: format!("Initial commit from StackForge: {}", request.description()),
            deploy_url: format!("https://{project_name}.pages.dev"),
            env: env_entries(request),
            files: Vec::new(),
            project_name,
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

/// `.env` entries: project metadata, the well-known credentials (empty when
/// absent), then any other platforms sorted by key as `<KEY>_TOKEN`.
pub fn env_entries(request: &BuildRequest) -> Vec<EnvEntry> {
    let mut entries = vec![
        EnvEntry {
            key: "PROJECT_NAME".into(),
            value: request.project_name().0.clone(),
        },
        EnvEntry {
            key: "PROJECT_DESCRIPTION".into(),
            value: request.description().to_string(),
        },
    ];
    for (platform_key, env_key) in ENV_KEYS {
        entries.push(EnvEntry {
            key: (*env_key).to_string(),
            value: request.credential(platform_key).to_string(),
        });
    }
    entries.push(EnvEntry {
        key: "CLOUD_CREDENTIALS_FILE".into(),
        value: Artifact::CloudKey.path().to_string(),
    });
    for (platform_key, value) in request.platform_credentials() {
        let known = platform_key == platform::CLOUD_CREDENTIALS
            || ENV_KEYS.iter().any(|(k, _)| *k == platform_key.as_str());
        if known {
            continue;
        }
        entries.push(EnvEntry {
            key: format!("{}_TOKEN", env_key_for(platform_key)),
            value: value.clone(),
        });
    }
    entries
}

fn env_key_for(platform_key: &str) -> String {
    platform_key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

pub(crate) fn env_file_content(entries: &[EnvEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}={}\n", e.key, e.value))
        .collect()
}

pub(crate) fn cloud_key_content(request: &BuildRequest) -> String {
    match request.credential(platform::CLOUD_CREDENTIALS).trim() {
        "" => "{}\n".to_string(),
        blob => format!("{blob}\n"),
    }
}

pub(crate) fn manifest_content(request: &BuildRequest) -> Result<String, RenderError> {
    let name = request.project_name().0.as_str();
    let manifest = DeployManifest {
        name,
        pages_build_output_dir: BUILD_OUTPUT_DIR,
        vars: BTreeMap::from([
            ("PROJECT_NAME", name),
            ("PROJECT_DESCRIPTION", request.description()),
        ]),
    };
    Ok(toml::to_string(&manifest)?)
}
