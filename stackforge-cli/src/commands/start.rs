//! `stackforge start <run> [--project <name>] [--credential platform=token]...`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use stackforge_core::{store, BuildStartRecord, HistoryEvent, RunId};

use super::home_dir;

/// Create a run and record its build configuration.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Run identifier (letters, digits, `-` and `_`).
    pub run: RunId,

    /// Project name; also the directory the commands create.
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// One-line project description.
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Platform credential as `platform=token`. Repeatable.
    #[arg(long = "credential", short = 'c', value_name = "PLATFORM=TOKEN", value_parser = parse_credential)]
    pub credentials: Vec<(String, String)>,

    /// JSON object of `{"platform": "token"}` pairs. `--credential` wins on conflict.
    #[arg(long, value_name = "FILE")]
    pub credentials_file: Option<PathBuf>,
}

impl StartArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let mut credentials = match &self.credentials_file {
            Some(path) => read_credentials_file(path)?,
            None => BTreeMap::new(),
        };
        credentials.extend(self.credentials);

        let run = store::create_run_at(&home, self.run.clone())
            .with_context(|| format!("failed to create run '{}'", self.run))?;

        let configured =
            self.project.is_some() || self.description.is_some() || !credentials.is_empty();
        if !configured {
            println!("✓ Created run '{}' (no build configuration yet)", run.run_id);
            println!("  Run: stackforge next {}", run.run_id);
            return Ok(());
        }

        let record = BuildStartRecord {
            project_name: self.project.unwrap_or_default(),
            project_description: self.description,
            platform_credentials: credentials,
        };
        let platforms: Vec<String> = record.platform_credentials.keys().cloned().collect();
        store::append_event_at(&home, &run.run_id, HistoryEvent::StartBuild(record))
            .with_context(|| format!("failed to record build start for '{}'", run.run_id))?;

        println!("✓ Created run '{}'", run.run_id);
        if !platforms.is_empty() {
            println!("  Credentials: {}", platforms.join(", "));
        }
        println!(
            "  Saved to: {}",
            store::run_path_at(&home, &run.run_id).display()
        );
        Ok(())
    }
}

fn parse_credential(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((platform, token)) if !platform.trim().is_empty() => {
            Ok((platform.trim().to_string(), token.to_string()))
        }
        _ => Err(format!("expected PLATFORM=TOKEN, got '{raw}'")),
    }
}

fn read_credentials_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read credentials file '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a JSON object of strings", path.display()))
}
