//! `stackforge status [<run>] [--json]`: where each run stands.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use stackforge_core::{store, RunId, RunState, Stage};

use super::home_dir;

/// Arguments for `stackforge status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Show a single run instead of all of them.
    pub run: Option<RunId>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let runs = match &self.run {
            Some(id) => vec![store::load_run_at(&home, id)
                .with_context(|| format!("failed to load run '{id}'"))?],
            None => store::list_runs_at(&home).context("failed to list runs")?,
        };

        let rows: Vec<RunStatusJson> = runs.iter().map(RunStatusJson::from).collect();
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(rows);
        Ok(())
    }
}

#[derive(Serialize)]
struct RunStatusJson {
    run: String,
    stage: Stage,
    position: usize,
    total: usize,
    project: Option<String>,
    finished: bool,
    updated_at: DateTime<Utc>,
}

impl From<&RunState> for RunStatusJson {
    fn from(run: &RunState) -> Self {
        RunStatusJson {
            run: run.run_id.to_string(),
            stage: run.stage,
            position: run.stage.position(),
            total: Stage::all().len() - 1,
            project: run
                .build_request
                .as_ref()
                .map(|request| request.project_name().0.clone()),
            finished: run.is_finished(),
            updated_at: run.updated_at,
        }
    }
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "run")]
    run: String,
    #[tabled(rename = "stage")]
    stage: String,
    #[tabled(rename = "progress")]
    progress: String,
    #[tabled(rename = "project")]
    project: String,
    #[tabled(rename = "updated")]
    updated: String,
}

fn print_table(rows: Vec<RunStatusJson>) {
    let finished = rows.iter().filter(|r| r.finished).count();
    println!(
        "StackForge v{} | {} runs | {} finished",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        finished,
    );

    if rows.is_empty() {
        println!("No runs stored.");
        println!("Run: stackforge start <run> --project <name>");
        return;
    }

    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| StatusTableRow {
            stage: stage_label(row.stage, row.finished),
            progress: if row.finished {
                "done".to_string()
            } else {
                format!("{}/{}", row.position.saturating_sub(1), row.total)
            },
            project: row.project.unwrap_or_else(|| "(not configured)".to_string()),
            updated: format_age(row.updated_at),
            run: row.run,
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn stage_label(stage: Stage, finished: bool) -> String {
    if finished {
        stage.to_string().green().bold().to_string()
    } else {
        stage.to_string().yellow().to_string()
    }
}

fn format_age(at: DateTime<Utc>) -> String {
    let secs = (Utc::now() - at).num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
