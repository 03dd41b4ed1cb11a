//! `stackforge stages`: the stage registry as a table.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use stackforge_core::Stage;
use stackforge_orchestrator::stages;

/// Arguments for `stackforge stages`.
#[derive(Args, Debug)]
pub struct StagesArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Tabled)]
struct StageRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "stage")]
    stage: String,
    #[tabled(rename = "description")]
    label: String,
    #[tabled(rename = "requires")]
    requires: String,
    #[tabled(rename = "next")]
    next: String,
}

impl StagesArgs {
    pub fn run(self) -> Result<()> {
        let rows: Vec<StageRow> = stages::chain().into_iter().map(row).collect();
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize stages JSON")?
            );
            return Ok(());
        }
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn row(stage: Stage) -> StageRow {
    let descriptor = stages::lookup(stage);
    StageRow {
        position: stage.position(),
        stage: stage.to_string(),
        label: stage.label().to_string(),
        requires: descriptor
            .and_then(|d| d.requires)
            .unwrap_or("-")
            .to_string(),
        next: descriptor
            .map(|d| d.successor.to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}
