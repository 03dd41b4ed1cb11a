//! `stackforge next <run> [--json] [--exec]`

use std::path::Path;
use std::process::Command as Process;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use stackforge_core::{store, HistoryEvent, RunId, RunState};
use stackforge_orchestrator::{Command, Step};

use super::{home_dir, orchestrator_at, redact};

/// Advance a run by one stage.
#[derive(Args, Debug)]
pub struct NextArgs {
    /// Run identifier.
    pub run: RunId,

    /// Emit the step as JSON.
    #[arg(long)]
    pub json: bool,

    /// Execute the emitted command with `sh -c` and record its output.
    #[arg(long)]
    pub exec: bool,
}

#[derive(Debug, Serialize)]
struct Execution {
    exit_code: Option<i32>,
    output: String,
}

#[derive(Serialize)]
struct NextJson<'a> {
    run: &'a RunId,
    #[serde(flatten)]
    step: &'a Step,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution: Option<&'a Execution>,
}

impl NextArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let mut run = store::load_run_at(&home, &self.run)
            .with_context(|| format!("failed to load run '{}'", self.run))?;
        let history = store::load_history_at(&home, &self.run)
            .with_context(|| format!("failed to load history for '{}'", self.run))?;

        let orchestrator = orchestrator_at(&home)?;
        let step = orchestrator
            .advance(&mut run, &history)
            .with_context(|| format!("failed to advance run '{}'", self.run))?;
        store::save_run_at(&home, &mut run)
            .with_context(|| format!("failed to save run '{}'", self.run))?;

        let execution = match &step {
            Step::Command(cmd) => {
                record(&home, &run, HistoryEvent::Run { command: cmd.script.clone() })?;
                if self.exec {
                    let execution = execute(cmd)?;
                    record(
                        &home,
                        &run,
                        HistoryEvent::CommandOutput {
                            exit_code: execution.exit_code,
                            output: execution.output.clone(),
                        },
                    )?;
                    Some(execution)
                } else {
                    None
                }
            }
            Step::Prompt(prompt) => {
                record(&home, &run, HistoryEvent::Message { text: prompt.message.clone() })?;
                None
            }
            Step::Finished(_) => None,
        };

        if self.json {
            let payload = NextJson {
                run: &run.run_id,
                step: &step,
                execution: execution.as_ref(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize step JSON")?
            );
        } else {
            print_step(&run, &history, &step, execution.as_ref());
        }

        match execution {
            Some(Execution { exit_code: Some(0), .. }) | None => Ok(()),
            Some(Execution { exit_code, .. }) => match exit_code {
                Some(code) => bail!("command exited with status {code}"),
                None => bail!("command terminated by signal"),
            },
        }
    }
}

fn record(home: &Path, run: &RunState, event: HistoryEvent) -> Result<()> {
    let action = event.action().to_string();
    store::append_event_at(home, &run.run_id, event)
        .with_context(|| format!("failed to append '{action}' to history of '{}'", run.run_id))
}

fn execute(cmd: &Command) -> Result<Execution> {
    let [program, flag, script] = cmd.argv();
    tracing::debug!(stage = %cmd.stage, "executing command");
    let out = Process::new(program)
        .arg(flag)
        .arg(script)
        .output()
        .with_context(|| format!("failed to spawn '{program}' for stage {}", cmd.stage))?;
    let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&out.stderr));
    Ok(Execution {
        exit_code: out.status.code(),
        output,
    })
}

fn print_step(
    run: &RunState,
    history: &[HistoryEvent],
    step: &Step,
    execution: Option<&Execution>,
) {
    match step {
        Step::Command(cmd) => {
            println!(
                "{} [{}/{}] {}",
                "▶".cyan().bold(),
                cmd.stage.position(),
                stackforge_core::Stage::all().len() - 1,
                cmd.stage.label().bold()
            );
            println!("{}", cmd.script);
            if let Some(execution) = execution {
                let status = match execution.exit_code {
                    Some(0) => "✓ ok".green().to_string(),
                    Some(code) => format!("✗ exit {code}").red().to_string(),
                    None => "✗ killed".red().to_string(),
                };
                println!("{status}");
                let output = redact(run, history, execution.output.trim_end());
                if !output.is_empty() {
                    println!("{}", output.bright_black());
                }
            } else {
                println!("Next stage: {}", run.stage);
            }
        }
        Step::Prompt(prompt) => println!("{} {prompt}", "?".yellow().bold()),
        Step::Finished(done) => println!("{} {done}", "✓".green().bold()),
    }
}
