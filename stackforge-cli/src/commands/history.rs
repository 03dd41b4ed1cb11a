//! `stackforge history <run> [--json]`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use stackforge_core::{store, HistoryEvent, RunId};

use super::{home_dir, redact};

/// Print a run's history with every known credential masked.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Run identifier.
    pub run: RunId,

    /// Emit the events as JSON.
    #[arg(long)]
    pub json: bool,
}

impl HistoryArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let run = store::load_run_at(&home, &self.run)
            .with_context(|| format!("failed to load run '{}'", self.run))?;
        let history = store::load_history_at(&home, &self.run)
            .with_context(|| format!("failed to load history for '{}'", self.run))?;

        if self.json {
            let text = serde_json::to_string_pretty(&history)
                .context("failed to serialize history JSON")?;
            println!("{}", redact(&run, &history, &text));
            return Ok(());
        }

        if history.is_empty() {
            println!("No history for run '{}'.", run.run_id);
            return Ok(());
        }
        for (index, event) in history.iter().enumerate() {
            let line = redact(&run, &history, &describe(event));
            println!("{:>3} {:<15} {}", index + 1, event.action().bold(), line);
        }
        Ok(())
    }
}

fn describe(event: &HistoryEvent) -> String {
    match event {
        HistoryEvent::StartBuild(record) => {
            let platforms: Vec<&str> = record
                .platform_credentials
                .keys()
                .map(String::as_str)
                .collect();
            format!(
                "project '{}' [{}]",
                record.project_name,
                platforms.join(", ")
            )
        }
        HistoryEvent::Message { text } => text.clone(),
        HistoryEvent::Run { command } => first_line(command),
        HistoryEvent::CommandOutput { exit_code, output } => {
            let code = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
            format!("exit {code}: {}", first_line(output))
        }
        HistoryEvent::Other { args, .. } if args.is_null() => String::new(),
        HistoryEvent::Other { args, .. } => args.to_string(),
    }
}

fn first_line(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default().to_string();
    if lines.next().is_some() {
        format!("{first} …")
    } else {
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_commands_are_shortened() {
        assert_eq!(first_line("a &&\nb"), "a && …");
        assert_eq!(first_line("single"), "single");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn start_build_lists_platforms_not_tokens() {
        let record = stackforge_core::BuildStartRecord {
            project_name: "demo".into(),
            project_description: None,
            platform_credentials: [("infra".to_string(), "secret-token".to_string())].into(),
        };
        let line = describe(&HistoryEvent::StartBuild(record));
        assert_eq!(line, "project 'demo' [infra]");
    }

    #[test]
    fn foreign_actions_show_raw_args() {
        let event: HistoryEvent =
            serde_json::from_str(r#"{"action":"browse","args":{"url":"x"}}"#).unwrap();
        assert_eq!(describe(&event), r#"{"url":"x"}"#);
        let bare: HistoryEvent = serde_json::from_str(r#"{"action":"ping"}"#).unwrap();
        assert_eq!(describe(&bare), "");
    }
}
