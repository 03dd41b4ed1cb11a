//! Run history: the event log a run's collaborators append to.
//!
//! Events use the `{"action": ..., "args": {...}}` wire shape. The only event
//! the orchestrator reads is [`HistoryEvent::StartBuild`]; actions written by
//! other collaborators load as [`HistoryEvent::Other`] and are skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Inbound build-start record: project metadata plus per-platform credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStartRecord {
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_description: Option<String>,
    #[serde(default)]
    pub platform_credentials: BTreeMap<String, String>,
}

/// One entry of a run's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "args", rename_all = "snake_case")]
pub enum HistoryEvent {
    /// The user submitted a build configuration.
    StartBuild(BuildStartRecord),
    /// A user-facing message, e.g. a prompt returned by the orchestrator.
    Message { text: String },
    /// A command emitted for the external executor.
    Run { command: String },
    /// What the external executor reported back.
    CommandOutput {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
        #[serde(default)]
        output: String,
    },
    /// Any action this crate does not model, kept verbatim so a rewrite of
    /// the history file preserves it. Must stay the last variant.
    #[serde(untagged)]
    Other {
        action: String,
        #[serde(default)]
        args: serde_json::Value,
    },
}

impl HistoryEvent {
    /// Wire name of the event's action.
    pub fn action(&self) -> &str {
        match self {
            HistoryEvent::StartBuild(_) => "start_build",
            HistoryEvent::Message { .. } => "message",
            HistoryEvent::Run { .. } => "run",
            HistoryEvent::CommandOutput { .. } => "command_output",
            HistoryEvent::Other { action, .. } => action,
        }
    }
}

/// Read access to a run's history, oldest event first.
pub trait History {
    fn events(&self) -> &[HistoryEvent];

    /// The most recent build-start record, scanning newest to oldest.
    fn latest_build_start(&self) -> Option<&BuildStartRecord> {
        self.events().iter().rev().find_map(|event| match event {
            HistoryEvent::StartBuild(record) => Some(record),
            _ => None,
        })
    }
}

impl History for [HistoryEvent] {
    fn events(&self) -> &[HistoryEvent] {
        self
    }
}

impl History for Vec<HistoryEvent> {
    fn events(&self) -> &[HistoryEvent] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str) -> HistoryEvent {
        HistoryEvent::StartBuild(BuildStartRecord {
            project_name: name.to_string(),
            project_description: None,
            platform_credentials: BTreeMap::new(),
        })
    }

    #[test]
    fn wire_shape_is_action_and_args() {
        let json = serde_json::to_value(start("demo")).expect("serialize");
        assert_eq!(json["action"], "start_build");
        assert_eq!(json["args"]["project_name"], "demo");
    }

    #[test]
    fn latest_build_start_prefers_newest() {
        let history = vec![
            start("old"),
            HistoryEvent::Message { text: "hi".into() },
            start("new"),
            HistoryEvent::Run { command: "true".into() },
        ];
        assert_eq!(history.latest_build_start().unwrap().project_name, "new");
    }

    #[test]
    fn empty_history_has_no_build_start() {
        let history: Vec<HistoryEvent> = Vec::new();
        assert!(history.latest_build_start().is_none());
    }

    #[test]
    fn unknown_actions_are_kept_and_skipped() {
        let raw = r#"[
            {"action":"browse","args":{"url":"x"}},
            {"action":"start_build","args":{"project_name":"demo"}},
            {"action":"upload_file"}
        ]"#;
        let history: Vec<HistoryEvent> = serde_json::from_str(raw).expect("parse");

        assert_eq!(history.len(), 3);
        assert_eq!(history.latest_build_start().unwrap().project_name, "demo");
        assert_eq!(history[0].action(), "browse");
        assert_eq!(history[2].action(), "upload_file");

        let json = serde_json::to_value(&history[0]).expect("serialize");
        assert_eq!(json, serde_json::json!({"action": "browse", "args": {"url": "x"}}));
    }

    #[test]
    fn action_names_match_serde() {
        let events = [
            start("a"),
            HistoryEvent::Message { text: String::new() },
            HistoryEvent::Run { command: String::new() },
            HistoryEvent::CommandOutput { exit_code: Some(0), output: String::new() },
        ];
        for event in events {
            let json = serde_json::to_value(&event).expect("serialize");
            assert_eq!(json["action"], event.action());
        }
    }
}
