//! Completion reporter and the user-facing prompts.

use std::fmt;

use serde::{Deserialize, Serialize};

use stackforge_core::BuildRequest;

/// Outcome status of a finished run. Only success exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

/// Terminal result: `{"status": "success", "project": "<name>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub status: Status,
    pub project: String,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Project '{}' deployed successfully.", self.project)
    }
}

/// Report the terminal stage for `request`.
pub fn complete(request: &BuildRequest) -> Completion {
    Completion {
        status: Status::Success,
        project: request.project_name().0.clone(),
    }
}

/// Why a prompt was returned instead of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PromptReason {
    MissingConfiguration,
    MissingCredential { platform: String },
}

/// A user-facing message returned while waiting for input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(flatten)]
    pub reason: PromptReason,
    pub message: String,
}

impl Prompt {
    pub fn missing_configuration() -> Self {
        Prompt {
            reason: PromptReason::MissingConfiguration,
            message: "StackForge is ready. Enter your project details and credentials, then start the build."
                .to_string(),
        }
    }

    pub fn missing_credential(platform: &str) -> Self {
        Prompt {
            reason: PromptReason::MissingCredential {
                platform: platform.to_string(),
            },
            message: format!(
                "The '{platform}' credential is not set. Add it to the build configuration and try again."
            ),
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn completion_wire_shape() {
        let request = BuildRequest::new("demo", None, BTreeMap::new());
        let json = serde_json::to_value(complete(&request)).expect("serialize");
        assert_eq!(json, serde_json::json!({"status": "success", "project": "demo"}));
    }

    #[test]
    fn prompt_flattens_reason() {
        let json = serde_json::to_value(Prompt::missing_credential("source_control")).unwrap();
        assert_eq!(json["reason"], "missing_credential");
        assert_eq!(json["platform"], "source_control");
        assert!(json["message"].as_str().unwrap().contains("source_control"));
    }
}
