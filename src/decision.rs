//! JSON responses understood by Claude Code.

use anyhow::{Context, Result};
use serde::Serialize;

/// PreToolUse response: lets the hook allow or deny a pending tool call.
#[derive(Debug, Serialize)]
pub struct PreToolUseOutput {
    #[serde(rename = "hookSpecificOutput")]
    pub hook_specific_output: PreToolUseDecision,
}

#[derive(Debug, Serialize)]
pub struct PreToolUseDecision {
    #[serde(rename = "hookEventName")]
    pub hook_event_name: &'static str,
    /// "allow", "deny" or "ask"
    #[serde(rename = "permissionDecision")]
    pub permission_decision: &'static str,
    #[serde(rename = "permissionDecisionReason")]
    pub permission_decision_reason: String,
}

impl PreToolUseOutput {
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            hook_specific_output: PreToolUseDecision {
                hook_event_name: "PreToolUse",
                permission_decision: "deny",
                permission_decision_reason: reason.into(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize PreToolUse decision")
    }
}

/// PostToolUse response: `block` feeds the reason back to the assistant.
#[derive(Debug, Serialize)]
pub struct PostToolUseOutput {
    pub decision: &'static str,
    pub reason: String,
}

impl PostToolUseOutput {
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            decision: "block",
            reason: reason.into(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize PostToolUse decision")
    }
}
