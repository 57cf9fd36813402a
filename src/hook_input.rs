//! Hook payload read from stdin.
//!
//! Claude Code sends one JSON object per invocation. Every field is optional
//! so that a single type covers PreToolUse, PostToolUse and SessionStart.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::{IsTerminal, Read};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_paths: Vec<String>,
    /// Bash command about to run.
    #[serde(default)]
    pub command: Option<String>,
    /// Write tool content.
    #[serde(default)]
    pub content: Option<String>,
    /// ExitPlanMode plan body.
    #[serde(default)]
    pub plan: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: ToolInput,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub permission_mode: Option<String>,
    #[serde(default)]
    pub hook_event_name: Option<String>,
}

impl HookInput {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse hook payload")
    }

    pub fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    pub fn command(&self) -> &str {
        self.tool_input.command.as_deref().unwrap_or("")
    }

    pub fn cwd(&self) -> Option<&str> {
        self.cwd.as_deref().filter(|c| !c.is_empty())
    }

    /// Edited files, de-duplicated, with vendored and generated sources removed.
    pub fn files(&self) -> Vec<String> {
        collect_files(&self.tool_input)
    }
}

/// Read the raw payload from stdin. A terminal stdin yields `None` so that
/// manual runs with positional files do not block waiting for input.
pub fn read_stdin() -> Option<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }
    let mut raw = String::new();
    match stdin.read_to_string(&mut raw) {
        Ok(_) if !raw.trim().is_empty() => Some(raw),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(%e, "failed to read stdin");
            None
        }
    }
}

/// Parse stdin into a payload. Malformed or missing input is "nothing to do".
pub fn read_payload() -> Option<HookInput> {
    let raw = read_stdin()?;
    match HookInput::parse(&raw) {
        Ok(input) => Some(input),
        Err(e) => {
            tracing::info!("No usable hook payload: {:#}", e);
            None
        }
    }
}

pub fn collect_files(input: &ToolInput) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    input
        .file_path
        .iter()
        .chain(input.file_paths.iter())
        .filter(|f| !f.is_empty())
        .filter(|f| seen.insert(f.to_string()))
        .filter(|f| !is_excluded(f))
        .cloned()
        .collect()
}

fn is_excluded(path: &str) -> bool {
    path.contains("/vendor/") || path.ends_with(".pb.go") || path.ends_with(".gen.go")
}
