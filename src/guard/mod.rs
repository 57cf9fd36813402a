//! Pre-execution gate for Bash tool calls.
//!
//! Splits the command line into sub-commands and denies database CLIs and
//! `git commit` on protected branches, wherever they appear in the chain.

pub mod classifier;
pub mod splitter;

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::decision::PreToolUseOutput;
use crate::git::WorkdirHints;
use crate::hook_input::HookInput;
use classifier::{classify_command, Denial, DenialKind, GitProbe, Verdict};

/// Handle a PreToolUse payload for the Bash tool. Returns the process exit code.
pub fn run(input: Option<HookInput>, config: &Config) -> Result<i32> {
    let Some(input) = input else {
        return Ok(0);
    };

    let tool = input.tool_name();
    if tool != "Bash" && tool != "bash" {
        tracing::info!("Tool {} is not Bash, allowing", tool);
        return Ok(0);
    }

    let command = input.command();
    if command.trim().is_empty() {
        tracing::info!("No command found in input, allowing");
        return Ok(0);
    }

    let probe = GitProbe::new(WorkdirHints::from_env(
        input.files(),
        input.cwd().map(str::to_string),
    ));

    match classify_command(command, &config.guard, &probe) {
        Verdict::Allow => {
            tracing::info!("Command '{}' is allowed", command);
            Ok(0)
        }
        Verdict::Deny(denial) => {
            println!("{}", PreToolUseOutput::deny(denial.reason.clone()).to_json()?);
            eprint!("{}", render_denial(&denial, command));
            Ok(0)
        }
    }
}

/// Human-readable explanation for the terminal.
fn render_denial(denial: &Denial, command: &str) -> String {
    let headline = match &denial.kind {
        DenialKind::DeniedExecutable { executable } => {
            format!("Database CLI commands are not allowed ({executable})")
        }
        DenialKind::ProtectedBranch { branch } => {
            format!("Direct commits to '{branch}' branch are not allowed")
        }
    };

    let mut out = String::new();
    out.push_str(&format!("{} {}\n\n", "❌ BLOCKED:".red().bold(), headline));
    out.push_str(&format!("You attempted to run: {command}\n"));
    out.push_str(&format!("Detected in: {}\n\n", denial.sub_command));
    out.push_str(&denial.guidance);
    out.push('\n');
    out
}
