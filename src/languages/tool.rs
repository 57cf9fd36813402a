use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

pub const TRUNCATION_NOTE: &str = "\n... (output truncated, use verbose mode to see all issues)";

/// Whether `name` resolves on `PATH`.
pub fn is_available(name: &str) -> bool {
    which::which(name).is_ok()
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    /// stdout followed by stderr.
    pub combined: String,
}

impl ToolOutput {
    pub fn trimmed(&self) -> &str {
        self.combined.trim()
    }
}

pub fn run_tool(program: &str, args: &[String], cwd: Option<&Path>) -> Result<ToolOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    tracing::debug!("Running: {} {}", program, args.join(" "));

    let output = cmd
        .output()
        .with_context(|| format!("Failed to run {}", program))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(ToolOutput {
        success: output.status.success(),
        combined,
    })
}

/// Cap tool output quoted back to the assistant at `limit` chars.
pub fn truncate_output(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_NOTE),
        None => text.to_string(),
    }
}

pub fn banner(language: &str, count: usize) {
    eprintln!("==========================================");
    eprintln!("Running {} hooks on {} file(s)", language, count);
    eprintln!("==========================================");
}

pub fn step(title: &str) {
    eprintln!("\n===== {} =====", title);
}

/// First `n` non-blank lines, indented, for a compact stderr summary.
pub fn preview_lines(text: &str, n: usize) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .take(n)
        .map(|l| format!("  {}", l))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_output() {
        assert_eq!(truncate_output("fine", 10), "fine");
    }

    #[test]
    fn truncate_appends_note() {
        let out = truncate_output("abcdefghij", 4);
        assert_eq!(out, format!("abcd{}", TRUNCATION_NOTE));
    }

    #[test]
    fn truncate_is_char_safe() {
        let out = truncate_output("ééé", 1);
        assert!(out.starts_with("é\n..."));
    }

    #[test]
    fn preview_skips_blank_lines() {
        let lines = preview_lines("a\n\n  \nb\nc\nd", 2);
        assert_eq!(lines, vec!["  a", "  b"]);
    }

    #[test]
    fn missing_program_is_unavailable() {
        assert!(!is_available("claude-hooks-test-no-such-tool"));
    }

    #[test]
    fn run_tool_combines_streams() {
        if !is_available("sh") {
            return;
        }
        let out = run_tool(
            "sh",
            &["-c".to_string(), "echo out; echo err >&2; exit 1".to_string()],
            None,
        )
        .unwrap();
        assert!(!out.success);
        assert_eq!(out.trimmed(), "out\nerr");
    }
}
