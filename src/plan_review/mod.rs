//! AI council review of a plan when the assistant leaves plan mode.
//!
//! The plan comes from the `ExitPlanMode` tool input or, failing that, from
//! the most plan-like assistant turn in the session transcript. Three
//! reviewer CLIs run concurrently; their combined report is returned to the
//! assistant as a PreToolUse deny so it gets a chance to revise the plan.

pub mod report;
pub mod reviewers;
pub mod scorer;
pub mod transcript;

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::decision::PreToolUseOutput;
use crate::hook_input::HookInput;
use report::{build_report, AggregatedReport};
use reviewers::{council, fan_out};
use transcript::{extract_plan_from_transcript, PlanError};

pub const PLAN_TOOL: &str = "ExitPlanMode";

const PREVIEW_CHARS: usize = 500;

const RESUBMIT_NOTE: &str = "📋 Please review the AI Council feedback above and adjust your plan if needed. Then call ExitPlanMode again to finalize.";

pub fn build_review_prompt(plan: &str) -> String {
    format!(
        "You are a senior software architect reviewing an implementation plan. \
Please review the following plan and provide constructive feedback.

Focus on:
1. **Potential issues or risks** - What could go wrong? What edge cases might be missed?
2. **Missing considerations** - Are there any important aspects not addressed?
3. **Better alternatives** - Are there simpler or more robust approaches?
4. **Security concerns** - Any potential vulnerabilities?
5. **Performance implications** - Will this scale well?

Be concise but thorough. If the plan looks solid, say so briefly and note any minor improvements.

## Plan to Review:

{plan}

## Your Review:"
    )
}

/// First `max_chars` characters of `s`, with `...` appended when cut.
pub fn truncate_for_display(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Plan text for this payload: the tool's own `plan` argument wins over a
/// transcript scan.
pub fn find_plan(input: &HookInput) -> Result<String, PlanError> {
    if let Some(plan) = input
        .tool_input
        .plan
        .as_deref()
        .filter(|p| !p.trim().is_empty())
    {
        tracing::debug!("Using plan from tool input");
        return Ok(plan.to_string());
    }

    match input.transcript_path.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => extract_plan_from_transcript(Path::new(path)),
        None => Err(PlanError::NotFound),
    }
}

pub fn review_plan(plan: &str, config: &Config) -> Result<AggregatedReport> {
    let prompt = build_review_prompt(plan);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime for reviewers")?;

    let outcomes = runtime.block_on(fan_out(council(&config.review), &prompt));
    Ok(build_report(outcomes))
}

/// Handle a PreToolUse payload for `ExitPlanMode`. Returns the process exit code.
pub fn run(input: Option<HookInput>, config: &Config, verbose: bool) -> Result<i32> {
    let Some(input) = input else {
        return Ok(0);
    };

    eprintln!("🧠 AI Council hook triggered!");
    eprintln!("   Tool: {}", input.tool_name());
    eprintln!("   Transcript: {}", input.transcript_path.as_deref().unwrap_or(""));
    eprintln!("   CWD: {}", input.cwd().unwrap_or(""));

    if input.tool_name() != PLAN_TOOL {
        eprintln!("⏭️  Skipping - not {} (got: {})", PLAN_TOOL, input.tool_name());
        return Ok(0);
    }

    let plan = match find_plan(&input) {
        Ok(plan) => plan,
        Err(e) => {
            // never block on a missing plan
            eprintln!("⚠️  Plan review error: failed to extract plan: {}", e);
            return Ok(0);
        }
    };

    if verbose {
        eprintln!(
            "🔍 Plan to review ({} chars):\n{}\n",
            plan.chars().count(),
            truncate_for_display(&plan, PREVIEW_CHARS)
        );
    }

    let report = match review_plan(&plan, config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("⚠️  Plan review error: {:#}", e);
            return Ok(0);
        }
    };

    tracing::info!(
        "{}/{} reviews completed",
        report.completed(),
        report.outcomes.len()
    );

    let reason = format!("{}\n\n{}", report.summary, RESUBMIT_NOTE);
    println!("{}", PreToolUseOutput::deny(reason).to_json()?);

    let rule = "=".repeat(60);
    eprintln!();
    eprintln!("{rule}");
    eprintln!("{}", report.summary);
    eprintln!("{rule}");

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_wraps_plan() {
        let prompt = build_review_prompt("1. do it\n2. ship it");
        assert!(prompt.starts_with("You are a senior software architect"));
        assert!(prompt.contains("**Security concerns**"));
        assert!(prompt.contains("## Plan to Review:\n\n1. do it\n2. ship it\n\n## Your Review:"));
        assert!(prompt.ends_with("## Your Review:"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_for_display("short", 10), "short");
        assert_eq!(truncate_for_display("abcdef", 3), "abc...");
        assert_eq!(truncate_for_display("ééééé", 2), "éé...");
        assert_eq!(truncate_for_display("exact", 5), "exact");
    }

    #[test]
    fn tool_input_plan_wins_over_transcript() {
        let input = HookInput::parse(
            r###"{"tool_name":"ExitPlanMode","tool_input":{"plan":"## Plan\n1. a\n2. b"},"transcript_path":"/nonexistent.jsonl"}"###,
        )
        .unwrap();
        assert_eq!(find_plan(&input).unwrap(), "## Plan\n1. a\n2. b");
    }

    #[test]
    fn blank_tool_input_plan_falls_back_to_transcript() {
        let input = HookInput::parse(
            r#"{"tool_name":"ExitPlanMode","tool_input":{"plan":"  "},"transcript_path":"/nonexistent/t.jsonl"}"#,
        )
        .unwrap();
        assert!(matches!(
            find_plan(&input),
            Err(PlanError::ReadTranscript { .. })
        ));
    }

    #[test]
    fn no_plan_source_is_not_found() {
        let input = HookInput::parse(r#"{"tool_name":"ExitPlanMode"}"#).unwrap();
        assert!(matches!(find_plan(&input), Err(PlanError::NotFound)));
    }

    #[test]
    fn other_tools_are_skipped() {
        let input = HookInput::parse(r#"{"tool_name":"Bash","tool_input":{"command":"ls"}}"#)
            .unwrap();
        assert_eq!(run(Some(input), &Config::default(), false).unwrap(), 0);
    }

    #[test]
    fn missing_plan_never_blocks() {
        let input = HookInput::parse(r#"{"tool_name":"ExitPlanMode"}"#).unwrap();
        assert_eq!(run(Some(input), &Config::default(), false).unwrap(), 0);
    }
}
