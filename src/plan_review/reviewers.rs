//! External AI reviewer CLIs and the concurrent fan-out over them.

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time::timeout;

use crate::config::{ReviewConfig, ReviewerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewerKind {
    Claude,
    Codex,
    Gemini,
}

impl ReviewerKind {
    /// Report order.
    pub const ALL: [ReviewerKind; 3] = [
        ReviewerKind::Claude,
        ReviewerKind::Codex,
        ReviewerKind::Gemini,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ReviewerKind::Claude => "Claude",
            ReviewerKind::Codex => "Codex",
            ReviewerKind::Gemini => "Gemini",
        }
    }

    pub fn install_hint(self) -> &'static str {
        match self {
            ReviewerKind::Claude => "npm install -g @anthropic-ai/claude-code",
            ReviewerKind::Codex => "npm install -g @openai/codex",
            ReviewerKind::Gemini => "npm install -g @google/gemini-cli",
        }
    }

    /// Non-interactive flags for each CLI. The prompt is appended after these.
    pub fn default_args(self, model: &str) -> Vec<String> {
        let args: &[&str] = match self {
            ReviewerKind::Claude => &["--print", "--model", model, "--dangerously-skip-permissions"],
            ReviewerKind::Codex => &[
                "exec",
                "--model",
                model,
                "--dangerously-bypass-approvals-and-sandbox",
            ],
            ReviewerKind::Gemini => &["--yolo", "--model", model, "--output-format", "text"],
        };
        args.iter().map(|s| s.to_string()).collect()
    }
}

/// Everything needed to launch one reviewer.
#[derive(Debug, Clone)]
pub struct ReviewerSpec {
    pub kind: ReviewerKind,
    /// Display name, e.g. "Claude Opus 4.5".
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ReviewerSpec {
    pub fn from_config(kind: ReviewerKind, cfg: &ReviewerConfig) -> Self {
        let args = cfg
            .args
            .clone()
            .unwrap_or_else(|| kind.default_args(&cfg.model));
        Self {
            kind,
            name: cfg.name.clone(),
            program: cfg.program.clone(),
            args,
            timeout: cfg.timeout(),
        }
    }
}

/// The council, in report order.
pub fn council(review: &ReviewConfig) -> [ReviewerSpec; 3] {
    ReviewerKind::ALL.map(|kind| {
        let cfg = match kind {
            ReviewerKind::Claude => &review.claude,
            ReviewerKind::Codex => &review.codex,
            ReviewerKind::Gemini => &review.gemini,
        };
        ReviewerSpec::from_config(kind, cfg)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("{label} CLI not installed ({hint})")]
    NotInstalled { label: &'static str, hint: &'static str },

    #[error("{label} review timed out ({})", limit_text(.limit))]
    TimedOut { label: &'static str, limit: Duration },

    #[error("{label} review failed: {status} - {stderr}")]
    Failed {
        label: &'static str,
        status: String,
        stderr: String,
    },
}

impl ReviewError {
    /// Feedback text shown in place of a review.
    pub fn placeholder(&self) -> String {
        match self {
            ReviewError::NotInstalled { label, hint } => {
                format!("⚠️ {label} CLI not available - install with: {hint}")
            }
            ReviewError::TimedOut { label, .. } => format!("⚠️ {label} review timed out"),
            ReviewError::Failed { label, .. } => format!("⚠️ {label} review failed - see error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub reviewer: String,
    pub feedback: String,
    pub error: Option<ReviewError>,
    pub elapsed: Duration,
}

impl ReviewOutcome {
    fn finished(spec: &ReviewerSpec, result: Result<String, ReviewError>, elapsed: Duration) -> Self {
        match result {
            Ok(feedback) => Self {
                reviewer: spec.name.clone(),
                feedback,
                error: None,
                elapsed,
            },
            Err(err) => Self {
                reviewer: spec.name.clone(),
                feedback: err.placeholder(),
                error: Some(err),
                elapsed,
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Elapsed wall time rounded to whole seconds: `7s`, `1m5s`, `2m0s`.
pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs_f64().round() as u64;
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m{}s", secs / 60, secs % 60)
    }
}

/// Configured limit as shown in timeout errors: `60s`, `90s`, `2m`.
pub fn format_limit(d: Duration) -> String {
    let secs = d.as_secs();
    if secs > 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else if secs == 0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{secs}s")
    }
}

fn limit_text(limit: &Duration) -> String {
    format_limit(*limit)
}

/// Run one reviewer to completion or until its deadline. Never fails: every
/// problem is folded into the outcome.
pub async fn run_reviewer(spec: ReviewerSpec, prompt: Arc<str>) -> ReviewOutcome {
    let start = Instant::now();
    tracing::info!("🤖 Starting {} review...", spec.name);

    let result = invoke(&spec, &prompt).await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => tracing::info!("✅ {} review complete ({})", spec.name, format_elapsed(elapsed)),
        Err(e) => tracing::info!("❌ {} review error: {}", spec.name, e),
    }

    ReviewOutcome::finished(&spec, result, elapsed)
}

async fn invoke(spec: &ReviewerSpec, prompt: &str) -> Result<String, ReviewError> {
    let label = spec.kind.label();

    let child = Command::new(&spec.program)
        .args(&spec.args)
        .arg(prompt)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReviewError::NotInstalled {
                label,
                hint: spec.kind.install_hint(),
            })
        }
        Err(e) => {
            return Err(ReviewError::Failed {
                label,
                status: e.to_string(),
                stderr: String::new(),
            })
        }
    };

    // dropping the wait future on timeout drops the child, which kills it
    let output = match timeout(spec.timeout, child.wait_with_output()).await {
        Err(_) => {
            return Err(ReviewError::TimedOut {
                label,
                limit: spec.timeout,
            })
        }
        Ok(Err(e)) => {
            return Err(ReviewError::Failed {
                label,
                status: e.to_string(),
                stderr: String::new(),
            })
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        return Err(ReviewError::Failed {
            label,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Start every reviewer at once and wait for all of them. Outcomes come back
/// in the order of `specs`, whatever order the processes finish in.
pub async fn fan_out(specs: [ReviewerSpec; 3], prompt: &str) -> Vec<ReviewOutcome> {
    let prompt: Arc<str> = Arc::from(prompt);

    let started = Instant::now();
    let tasks = specs.map(|spec| {
        let task = tokio::spawn(run_reviewer(spec.clone(), Arc::clone(&prompt)));
        (spec, task)
    });

    let mut outcomes = Vec::with_capacity(tasks.len());
    for (spec, task) in tasks {
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(join_err) => ReviewOutcome::finished(
                &spec,
                Err(ReviewError::Failed {
                    label: spec.kind.label(),
                    status: "reviewer task aborted".to_string(),
                    stderr: join_err.to_string(),
                }),
                started.elapsed(),
            ),
        };
        outcomes.push(outcome);
    }
    outcomes
}
