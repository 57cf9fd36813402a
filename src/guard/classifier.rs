use std::path::{Path, PathBuf};

use super::splitter::split_compound_command;
use crate::config::GuardConfig;
use crate::git::{self, WorkdirHints};

/// Read-only view of the repository a `git commit` would land in.
pub trait BranchProbe {
    /// Project directory the command targets, `None` when unknown.
    fn target_dir(&self) -> Option<PathBuf>;
    /// Checked-out branch, empty when detached or not a repository.
    fn current_branch(&self, dir: &Path) -> String;
}

/// Probe backed by the real `git` binary.
pub struct GitProbe {
    hints: WorkdirHints,
}

impl GitProbe {
    pub fn new(hints: WorkdirHints) -> Self {
        Self { hints }
    }
}

impl BranchProbe for GitProbe {
    fn target_dir(&self) -> Option<PathBuf> {
        git::target_working_directory(&self.hints)
    }

    fn current_branch(&self, dir: &Path) -> String {
        git::current_branch(dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialKind {
    DeniedExecutable { executable: String },
    ProtectedBranch { branch: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub kind: DenialKind,
    /// The offending piece of the compound command.
    pub sub_command: String,
    /// What to do instead, shown after the detection details.
    pub guidance: String,
    /// Message shown to the assistant.
    pub reason: String,
}

impl Denial {
    fn new(kind: DenialKind, full_command: &str, sub_command: &str) -> Self {
        let (headline, detected, guidance) = match &kind {
            DenialKind::DeniedExecutable { .. } => (
                "Database CLI commands are not allowed.".to_string(),
                "Detected database CLI command in",
                DENIED_EXECUTABLE_GUIDANCE.to_string(),
            ),
            DenialKind::ProtectedBranch { branch } => (
                format!("Direct commits to the '{branch}' branch are not allowed."),
                "Detected git commit command in",
                protected_branch_guidance(branch),
            ),
        };
        Self {
            reason: format!(
                "{headline} You attempted to run: {full_command}\n\n{detected}: {sub_command}\n\n{guidance}"
            ),
            kind,
            sub_command: sub_command.to_string(),
            guidance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(Denial),
}

/// Executable of a sub-command: first token, last path segment, lower-cased.
pub fn executable_name(sub_command: &str) -> Option<String> {
    let first = sub_command.split_whitespace().next()?;
    let base = first.rsplit('/').next().unwrap_or(first);
    if base.is_empty() {
        return None;
    }
    Some(base.to_lowercase())
}

/// Classify a full command line. Every sub-command is checked; the first
/// denial wins and stops the scan.
pub fn classify_command(command: &str, guard: &GuardConfig, probe: &dyn BranchProbe) -> Verdict {
    for sub in split_compound_command(command) {
        if let Verdict::Deny(denial) = classify_subcommand(sub, command, guard, probe) {
            return Verdict::Deny(denial);
        }
    }
    Verdict::Allow
}

pub fn classify_subcommand(
    sub_command: &str,
    full_command: &str,
    guard: &GuardConfig,
    probe: &dyn BranchProbe,
) -> Verdict {
    let Some(executable) = executable_name(sub_command) else {
        return Verdict::Allow;
    };

    if guard
        .denied_executables
        .iter()
        .any(|denied| denied.eq_ignore_ascii_case(&executable))
    {
        return Verdict::Deny(Denial::new(
            DenialKind::DeniedExecutable { executable },
            full_command,
            sub_command,
        ));
    }

    if executable == "git" && sub_command.split_whitespace().nth(1) == Some("commit") {
        tracing::debug!("Detected git commit command, checking branch protection");

        let Some(dir) = probe.target_dir() else {
            tracing::info!("Skipping branch protection check: cannot determine target project directory");
            return Verdict::Allow;
        };

        let branch = probe.current_branch(&dir);
        tracing::debug!("Checking if branch {:?} is protected", branch);

        if !branch.is_empty() && guard.protected_branches.iter().any(|p| *p == branch) {
            return Verdict::Deny(Denial::new(
                DenialKind::ProtectedBranch { branch },
                full_command,
                sub_command,
            ));
        }

        if branch.is_empty() {
            tracing::debug!("Not in a git repo or detached HEAD, allowing commit");
        } else {
            tracing::debug!("Branch {:?} is not protected, allowing commit", branch);
        }
    }

    Verdict::Allow
}

const DENIED_EXECUTABLE_GUIDANCE: &str = "Please use the project's database access code instead. \
The codebase already has database access configured.

Alternatives:
- Check existing code for database queries
- Look at the model definitions in the codebase
- Read the existing test files for schema information";

fn protected_branch_guidance(branch: &str) -> String {
    format!(
        "Please create a feature branch instead:\n\n\
         1. Create and switch to a new branch:\n   git checkout -b feature/your-feature-name\n\n\
         2. Make your commits on the feature branch:\n   git commit -m \"your commit message\"\n\n\
         3. Push the feature branch:\n   git push -u origin feature/your-feature-name\n\n\
         4. Create a pull request to merge into {branch}"
    )
}
