use std::path::{Path, PathBuf};
use std::process::Command;

/// Env var Claude Code sets to the project directory of the session.
pub const CLAUDE_CWD_ENV: &str = "CLAUDE_CODE_CWD";

/// Current branch of the repository at `dir`, or an empty string when not in a
/// repo, on a detached HEAD, or when git fails.
pub fn current_branch(dir: &Path) -> String {
    tracing::debug!("Detecting git branch in directory: {}", dir.display());

    let branch = match git_stdout(dir, &["branch", "--show-current"]) {
        Some(out) => out,
        None => {
            tracing::debug!("git branch --show-current failed, trying rev-parse fallback");
            match git_stdout(dir, &["rev-parse", "--abbrev-ref", "HEAD"]) {
                Some(out) => out,
                None => {
                    tracing::debug!("Fallback also failed, not in a git repo");
                    return String::new();
                }
            }
        }
    };

    if branch == "HEAD" {
        tracing::debug!("Detected detached HEAD state");
        return String::new();
    }

    tracing::debug!("Current branch: {:?}", branch);
    branch
}

fn git_stdout(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Nearest ancestor of `file_path` containing a `.git` entry.
pub fn find_git_root(file_path: &Path) -> Option<PathBuf> {
    let mut dir = file_path.parent()?;

    loop {
        if dir.join(".git").exists() {
            tracing::debug!("Found git root at: {}", dir.display());
            return Some(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }

    tracing::debug!("No git root found for file: {}", file_path.display());
    None
}

/// Inputs used to work out which project a `git commit` is aimed at.
#[derive(Debug, Clone, Default)]
pub struct WorkdirHints {
    pub env_cwd: Option<String>,
    pub files: Vec<String>,
    pub payload_cwd: Option<String>,
    pub process_cwd: Option<PathBuf>,
}

impl WorkdirHints {
    pub fn from_env(files: Vec<String>, payload_cwd: Option<String>) -> Self {
        Self {
            env_cwd: std::env::var(CLAUDE_CWD_ENV).ok(),
            files,
            payload_cwd,
            process_cwd: std::env::current_dir().ok(),
        }
    }
}

/// Resolve the target project directory. `None` means we cannot tell with
/// confidence, and callers must not enforce branch rules.
pub fn target_working_directory(hints: &WorkdirHints) -> Option<PathBuf> {
    if let Some(dir) = hints.env_cwd.as_deref().filter(|d| !d.is_empty()) {
        tracing::debug!("Using working directory from {}: {}", CLAUDE_CWD_ENV, dir);
        return Some(PathBuf::from(dir));
    }

    for file in &hints.files {
        if let Some(root) = find_git_root(Path::new(file)) {
            tracing::debug!("Inferred working directory from file path: {}", root.display());
            return Some(root);
        }
    }

    if let Some(dir) = hints.payload_cwd.as_deref().filter(|d| !d.is_empty()) {
        tracing::debug!("Using working directory from hook payload: {}", dir);
        return Some(PathBuf::from(dir));
    }

    if let Some(cwd) = &hints.process_cwd {
        // Running from our own checkout without file context: the commit is
        // almost certainly not aimed at this repo.
        if cwd.to_string_lossy().contains("claude-hooks") {
            tracing::info!(
                "Skipping branch protection: running from claude-hooks directory without file context"
            );
            return None;
        }
        tracing::debug!("Using current working directory as fallback: {}", cwd.display());
        return Some(cwd.clone());
    }

    tracing::debug!("Could not determine target working directory");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn find_git_root_walks_up() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        let nested = tmp.path().join("pkg").join("sub");
        fs::create_dir_all(&nested).unwrap();
        let file = nested.join("main.go");

        assert_eq!(find_git_root(&file), Some(tmp.path().to_path_buf()));
    }

    #[test]
    fn find_git_root_none_outside_repo() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let file = tmp.path().join("a.go");
        // tempdirs normally live outside any repository; tolerate CI layouts that don't
        if let Some(root) = find_git_root(&file) {
            assert!(!root.starts_with(tmp.path()));
        }
    }

    #[test]
    fn env_cwd_wins() {
        let hints = WorkdirHints {
            env_cwd: Some("/from/env".into()),
            files: vec![],
            payload_cwd: Some("/from/payload".into()),
            process_cwd: Some(PathBuf::from("/from/process")),
        };
        assert_eq!(
            target_working_directory(&hints),
            Some(PathBuf::from("/from/env"))
        );
    }

    #[test]
    fn file_git_root_beats_payload_cwd() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        let hints = WorkdirHints {
            env_cwd: None,
            files: vec![tmp.path().join("x.go").to_string_lossy().into_owned()],
            payload_cwd: Some("/from/payload".into()),
            process_cwd: None,
        };
        assert_eq!(
            target_working_directory(&hints),
            Some(tmp.path().to_path_buf())
        );
    }

    #[test]
    fn payload_cwd_used_before_process_cwd() {
        let hints = WorkdirHints {
            env_cwd: Some(String::new()),
            files: vec![],
            payload_cwd: Some("/from/payload".into()),
            process_cwd: Some(PathBuf::from("/from/process")),
        };
        assert_eq!(
            target_working_directory(&hints),
            Some(PathBuf::from("/from/payload"))
        );
    }

    #[test]
    fn own_checkout_is_not_a_target() {
        let hints = WorkdirHints {
            process_cwd: Some(PathBuf::from("/home/dev/src/claude-hooks")),
            ..Default::default()
        };
        assert_eq!(target_working_directory(&hints), None);
    }

    #[test]
    fn current_branch_outside_repo_is_empty() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let inside_repo = find_git_root(&tmp.path().join("probe")).is_some();
        if !inside_repo {
            assert_eq!(current_branch(tmp.path()), "");
        }
    }
}
