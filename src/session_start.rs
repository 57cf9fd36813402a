use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::git::CLAUDE_CWD_ENV;
use crate::hook_input::HookInput;

pub const AGENTS_FILE: &str = "agents.md";

/// Project directory of the session: env override, payload `cwd`, then the
/// grandparent of the transcript's directory, then the process cwd.
pub fn resolve_workdir(
    env_cwd: Option<&str>,
    input: &HookInput,
    process_cwd: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(dir) = env_cwd.filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    if let Some(dir) = input.cwd() {
        return Some(PathBuf::from(dir));
    }
    if let Some(transcript) = input.transcript_path.as_deref().filter(|p| !p.is_empty()) {
        let inferred = Path::new(transcript)
            .parent()
            .and_then(Path::parent)
            .and_then(Path::parent);
        if let Some(dir) = inferred.filter(|d| !d.as_os_str().is_empty()) {
            return Some(dir.to_path_buf());
        }
    }
    process_cwd
}

/// Contents of `agents.md` in `dir`, if readable.
pub fn agents_context(dir: &Path) -> Option<String> {
    let path = dir.join(AGENTS_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            tracing::info!("Injecting {} content ({} bytes)", AGENTS_FILE, content.len());
            Some(content)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("{} not found, skipping injection", AGENTS_FILE);
            None
        }
        Err(e) => {
            tracing::warn!("Error reading {}: {}", path.display(), e);
            None
        }
    }
}

pub fn run(input: Option<HookInput>) -> Result<i32> {
    let Some(input) = input else {
        return Ok(0);
    };

    tracing::info!(
        "SessionStart hook triggered (source: {})",
        input.source.as_deref().unwrap_or("unknown")
    );
    tracing::debug!(
        session_id = input.session_id.as_deref().unwrap_or(""),
        permission_mode = input.permission_mode.as_deref().unwrap_or(""),
        "session details"
    );

    let env_cwd = std::env::var(CLAUDE_CWD_ENV).ok();
    let Some(dir) = resolve_workdir(env_cwd.as_deref(), &input, std::env::current_dir().ok())
    else {
        tracing::info!("Could not determine working directory");
        return Ok(0);
    };

    tracing::info!("Looking for {} in: {}", AGENTS_FILE, dir.display());

    if let Some(content) = agents_context(&dir) {
        println!("{}", content);
    }
    Ok(0)
}
