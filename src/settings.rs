//! Registers the hook subcommands in Claude Code's `settings.json`.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub event: &'static str,
    pub matcher: &'static str,
    pub subcommand: &'static str,
    pub purpose: &'static str,
}

pub const REGISTRATIONS: [Registration; 4] = [
    Registration {
        event: "PostToolUse",
        matcher: "Write|Edit|MultiEdit",
        subcommand: "post-edit",
        purpose: "lint, type-check and test edited files",
    },
    Registration {
        event: "PreToolUse",
        matcher: "Bash",
        subcommand: "pre-bash",
        purpose: "database CLI blocking + git commit protection",
    },
    Registration {
        event: "PreToolUse",
        matcher: "ExitPlanMode",
        subcommand: "plan-review",
        purpose: "AI Council plan review",
    },
    Registration {
        event: "SessionStart",
        matcher: "",
        subcommand: "session-start",
        purpose: "inject agents.md into the session",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// New matcher entry created.
    Added,
    /// Command appended to an existing matcher entry.
    Appended,
    AlreadyPresent,
}

pub fn default_settings_path() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Cannot find home directory")?
        .join(".claude")
        .join("settings.json"))
}

/// Shell command Claude Code runs for `subcommand`.
pub fn hook_command(exe: &Path, subcommand: &str) -> String {
    let exe = exe.display().to_string();
    if exe.contains(char::is_whitespace) {
        format!("\"{}\" {}", exe, subcommand)
    } else {
        format!("{} {}", exe, subcommand)
    }
}

/// Existing settings, or an empty object when the file is missing or blank.
pub fn read_settings(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(json!({}));
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn object_field<'a>(obj: &'a mut Map<String, Value>, key: &str, empty: Value) -> &'a mut Value {
    obj.entry(key.to_string()).or_insert(empty)
}

/// Add `command` under `hooks.<event>[matcher]` unless it is already there.
pub fn merge_registration(
    settings: &mut Value,
    event: &str,
    matcher: &str,
    command: &str,
) -> Result<MergeOutcome> {
    let root = settings
        .as_object_mut()
        .context("settings.json must contain a JSON object")?;
    let hooks = object_field(root, "hooks", json!({}))
        .as_object_mut()
        .context("\"hooks\" in settings.json must be an object")?;
    let entries = object_field(hooks, event, json!([]))
        .as_array_mut()
        .with_context(|| format!("\"hooks.{}\" in settings.json must be an array", event))?;

    let hook = json!({"type": "command", "command": command});

    let existing = entries
        .iter_mut()
        .find(|e| e.get("matcher").and_then(Value::as_str).unwrap_or("") == matcher);

    if let Some(entry) = existing {
        let entry = entry
            .as_object_mut()
            .with_context(|| format!("matcher entry {:?} must be an object", matcher))?;
        let list = object_field(entry, "hooks", json!([]))
            .as_array_mut()
            .with_context(|| format!("hooks of matcher {:?} must be an array", matcher))?;

        if list
            .iter()
            .any(|h| h.get("command").and_then(Value::as_str) == Some(command))
        {
            return Ok(MergeOutcome::AlreadyPresent);
        }
        list.push(hook);
        return Ok(MergeOutcome::Appended);
    }

    entries.push(json!({"matcher": matcher, "hooks": [hook]}));
    Ok(MergeOutcome::Added)
}

pub fn merge_all(settings: &mut Value, exe: &Path) -> Result<Vec<(Registration, MergeOutcome)>> {
    REGISTRATIONS
        .iter()
        .map(|reg| {
            let command = hook_command(exe, reg.subcommand);
            merge_registration(settings, reg.event, reg.matcher, &command).map(|o| (*reg, o))
        })
        .collect()
}

/// Replace `path` atomically with the pretty-printed settings, keeping a
/// `.json.bak` copy of the previous file.
pub fn write_settings(path: &Path, settings: &Value) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    if path.exists() {
        let backup = path.with_extension("json.bak");
        if let Err(e) = fs::copy(path, &backup) {
            eprintln!("⚠️  Failed to create backup {}: {}", backup.display(), e);
        }
    }

    let mut json = serde_json::to_string_pretty(settings)?;
    json.push('\n');

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    tmp.write_all(json.as_bytes())
        .context("Failed to write settings to temp file")?;
    tmp.persist(path).map_err(|e| {
        anyhow::Error::new(e.error).context(format!("Failed to replace {}", path.display()))
    })?;
    Ok(())
}

pub fn run(settings_path: Option<PathBuf>, dry_run: bool) -> Result<i32> {
    let path = match settings_path {
        Some(p) => p,
        None => default_settings_path()?,
    };
    let exe = std::env::current_exe().context("Cannot locate the claude-hook binary")?;

    println!("Setting up Claude Hooks...");
    if !path.exists() {
        println!("Creating {}...", path.display());
    }

    let mut settings = read_settings(&path)?;
    let results = merge_all(&mut settings, &exe)?;

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(0);
    }

    if results
        .iter()
        .all(|(_, o)| *o == MergeOutcome::AlreadyPresent)
    {
        println!("✅ Hooks already configured in {}", path.display());
        return Ok(0);
    }

    write_settings(&path, &settings)?;

    println!();
    println!("✅ Setup complete!");
    println!();
    println!("Hooks configured in: {}", path.display());
    for (reg, outcome) in &results {
        let matcher = if reg.matcher.is_empty() { "*" } else { reg.matcher };
        let note = match outcome {
            MergeOutcome::AlreadyPresent => " (already configured)",
            _ => "",
        };
        println!("  {} Event: {} ({}){}", reg.event, matcher, reg.purpose, note);
        println!("    Command: {}", hook_command(&exe, reg.subcommand));
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exe() -> PathBuf {
        PathBuf::from("/usr/local/bin/claude-hook")
    }

    #[test]
    fn merge_into_empty_settings() {
        let mut settings = json!({});
        let results = merge_all(&mut settings, &exe()).unwrap();
        assert!(results.iter().all(|(_, o)| *o == MergeOutcome::Added));

        let pre = settings["hooks"]["PreToolUse"].as_array().unwrap();
        assert_eq!(pre.len(), 2);
        assert_eq!(pre[0]["matcher"], "Bash");
        assert_eq!(
            pre[0]["hooks"][0]["command"],
            "/usr/local/bin/claude-hook pre-bash"
        );
        assert_eq!(pre[1]["matcher"], "ExitPlanMode");
        assert_eq!(
            settings["hooks"]["PostToolUse"][0]["matcher"],
            "Write|Edit|MultiEdit"
        );
        assert_eq!(settings["hooks"]["SessionStart"][0]["matcher"], "");
    }

    #[test]
    fn merge_is_idempotent() {
        let mut settings = json!({});
        merge_all(&mut settings, &exe()).unwrap();
        let once = settings.clone();

        let results = merge_all(&mut settings, &exe()).unwrap();
        assert!(results
            .iter()
            .all(|(_, o)| *o == MergeOutcome::AlreadyPresent));
        assert_eq!(settings, once);
    }

    #[test]
    fn appends_to_existing_matcher_and_keeps_other_keys() {
        let mut settings = json!({
            "model": "opus",
            "hooks": {
                "PreToolUse": [
                    {"matcher": "Bash", "hooks": [{"type": "command", "command": "other-tool check"}]}
                ]
            },
            "permissions": {"allow": ["Read"]}
        });

        let outcome = merge_registration(
            &mut settings,
            "PreToolUse",
            "Bash",
            "/usr/local/bin/claude-hook pre-bash",
        )
        .unwrap();
        assert_eq!(outcome, MergeOutcome::Appended);

        let hooks = settings["hooks"]["PreToolUse"][0]["hooks"].as_array().unwrap();
        assert_eq!(hooks.len(), 2);
        assert_eq!(hooks[0]["command"], "other-tool check");
        assert_eq!(settings["model"], "opus");
        assert_eq!(settings["permissions"]["allow"][0], "Read");

        let keys: Vec<&String> = settings.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["model", "hooks", "permissions"]);
    }

    #[test]
    fn rejects_non_object_settings() {
        let mut settings = json!([1, 2]);
        assert!(merge_registration(&mut settings, "PreToolUse", "Bash", "x").is_err());
    }

    #[test]
    fn command_quotes_paths_with_spaces() {
        assert_eq!(
            hook_command(Path::new("/Users/a b/bin/claude-hook"), "pre-bash"),
            "\"/Users/a b/bin/claude-hook\" pre-bash"
        );
    }

    #[test]
    fn write_creates_parent_and_backup() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join(".claude").join("settings.json");

        write_settings(&path, &json!({"a": 1})).unwrap();
        assert_eq!(read_settings(&path).unwrap(), json!({"a": 1}));
        assert!(!path.with_extension("json.bak").exists());

        write_settings(&path, &json!({"a": 2})).unwrap();
        assert_eq!(read_settings(&path).unwrap(), json!({"a": 2}));
        assert_eq!(
            read_settings(&path.with_extension("json.bak")).unwrap(),
            json!({"a": 1})
        );
    }

    #[test]
    fn missing_or_blank_file_reads_as_empty_object() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("settings.json");
        assert_eq!(read_settings(&path).unwrap(), json!({}));
        fs::write(&path, "  \n").unwrap();
        assert_eq!(read_settings(&path).unwrap(), json!({}));
    }
}
