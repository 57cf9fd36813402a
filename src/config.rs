use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment override for the config file location.
pub const CONFIG_ENV: &str = "CLAUDE_HOOKS_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub pipelines: PipelineConfig,
}

/// Pre-bash command gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Executable names (lower-case) that are always denied.
    pub denied_executables: Vec<String>,
    /// Branches where `git commit` is denied (case-sensitive).
    pub protected_branches: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            denied_executables: vec!["mysql".into(), "mysqldump".into(), "mariadb".into()],
            protected_branches: vec!["main".into(), "master".into()],
        }
    }
}

/// One external AI reviewer CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewerConfig {
    /// Display name used in the report.
    pub name: String,
    pub program: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Replaces the built-in flags when set. The prompt is always appended last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

impl ReviewerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A `[review.<reviewer>]` table as written; unset keys keep that reviewer's defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReviewerTable {
    name: Option<String>,
    program: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    args: Option<Vec<String>>,
}

impl ReviewerTable {
    fn merge_into(self, base: ReviewerConfig) -> ReviewerConfig {
        ReviewerConfig {
            name: self.name.unwrap_or(base.name),
            program: self.program.unwrap_or(base.program),
            model: self.model.unwrap_or(base.model),
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
            args: self.args.or(base.args),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReviewTables {
    claude: ReviewerTable,
    codex: ReviewerTable,
    gemini: ReviewerTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ReviewTables")]
pub struct ReviewConfig {
    pub claude: ReviewerConfig,
    pub codex: ReviewerConfig,
    pub gemini: ReviewerConfig,
}

impl From<ReviewTables> for ReviewConfig {
    fn from(tables: ReviewTables) -> Self {
        let defaults = ReviewConfig::default();
        Self {
            claude: tables.claude.merge_into(defaults.claude),
            codex: tables.codex.merge_into(defaults.codex),
            gemini: tables.gemini.merge_into(defaults.gemini),
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            claude: ReviewerConfig {
                name: "Claude Opus 4.5".into(),
                program: "claude".into(),
                model: "claude-opus-4-5-20251101".into(),
                timeout_secs: 120,
                args: None,
            },
            codex: ReviewerConfig {
                name: "o3 (Codex)".into(),
                program: "codex".into(),
                model: "o3".into(),
                timeout_secs: 120,
                args: None,
            },
            // gemini tends to hang, so it gets a shorter leash
            gemini: ReviewerConfig {
                name: "Gemini 2.5 Pro".into(),
                program: "gemini".into(),
                model: "gemini-2.5-pro".into(),
                timeout_secs: 60,
                args: None,
            },
        }
    }
}

/// Knobs for the per-language quality pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Report lint failures as warnings instead of blocking.
    pub lint_warn_only: bool,
    /// Report test failures as warnings instead of blocking.
    pub test_warn_only: bool,
    /// Max lint issues quoted back to the assistant per module.
    pub max_issues: usize,
    /// Max chars of tool output quoted back to the assistant.
    pub output_limit: usize,
    /// Passed to `go test -timeout=`.
    pub test_timeout: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lint_warn_only: false,
            test_warn_only: false,
            max_issues: 10,
            output_limit: 1500,
            test_timeout: "30s".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = get_config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = get_config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    pub fn create_default() -> Result<PathBuf> {
        let config = Config::default();
        config.save()?;
        get_config_path()
    }
}

fn get_config_path() -> Result<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(explicit));
    }
    let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(config_dir.join("claude-hooks").join("config.toml"))
}

pub fn show_config() -> Result<()> {
    let path = get_config_path()?;
    println!("Config: {}", path.display());
    println!();

    if path.exists() {
        let config = Config::load()?;
        println!("{}", toml::to_string_pretty(&config)?);
    } else {
        println!("(default config, file not created)");
        println!();
        let config = Config::default();
        println!("{}", toml::to_string_pretty(&config)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_defaults_cover_database_clis_and_main_branches() {
        let cfg = Config::default();
        assert_eq!(
            cfg.guard.denied_executables,
            vec!["mysql", "mysqldump", "mariadb"]
        );
        assert_eq!(cfg.guard.protected_branches, vec!["main", "master"]);
    }

    #[test]
    fn gemini_has_shorter_timeout() {
        let cfg = ReviewConfig::default();
        assert_eq!(cfg.claude.timeout(), Duration::from_secs(120));
        assert_eq!(cfg.codex.timeout(), Duration::from_secs(120));
        assert_eq!(cfg.gemini.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[guard]
protected_branches = ["trunk"]

[pipelines]
lint_warn_only = true
"#,
        )
        .expect("valid toml");
        assert_eq!(cfg.guard.protected_branches, vec!["trunk"]);
        assert_eq!(cfg.guard.denied_executables.len(), 3);
        assert!(cfg.pipelines.lint_warn_only);
        assert!(!cfg.pipelines.test_warn_only);
        assert_eq!(cfg.pipelines.output_limit, 1500);
        assert_eq!(cfg.review.codex.program, "codex");
    }

    #[test]
    fn reviewer_override_with_custom_args() {
        let cfg: Config = toml::from_str(
            r#"
[review.gemini]
name = "Local"
program = "sh"
model = "none"
timeout_secs = 5
args = ["-c", "echo ok"]
"#,
        )
        .expect("valid toml");
        assert_eq!(cfg.review.gemini.program, "sh");
        assert_eq!(
            cfg.review.gemini.args.as_deref(),
            Some(&["-c".to_string(), "echo ok".to_string()][..])
        );
        assert_eq!(cfg.review.claude.program, "claude");
    }

    #[test]
    fn partial_reviewer_table_keeps_that_reviewers_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[guard]
denied_executables = ["mysql", "psql"]

[review.gemini]
timeout_secs = 90
"#,
        )
        .expect("valid toml");
        assert_eq!(cfg.guard.denied_executables, vec!["mysql", "psql"]);
        assert_eq!(cfg.review.gemini.timeout_secs, 90);
        assert_eq!(cfg.review.gemini.program, "gemini");
        assert_eq!(cfg.review.gemini.model, "gemini-2.5-pro");
        assert_eq!(cfg.review.gemini.name, "Gemini 2.5 Pro");
        assert_eq!(cfg.review.claude.timeout_secs, 120);
    }

    #[test]
    fn empty_review_section_is_all_defaults() {
        let cfg: Config = toml::from_str("[review]\n").expect("valid toml");
        assert_eq!(cfg.review.codex.model, "o3");
        assert_eq!(cfg.review.gemini.timeout_secs, 60);
    }

    #[test]
    fn default_config_roundtrips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).expect("serialize");
        let back: Config = toml::from_str(&text).expect("parse");
        assert_eq!(back.review.gemini.timeout_secs, 60);
    }
}
