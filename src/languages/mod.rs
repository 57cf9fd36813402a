//! Per-language quality pipelines run around file edits.
//!
//! Edited files are grouped by language and each group is handed to that
//! language's pipeline. Languages without a pipeline are skipped.

pub mod go;
pub mod tool;
pub mod typescript;

use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::config::{Config, PipelineConfig};
use crate::decision::PostToolUseOutput;
use crate::hook_input::{collect_files, HookInput, ToolInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    Go,
    TypeScript,
    JavaScript,
    Python,
}

impl Language {
    /// Processing order.
    pub const ALL: [Language; 4] = [
        Language::Go,
        Language::TypeScript,
        Language::JavaScript,
        Language::Python,
    ];

    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "go" => Some(Language::Go),
            "ts" | "tsx" => Some(Language::TypeScript),
            "js" | "jsx" => Some(Language::JavaScript),
            "py" => Some(Language::Python),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
        }
    }

    pub fn pipeline(self) -> Option<&'static Pipeline> {
        match self {
            Language::Go => Some(&go::PIPELINE),
            // JS shares the eslint/tsc checks
            Language::TypeScript | Language::JavaScript => Some(&typescript::PIPELINE),
            Language::Python => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PreEdit,
    PostEdit,
}

/// What a pipeline needs besides the file list.
pub struct PipelineContext<'a> {
    pub config: &'a PipelineConfig,
    pub verbose: bool,
    /// Directory the hook was started in.
    pub workdir: PathBuf,
}

pub type StageFn = fn(&[String], &PipelineContext) -> Result<()>;

pub struct Pipeline {
    pub pre_edit: StageFn,
    pub post_edit: StageFn,
}

impl Pipeline {
    fn stage(&self, stage: Stage) -> StageFn {
        match stage {
            Stage::PreEdit => self.pre_edit,
            Stage::PostEdit => self.post_edit,
        }
    }
}

/// Placeholder for stages with no checks yet.
pub fn no_checks(_files: &[String], _ctx: &PipelineContext) -> Result<()> {
    Ok(())
}

/// Group files by language in `Language::ALL` order; unknown extensions are dropped.
pub fn group_files(files: &[String]) -> Vec<(Language, Vec<String>)> {
    Language::ALL
        .iter()
        .filter_map(|&lang| {
            let group: Vec<String> = files
                .iter()
                .filter(|f| Language::from_path(f) == Some(lang))
                .cloned()
                .collect();
            (!group.is_empty()).then_some((lang, group))
        })
        .collect()
}

/// Run `stage` for every language group. Returns one message per failed language.
pub fn run_stage(stage: Stage, files: &[String], ctx: &PipelineContext) -> Vec<String> {
    let mut failures = Vec::new();

    for (lang, group) in group_files(files) {
        tracing::info!("Processing {} {} files...", group.len(), lang.name());

        let Some(pipeline) = lang.pipeline() else {
            tracing::info!("No hook registered for {} files", lang.name());
            continue;
        };

        if let Err(e) = (pipeline.stage(stage))(&group, ctx) {
            let msg = format!("{} hook failed: {}", lang.name(), e);
            eprintln!("{} {}", "❌".red(), msg);
            failures.push(msg);
        }
    }

    failures
}

/// Files for this invocation: the payload's files, or positional arguments
/// when there is no usable payload.
pub fn files_for(input: Option<&HookInput>, positional: Vec<String>) -> Vec<String> {
    match input {
        Some(input) => input.files(),
        None => collect_files(&ToolInput {
            file_paths: positional,
            ..Default::default()
        }),
    }
}

/// Handle a post-edit or pre-edit hook. Returns the process exit code.
pub fn run(
    stage: Stage,
    input: Option<HookInput>,
    positional: Vec<String>,
    config: &Config,
    verbose: bool,
) -> Result<i32> {
    let files = files_for(input.as_ref(), positional);
    if files.is_empty() {
        tracing::info!("No files to process");
        return Ok(0);
    }

    let ctx = PipelineContext {
        config: &config.pipelines,
        verbose,
        workdir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let failures = run_stage(stage, &files, &ctx);
    if failures.is_empty() {
        println!("✅ All checks passed!");
        return Ok(0);
    }

    match stage {
        Stage::PostEdit => {
            println!("{}", PostToolUseOutput::block(failures.join("\n\n")).to_json()?);
            Ok(0)
        }
        Stage::PreEdit => Ok(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(config: &PipelineConfig) -> PipelineContext<'_> {
        PipelineContext {
            config,
            verbose: false,
            workdir: PathBuf::from("."),
        }
    }

    #[test]
    fn classify_by_extension() {
        assert_eq!(Language::from_path("cmd/main.go"), Some(Language::Go));
        assert_eq!(Language::from_path("src/App.TSX"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("a.ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("web/x.jsx"), Some(Language::JavaScript));
        assert_eq!(Language::from_path("tool.py"), Some(Language::Python));
        assert_eq!(Language::from_path("README.md"), None);
        assert_eq!(Language::from_path("Makefile"), None);
    }

    #[test]
    fn groups_follow_fixed_language_order() {
        let files: Vec<String> = ["b.py", "a.js", "x.ts", "main.go", "notes.txt", "y.tsx"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let groups = group_files(&files);
        let langs: Vec<Language> = groups.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            langs,
            vec![
                Language::Go,
                Language::TypeScript,
                Language::JavaScript,
                Language::Python
            ]
        );
        assert_eq!(groups[1].1, vec!["x.ts", "y.tsx"]);
    }

    #[test]
    fn python_has_no_pipeline() {
        assert!(Language::Python.pipeline().is_none());
        assert!(Language::JavaScript.pipeline().is_some());
    }

    #[test]
    fn pre_edit_has_no_checks() {
        let config = PipelineConfig::default();
        let files = vec!["main.go".to_string(), "a.ts".to_string()];
        assert!(run_stage(Stage::PreEdit, &files, &ctx(&config)).is_empty());
    }

    #[test]
    fn unsupported_files_produce_no_failures() {
        let config = PipelineConfig::default();
        let files = vec!["script.py".to_string(), "doc.md".to_string()];
        assert!(run_stage(Stage::PostEdit, &files, &ctx(&config)).is_empty());
    }

    #[test]
    fn positional_files_used_without_payload() {
        let files = files_for(
            None,
            vec!["a.go".into(), "a.go".into(), "vendor/x.go".into(), "x/vendor/y.go".into()],
        );
        assert_eq!(files, vec!["a.go", "vendor/x.go"]);
    }

    #[test]
    fn payload_files_win_over_positional() {
        let input = HookInput::parse(r#"{"tool_input":{"file_path":"/p/main.go"}}"#).unwrap();
        assert_eq!(
            files_for(Some(&input), vec!["other.go".into()]),
            vec!["/p/main.go"]
        );
    }

    #[test]
    fn nothing_to_do_exits_zero() {
        let config = Config::default();
        assert_eq!(run(Stage::PostEdit, None, vec![], &config, false).unwrap(), 0);
    }
}
