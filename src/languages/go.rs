//! Go post-edit checks: formatting hints, golangci-lint (or go vet), package
//! tests and `go mod tidy`.

use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use super::tool::{self, ToolOutput};
use super::{no_checks, Pipeline, PipelineContext};

pub static PIPELINE: Pipeline = Pipeline {
    pre_edit: no_checks,
    post_edit,
};

const BLOCKING_LINTERS: &[&str] = &[
    "--enable=gocritic",
    "--enable=govet",
    "--enable=ineffassign",
    "--enable=errcheck",
];
const WARNING_LINTERS: &[&str] = &["--enable=staticcheck", "--enable=unused"];

/// Lines shown on stderr when not verbose.
const STDERR_PREVIEW: usize = 5;

fn post_edit(files: &[String], ctx: &PipelineContext) -> Result<()> {
    if files.is_empty() {
        return Ok(());
    }

    tool::banner("Go", files.len());

    let mut errors = Vec::new();

    check_formatting("goimports", "Import formatting", files, ctx);
    if tool::is_available("gofumpt") {
        check_formatting("gofumpt", "Formatting", files, ctx);
    }

    if let Err(e) = run_linters(files, ctx) {
        gate(e, ctx.config.lint_warn_only, &mut errors);
    }

    if let Err(e) = run_tests(files, ctx) {
        gate(e, ctx.config.test_warn_only, &mut errors);
    }

    if ctx.workdir.join("go.mod").exists() {
        if let Err(e) = go_mod_tidy(ctx) {
            eprintln!("⚠️  go mod tidy: {}", e);
        }
    }

    if !errors.is_empty() {
        bail!("go checks failed:\n\n{}", errors.join("\n\n"));
    }
    Ok(())
}

fn gate(err: anyhow::Error, warn_only: bool, errors: &mut Vec<String>) {
    if warn_only {
        eprintln!("⚠️  {} (warn only)", err);
    } else {
        errors.push(err.to_string());
    }
}

/// `-d` diff check; never blocks.
fn check_formatting(program: &str, what: &str, files: &[String], ctx: &PipelineContext) {
    if !tool::is_available(program) {
        if ctx.verbose {
            eprintln!("{} not found, skipping", program);
        }
        return;
    }

    tool::step(&format!("Running {} (warnings only)", program));

    let mut has_diffs = false;
    for file in files {
        let out = match tool::run_tool(program, &["-d".to_string(), file.clone()], None) {
            Ok(out) if out.success => out,
            Ok(out) => {
                eprintln!("⚠️  {} check failed on {}: {}", program, file, out.trimmed());
                continue;
            }
            Err(e) => {
                eprintln!("⚠️  {} check failed on {}: {:#}", program, file, e);
                continue;
            }
        };
        if !out.combined.is_empty() {
            has_diffs = true;
            if ctx.verbose {
                eprintln!("\n⚠️  {} suggestions for {}:\n{}", what, file, out.combined);
            }
        }
    }

    if has_diffs {
        eprintln!(
            "⚠️  Some files have {} suggestions (run {} -w to apply)",
            what.to_lowercase(),
            program
        );
    } else {
        eprintln!("  ✓ {} looks good", what);
    }
}

/// Nearest ancestor of `dir` (inclusive) that holds a `go.mod`.
pub fn find_module_root(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .find(|d| d.join("go.mod").is_file())
        .map(Path::to_path_buf)
}

fn absolute(file: &str, base: &Path) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Package arguments (`.` or `./sub/dir`) per module root, without duplicates.
/// Files outside any module are linted from their own directory.
pub fn packages_by_module<'a, I>(files: I, base: &Path) -> BTreeMap<PathBuf, Vec<String>>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut modules: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();

    for file in files {
        let abs = absolute(file, base);
        let Some(dir) = abs.parent() else {
            continue;
        };
        let root = find_module_root(dir).unwrap_or_else(|| dir.to_path_buf());

        let pkg = match dir.strip_prefix(&root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => format!("./{}", rel.to_string_lossy()),
            Err(_) => continue,
        };

        let pkgs = modules.entry(root).or_default();
        if !pkgs.contains(&pkg) {
            pkgs.push(pkg);
        }
    }

    modules
}

/// Lint lines that concern the edited files, plus location-less compiler
/// diagnostics.
pub fn filter_lint_lines(output: &str, edited: &HashSet<String>) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            if line.contains(".go:") {
                let path = line.split(':').next().unwrap_or("");
                Path::new(path)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| edited.contains(name))
            } else {
                ["undefined:", "error:", "warning:", "note:"]
                    .iter()
                    .any(|marker| line.contains(marker))
            }
        })
        .map(String::from)
        .collect()
}

fn base_names(files: &[String]) -> HashSet<String> {
    files
        .iter()
        .filter_map(|f| Path::new(f).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

fn run_linters(files: &[String], ctx: &PipelineContext) -> Result<()> {
    tool::step("Step 3/5: Running linters");

    if !tool::is_available("golangci-lint") {
        if ctx.verbose {
            eprintln!("  golangci-lint not found, using go vet");
        }
        return run_go_vet(files, ctx);
    }

    let edited = base_names(files);
    let mut issues: Vec<String> = Vec::new();

    for (root, pkgs) in packages_by_module(files, &ctx.workdir) {
        tracing::debug!("Linting in module: {}", root.display());

        let blocking = golangci_args(BLOCKING_LINTERS, &pkgs);
        let out = tool::run_tool("golangci-lint", &blocking, Some(&root))?;
        if !out.success {
            report_lint_failure(&out, &edited, &root, ctx, &mut issues);
        }

        let warnings = golangci_args(WARNING_LINTERS, &pkgs);
        let out = tool::run_tool("golangci-lint", &warnings, Some(&root))?;
        if !out.success && !out.combined.is_empty() {
            eprintln!("\n⚠️  Code quality suggestions from {}:", root.display());
            if ctx.verbose {
                eprintln!("{}", out.combined);
            } else {
                for line in tool::preview_lines(&out.combined, STDERR_PREVIEW) {
                    eprintln!("{}", line);
                }
                eprintln!("  (use -v to see all suggestions)");
            }
        }
    }

    if !issues.is_empty() {
        bail!("linting failed:\n\n{}", issues.join("\n"));
    }
    eprintln!("  ✓ No linting issues");
    Ok(())
}

fn golangci_args(linters: &[&str], pkgs: &[String]) -> Vec<String> {
    ["run", "--timeout=5m"]
        .iter()
        .chain(linters)
        .map(|s| s.to_string())
        .chain(pkgs.iter().cloned())
        .collect()
}

fn report_lint_failure(
    out: &ToolOutput,
    edited: &HashSet<String>,
    root: &Path,
    ctx: &PipelineContext,
    issues: &mut Vec<String>,
) {
    let lines = filter_lint_lines(&out.combined, edited);

    if lines.is_empty() {
        eprintln!("\n✓ No linting issues found in edited files from {}", root.display());
        return;
    }

    eprintln!("\n❌ Linting issues found in edited files from {}", root.display());
    eprintln!("  {} issues in edited files", lines.len());
    if ctx.verbose {
        eprintln!("\nFull output:\n{}", out.combined);
    } else {
        for line in lines.iter().take(STDERR_PREVIEW) {
            eprintln!("  {}", line);
        }
        eprintln!("  (use -v to see all issues)");
    }

    let limit = ctx.config.max_issues;
    issues.push(format!(
        "Linting issues in edited files from {}:",
        root.display()
    ));
    issues.extend(lines.iter().take(limit).cloned());
    if lines.len() > limit {
        issues.push(format!("... and {} more issues", lines.len() - limit));
    }
}

fn run_go_vet(files: &[String], ctx: &PipelineContext) -> Result<()> {
    if !tool::is_available("go") {
        eprintln!("⚠️  go not found, skipping go vet");
        return Ok(());
    }

    let mut failed = Vec::new();
    for (root, pkgs) in packages_by_module(files, &ctx.workdir) {
        for pkg in pkgs {
            let out = tool::run_tool("go", &["vet".to_string(), pkg.clone()], Some(&root))?;
            if !out.success {
                eprintln!(
                    "❌ go vet failed for {} in {}:\n{}",
                    pkg,
                    root.display(),
                    out.combined
                );
                failed.push(format!("{} ({})\n{}", pkg, root.display(), out.trimmed()));
            }
        }
    }

    if !failed.is_empty() {
        bail!("go vet failed:\n\n{}", failed.join("\n\n"));
    }
    eprintln!("  ✓ go vet passed");
    Ok(())
}

/// A test file, or a source file with a sibling `_test.go`.
pub fn should_test(file: &str, base: &Path) -> bool {
    if file.ends_with("_test.go") {
        return true;
    }
    match file.strip_suffix(".go") {
        Some(stem) => absolute(&format!("{}_test.go", stem), base).is_file(),
        None => false,
    }
}

fn run_tests(files: &[String], ctx: &PipelineContext) -> Result<()> {
    tool::step("Step 4/5: Running tests");

    let testable: Vec<&String> = files
        .iter()
        .filter(|f| should_test(f, &ctx.workdir))
        .collect();
    let modules = packages_by_module(testable, &ctx.workdir);

    if modules.is_empty() {
        eprintln!("  No test files found");
        return Ok(());
    }
    if !tool::is_available("go") {
        eprintln!("⚠️  go not found, skipping tests");
        return Ok(());
    }

    let timeout_arg = format!("-timeout={}", ctx.config.test_timeout);
    let mut failures = Vec::new();

    for (root, pkgs) in modules {
        tracing::debug!("Testing in module: {}", root.display());
        for pkg in pkgs {
            let args = vec!["test".to_string(), timeout_arg.clone(), pkg.clone()];
            let out = tool::run_tool("go", &args, Some(&root))?;

            if out.success {
                if ctx.verbose && !out.combined.is_empty() {
                    eprint!("{}", out.combined);
                }
                continue;
            }

            let header = format!("Tests failed in {} (module: {}):", pkg, root.display());
            eprintln!("\n❌ {}\n{}", header, out.combined);
            let body = tool::truncate_output(out.trimmed(), ctx.config.output_limit);
            failures.push(if body.is_empty() {
                header
            } else {
                format!("{}\n{}", header, body)
            });
        }
    }

    if !failures.is_empty() {
        bail!("tests failed:\n\n{}", failures.join("\n\n"));
    }
    eprintln!("  ✓ All tests passed");
    Ok(())
}

fn go_mod_tidy(ctx: &PipelineContext) -> Result<()> {
    tool::step("Step 5/5: Running go mod tidy");

    if !tool::is_available("go") {
        eprintln!("  go not found, skipping");
        return Ok(());
    }

    let out = tool::run_tool("go", &["mod".to_string(), "tidy".to_string()], Some(&ctx.workdir))?;
    if !out.success {
        eprintln!("❌ go mod tidy failed:\n{}", out.combined);
        bail!("go mod tidy failed");
    }
    if ctx.verbose && !out.combined.is_empty() {
        eprint!("{}", out.combined);
    }
    eprintln!("  ✓ Dependencies tidied");
    Ok(())
}
