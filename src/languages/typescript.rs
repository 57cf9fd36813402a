use anyhow::{bail, Result};

use super::tool;
use super::{no_checks, Pipeline, PipelineContext};

pub static PIPELINE: Pipeline = Pipeline {
    pre_edit: no_checks,
    post_edit,
};

fn post_edit(files: &[String], ctx: &PipelineContext) -> Result<()> {
    if files.is_empty() {
        return Ok(());
    }

    tool::banner("TypeScript", files.len());

    let mut errors = Vec::new();

    if let Err(e) = run_eslint(files, ctx) {
        if ctx.config.lint_warn_only {
            eprintln!("⚠️  {} (warn only)", e);
        } else {
            errors.push(e.to_string());
        }
    }

    if let Err(e) = run_type_check(ctx) {
        if ctx.config.lint_warn_only {
            eprintln!("⚠️  {} (warn only)", e);
        } else {
            errors.push(e.to_string());
        }
    }

    if !errors.is_empty() {
        bail!(
            "TypeScript/JavaScript checks failed:\n\n{}",
            errors.join("\n\n")
        );
    }
    Ok(())
}

fn run_eslint(files: &[String], ctx: &PipelineContext) -> Result<()> {
    if !tool::is_available("eslint") {
        if ctx.verbose {
            eprintln!("eslint not found, skipping");
        }
        return Ok(());
    }

    tool::step("Step 1/2: Running ESLint");

    let mut args = vec!["--fix".to_string()];
    args.extend(files.iter().cloned());
    let out = tool::run_tool("eslint", &args, Some(&ctx.workdir))?;

    if !out.success {
        eprintln!("❌ ESLint found issues:\n{}", out.combined);
        if out.trimmed().is_empty() {
            bail!("ESLint failed with unknown errors");
        }
        bail!(
            "ESLint found issues:\n{}",
            tool::truncate_output(out.trimmed(), ctx.config.output_limit)
        );
    }

    if ctx.verbose && !out.combined.is_empty() {
        eprint!("{}", out.combined);
    }
    eprintln!("  ✓ No linting issues");
    Ok(())
}

/// Whole-project `tsc --noEmit`; tsc cannot check single files against the
/// project config.
fn run_type_check(ctx: &PipelineContext) -> Result<()> {
    if !tool::is_available("tsc") {
        if ctx.verbose {
            eprintln!("tsc not found, skipping type check");
        }
        return Ok(());
    }

    tool::step("Step 2/2: Running TypeScript type check");

    let out = tool::run_tool("tsc", &["--noEmit".to_string()], Some(&ctx.workdir))?;

    if !out.success {
        eprintln!("❌ Type errors found:\n{}", out.combined);
        if out.trimmed().is_empty() {
            bail!("TypeScript type check failed with unknown errors");
        }
        bail!(
            "TypeScript type check failed:\n{}",
            tool::truncate_output(out.trimmed(), ctx.config.output_limit)
        );
    }

    if ctx.verbose && !out.combined.is_empty() {
        eprint!("{}", out.combined);
    }
    eprintln!("  ✓ Type check passed");
    Ok(())
}
