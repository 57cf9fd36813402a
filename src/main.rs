mod config;
mod decision;
mod git;
mod guard;
mod hook_input;
mod languages;
mod plan_review;
mod session_start;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::Config;
use languages::Stage;

#[derive(Parser)]
#[command(
    name = "claude-hook",
    version,
    about = "Claude Code hooks - quality gates, command guards and AI plan review",
    long_about = "Hook runner for Claude Code. Reads the hook payload as JSON on stdin and answers with the hook decision protocol on stdout."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// PostToolUse: lint, type-check and test edited files
    PostEdit {
        /// Files to check when no payload is given on stdin
        files: Vec<String>,
    },

    /// PreToolUse: checks before files are edited
    PreEdit {
        /// Files to check when no payload is given on stdin
        files: Vec<String>,
    },

    /// PreToolUse (Bash): block database CLIs and commits to protected branches
    PreBash,

    /// PreToolUse (ExitPlanMode): review the plan with three AI models
    PlanReview,

    /// SessionStart: inject agents.md into the session context
    SessionStart,

    /// Register the hooks in Claude Code's settings.json
    Setup {
        /// Settings file (default: ~/.claude/settings.json)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Print the merged settings instead of writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show effective configuration
    Config {
        /// Create default config file
        #[arg(long)]
        create: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .ok();
}

/// Hooks must not fail because of a broken config file; the built-in
/// defaults still guard.
fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        eprintln!("⚠️  {:#} (using default configuration)", e);
        Config::default()
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let verbose = cli.verbose > 0;

    let code = match cli.command {
        Commands::PostEdit { files } => {
            let config = load_config();
            languages::run(Stage::PostEdit, hook_input::read_payload(), files, &config, verbose)?
        }
        Commands::PreEdit { files } => {
            let config = load_config();
            languages::run(Stage::PreEdit, hook_input::read_payload(), files, &config, verbose)?
        }
        Commands::PreBash => {
            let config = load_config();
            guard::run(hook_input::read_payload(), &config)?
        }
        Commands::PlanReview => {
            let config = load_config();
            plan_review::run(hook_input::read_payload(), &config, verbose)?
        }
        Commands::SessionStart => session_start::run(hook_input::read_payload())?,
        Commands::Setup { settings, dry_run } => settings::run(settings, dry_run)?,
        Commands::Config { create } => {
            if create {
                let path = Config::create_default()?;
                println!("Created: {}", path.display());
            } else {
                config::show_config()?;
            }
            0
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
