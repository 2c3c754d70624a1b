//! Guidepost CLI — the main entry point.
//!
//! Commands:
//! - `query` — Route free-text intent to the best-matching skill
//! - `tree`  — Print the skill taxonomy
//! - `show`  — Show one skill's definition
//! - `check` — Validate the taxonomy without serving anything
//!
//! Exit codes: 0 resolved, 1 ambiguous (candidates printed), 2 invalid
//! input, 3 content/backing-store failure, 4 taxonomy build failure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "guidepost",
    about = "Guidepost — deterministic skill routing over curated guidance",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "guidepost.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Route free-text intent to the best-matching skill
    Query {
        /// The user intent to route
        text: String,

        /// Bypass matching and use this skill id directly
        #[arg(short, long)]
        skill: Option<String>,

        /// Output budget in characters
        #[arg(short, long)]
        budget: Option<usize>,

        /// Emit the structured response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the skill taxonomy as a tree
    Tree,

    /// Show one skill's definition
    Show {
        /// Skill id (e.g. sql.optimizer)
        id: String,
    },

    /// Validate the taxonomy and report problems
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let code = match cli.command {
        Commands::Query {
            text,
            skill,
            budget,
            json,
        } => commands::query::run(&cli.config, &text, skill, budget, json).await,
        Commands::Tree => commands::tree::run(&cli.config),
        Commands::Show { id } => commands::show::run(&cli.config, &id),
        Commands::Check => commands::check::run(&cli.config),
    };

    std::process::exit(code);
}
