#![forbid(unsafe_code)]

mod client;
mod cmd;
mod me;
mod output;

use clap::{Parser, Subcommand};
use dossier_core::config::{Overrides, resolve_config};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "dossier: edit threat-intelligence reports from the terminal",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// GraphQL endpoint (overrides DOSSIER_URL and config).
    #[arg(long, global = true)]
    url: Option<String>,

    /// API token (overrides DOSSIER_TOKEN and config).
    #[arg(long, global = true)]
    token: Option<String>,

    /// Your name as seen by other editors.
    #[arg(long, global = true)]
    me: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "Show a report's form values",
        long_about = "Fetch a report and show its editable values and who else is editing it.",
        after_help = "EXAMPLES:\n    # Show a report\n    dsr show 5f2c...\n\n    # Emit machine-readable output\n    dsr show 5f2c... --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Save one field",
        long_about = "Validate one field and save it. Invalid values are skipped, not sent.",
        after_help = "EXAMPLES:\n    # Rename a report\n    dsr patch 5f2c... name \"APT29 campaign\"\n\n    # Set the publication date\n    dsr patch 5f2c... published 2019-03-14"
    )]
    Patch(cmd::edit::PatchArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Announce which field you are editing",
        long_about = "Broadcast focus on a field so other editors can see it.",
        after_help = "EXAMPLES:\n    dsr focus 5f2c... description"
    )]
    Focus(cmd::edit::FocusArgs),

    #[command(
        next_help_heading = "Relations",
        about = "Set the report author",
        long_about = "Point the created-by relation at an identity, replacing any previous author.",
        after_help = "EXAMPLES:\n    dsr author 5f2c... 81bd... --label \"ACME CERT\""
    )]
    Author(cmd::relations::AuthorArgs),

    #[command(
        next_help_heading = "Relations",
        about = "Set the report markings",
        long_about = "Reconcile the report's marking definitions with the given list.",
        after_help = "EXAMPLES:\n    # Keep TLP:WHITE, add TLP:RED\n    dsr markings 5f2c... m-white m-red\n\n    # Remove every marking\n    dsr markings 5f2c..."
    )]
    Markings(cmd::relations::MarkingsArgs),

    #[command(
        next_help_heading = "Read",
        about = "Search autocomplete candidates",
        after_help = "EXAMPLES:\n    dsr search identities acme\n    dsr search markings TLP"
    )]
    Search(cmd::search::SearchArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DOSSIER_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "dossier=debug,info"
        } else {
            "dossier=info,warn"
        })
    });

    let format = env::var("DOSSIER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let overrides = Overrides {
        url: cli.url.clone(),
        token: cli.token.clone(),
        json: cli.json,
    };
    let config = resolve_config(&project_root, &overrides)?;
    let me = me::resolve_me(cli.me.as_deref(), config.user.me.as_deref());
    let ctx = cmd::Context {
        output: OutputMode::from_resolved(&config.resolved_output),
        config,
        me,
    };

    match cli.command {
        Commands::Show(ref args) => cmd::show::run_show(args, &ctx),
        Commands::Patch(ref args) => cmd::edit::run_patch(args, &ctx),
        Commands::Focus(ref args) => cmd::edit::run_focus(args, &ctx),
        Commands::Author(ref args) => cmd::relations::run_author(args, &ctx),
        Commands::Markings(ref args) => cmd::relations::run_markings(args, &ctx),
        Commands::Search(ref args) => cmd::search::run_search(args, &ctx),
    }
}
