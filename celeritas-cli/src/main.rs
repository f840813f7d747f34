//! Celeritas — application scaffold CLI.
//!
//! # Usage
//!
//! ```text
//! celeritas new <path>
//! celeritas render <view> [--root <path>] [--engine go|jet] [--var KEY=VALUE]... [--user <id>]
//! celeritas config [--root <path>] [--json]
//! ```
//!
//! Configuration is read from the environment after loading `<root>/.env`.
//! Variables already set in the process environment take precedence.

mod commands;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigArgs, new::NewArgs, render::RenderArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "celeritas",
    version,
    about = "Scaffold and render Celeritas web applications",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the application folder layout and an empty .env file.
    New(NewArgs),

    /// Render a view to stdout using the configured engine and session store.
    Render(RenderArgs),

    /// Show the resolved renderer and session configuration.
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::New(args) => args.run(),
        Commands::Render(args) => args.run(),
        Commands::Config(args) => args.run(),
    }
}

/// Log to stderr so rendered output on stdout stays clean. A second
/// initialisation is ignored.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
