//! rem CLI - markup renderer.
//!
//! Provides commands for:
//! - `render`: Render a text file (or stdin) to an HTML fragment
//! - `grammar`: Print the rule table of a markup grammar

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{GrammarArgs, RenderArgs};
use output::Output;

/// rem - Markup renderer.
#[derive(Parser)]
#[command(name = "rem", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render text to an HTML fragment.
    Render(RenderArgs),
    /// Print a markup grammar in PEG notation.
    Grammar(GrammarArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Grammar(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// `--verbose` enables INFO level, otherwise use `rust_log` or default to WARN.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("info");
    }
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}
