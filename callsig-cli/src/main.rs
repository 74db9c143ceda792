//! callsig CLI - Command-line interface for callsig
//!
//! Checks call signatures and searches JavaScript/TypeScript code for calls
//! that match them.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "callsig")]
#[command(author = "callsig Contributors")]
#[command(version)]
#[command(about = "Find calls that match a call signature", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file mapping node kinds to the child fields to traverse,
    /// merged over the defaults
    #[arg(long, global = true)]
    keys: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a signature and show its parameters
    Check {
        /// Signature such as "obj.method(a, [b])"
        signature: String,
    },

    /// Search files for calls matching a signature
    Find {
        /// Signature such as "obj.method(a, [b])"
        signature: String,

        /// Files or directories to search (defaults to current directory)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,

        /// Maximum matches to report
        #[arg(short, long)]
        limit: Option<usize>,

        /// Follow symbolic links when walking directories
        #[arg(long)]
        follow_symlinks: bool,
    },

    /// Print the expression tree of a snippet as JSON
    Ast {
        /// JavaScript or TypeScript source
        source: String,

        /// Parse with the TSX grammar
        #[arg(long)]
        tsx: bool,

        /// Strip source positions
        #[arg(long)]
        purify: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = commands::load_keys(cli.keys.as_deref()).and_then(|keys| match cli.command {
        Commands::Check { signature } => commands::check(&signature, keys),
        Commands::Find {
            signature,
            paths,
            json,
            limit,
            follow_symlinks,
        } => {
            let options = commands::FindOptions {
                json,
                limit,
                follow_symlinks,
            };
            commands::find(&signature, &paths, keys, options)
        }
        Commands::Ast {
            source,
            tsx,
            purify,
        } => commands::ast(&source, tsx, purify),
    });

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
