//! # coursenav CLI
//!
//! Command-line interface for the coursenav content indexer.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "coursenav")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (optional)
    #[arg(long, global = true, default_value = "coursenav.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a content directory and write navigation, quizzes and report
    Index {
        /// Content directory (defaults to `content_dir` from the config)
        content_dir: Option<PathBuf>,

        /// Output directory (defaults to `output_dir` from the config)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Treat recoverable issues as fatal
        #[arg(long)]
        strict: bool,

        /// Pretty-print the JSON artifacts
        #[arg(long)]
        pretty: bool,

        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Worker threads for parsing (0 = one per core)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Run the indexer without writing any output
    Check {
        /// Content directory (defaults to `content_dir` from the config)
        content_dir: Option<PathBuf>,

        /// Treat recoverable issues as fatal
        #[arg(long)]
        strict: bool,

        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing; stdout stays free for --json output
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", err);
    }

    let result = match cli.command {
        Commands::Index {
            content_dir,
            out,
            strict,
            pretty,
            json,
            threads,
        } => commands::index_content(
            &cli.config,
            commands::IndexOptions {
                content_dir,
                out,
                strict,
                pretty,
                json,
                threads,
            },
        ),
        Commands::Check {
            content_dir,
            strict,
            json,
        } => commands::check_content(&cli.config, content_dir, strict, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(commands::exit_code(&err))
        }
    }
}
