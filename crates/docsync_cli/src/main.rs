//! docsync CLI
//!
//! Command-line tools for inspecting the docsync core.
//!
//! # Commands
//!
//! - `order` - Print the insertion order of revision history fragments
//! - `stage` - Stage a file as an attachment and verify it
//! - `query` - Compile index criteria into a query
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// docsync command-line tools.
#[derive(Parser)]
#[command(name = "docsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the insertion order of revision history fragments
    Order {
        /// JSON file holding an array of fragments in replication wire form
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Stage a file as an attachment and verify its length
    Stage {
        /// File holding the attachment bytes
        file: PathBuf,

        /// Declared content type
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,

        /// Declared encoding (identity, gzip)
        #[arg(long)]
        encoding: Option<String>,

        /// Declared decoded length (defaults to the file size)
        #[arg(long)]
        length: Option<u64>,

        /// Declared encoded length (defaults to the decoded length)
        #[arg(long)]
        encoded_length: Option<u64>,

        /// Directory for temporary staging files (defaults to the OS temp dir)
        #[arg(long)]
        staging_dir: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Compile index criteria into a query
    Query {
        /// JSON file holding an array of criteria
        file: PathBuf,

        /// Emit `?` placeholders and the values to bind
        #[arg(short, long)]
        parameterized: bool,

        /// Drop unsupported membership values instead of failing
        #[arg(long)]
        permissive: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Order { file, format } => {
            commands::order::run(&file, &format)?;
        }
        Commands::Stage {
            file,
            content_type,
            encoding,
            length,
            encoded_length,
            staging_dir,
            format,
        } => {
            let options = commands::stage::StageOptions {
                content_type,
                encoding,
                length,
                encoded_length,
                staging_dir,
            };
            commands::stage::run(&file, &options, &format)?;
        }
        Commands::Query {
            file,
            parameterized,
            permissive,
        } => {
            commands::query::run(&file, parameterized, permissive)?;
        }
        Commands::Version => {
            println!("docsync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("docsync core v{}", docsync_core::VERSION);
        }
    }

    Ok(())
}
