//! # pagecraft
//!
//! Command-line tool for pagecraft pages.
//!
//! ## Commands
//!
//! - `compile`: Write `index.html`, `styles.css`, `app.js` and `_headers`
//! - `manifest`: Print the content hash of every file that would be deployed
//! - `deploy`: Save, compile and publish a page
//! - `check`: Report legacy fixes and elements the compiler cannot place
//!
//! ## Example
//!
//! ```bash
//! # Compile locally
//! pagecraft compile page.json --out dist/
//!
//! # Publish to a throwaway in-memory host
//! pagecraft deploy page.json --mock
//!
//! # Publish for real and record the site in page.json
//! PAGECRAFT_HOST_TOKEN=... pagecraft --config pagecraft.toml deploy page.json --write-back
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod file_store;

use commands::{check, compile, deploy, manifest};
use config::Config;

/// Compile, check and deploy pagecraft pages.
#[derive(Parser, Debug)]
#[command(name = "pagecraft")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a page into static files
    Compile {
        /// Page document (JSON)
        page: PathBuf,

        /// Output directory
        #[arg(long, short, default_value = "dist")]
        out: PathBuf,
    },

    /// Print the deployment manifest (path and SHA-256 per file)
    Manifest {
        /// Page document (JSON)
        page: PathBuf,
    },

    /// Publish a page to the hosting provider
    Deploy {
        /// Page document (JSON)
        page: PathBuf,

        /// Use an in-memory host instead of the hosting API (for testing/demo)
        #[arg(long)]
        mock: bool,

        /// Save the document and publish result back into the page file
        #[arg(long)]
        write_back: bool,
    },

    /// Validate a page document
    Check {
        /// Page document (JSON)
        page: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path).context("Failed to load configuration")?,
        None => Config::default(),
    };
    init_logging(&config);

    match cli.command {
        Commands::Compile { page, out } => compile::run(&page, &out).await?,
        Commands::Manifest { page } => manifest::run(&page).await?,
        Commands::Deploy {
            page,
            mock,
            write_back,
        } => deploy::run(&config, &page, mock, write_back).await?,
        Commands::Check { page } => check::run(&page).await?,
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` overrides the configured filter.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
