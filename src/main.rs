// src/main.rs

//! Trawler: social timeline crawler CLI.
//!
//! Downloads all available posts for a list of account handles and,
//! optionally, for their friend/follower network to a bounded depth.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};

use trawler::error::Result;
use trawler::models::{Config, Credentials};
use trawler::pipeline::{CrawlOptions, run_crawl, run_validate};
use trawler::utils::run_dir_name;

/// Trawler - timeline and friend/follower crawler
#[derive(Parser, Debug)]
#[command(
    name = "trawler",
    version,
    about = "Social-network timeline and friend/follower crawler"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "trawler.toml")]
    config: PathBuf,

    /// Path to the API credentials file (default: ~/.trawler/credentials.toml)
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl timelines for the seed accounts and their FF network
    Crawl {
        /// Text file with one account handle per line
        #[arg(short, long)]
        seeds: PathBuf,

        /// Output directory (default: data/<timestamp>/)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Friend/follower expansion depth. A value of 1 also crawls
        /// every friend and follower of the seed accounts.
        #[arg(short, long, default_value_t = 0)]
        depth: u32,

        /// Compress saved timelines with gzip
        #[arg(long)]
        gzip: bool,
    },

    /// Validate configuration and credentials
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn default_credentials_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".trawler").join("credentials.toml")
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    let credentials_path = cli.credentials.clone().unwrap_or_else(default_credentials_path);

    match cli.command {
        Command::Crawl {
            seeds,
            output,
            depth,
            gzip,
        } => {
            let credentials = Credentials::load(&credentials_path)?;
            let output_dir = output
                .unwrap_or_else(|| PathBuf::from("data").join(run_dir_name(Utc::now())));

            let opts = CrawlOptions {
                seeds_file: seeds,
                output_dir,
                depth,
                compressed: gzip,
            };
            run_crawl(&config, credentials, &opts).await?;
        }
        Command::Validate => run_validate(&config, &credentials_path)?,
    }

    Ok(())
}
