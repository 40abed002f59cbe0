pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pagesift")]
#[command(
    about = "Fetch or render web pages and extract their readable content",
    long_about = None
)]
pub struct Cli {
    /// Config file (default: ~/.config/pagesift/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of pages scraped at once (default: scraper.max_concurrency)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP scrape endpoint
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Scrape one or more URLs and print the extracted content
    Scrape {
        /// URLs to scrape; a missing scheme defaults to https
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a saved HTML file for bot-protection checkpoints
    Classify {
        /// Path to the HTML file
        path: PathBuf,
    },
}
