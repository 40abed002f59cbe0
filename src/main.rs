use std::path::Path;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pagesift::app::AppContext;
use pagesift::cli::{commands, Cli, Commands};
use pagesift::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        // Works on a saved file, no config or browser needed
        Commands::Classify { path } => {
            commands::classify_file(&path)?;
        }
        Commands::Serve { host, port } => {
            let ctx = context(cli.config.as_deref(), cli.workers)?;
            commands::serve(&ctx, host.as_deref(), port).await?;
        }
        Commands::Scrape { urls, json } => {
            let ctx = context(cli.config.as_deref(), cli.workers)?;
            commands::scrape_urls(&ctx, urls, json).await?;
        }
    }

    Ok(())
}

fn context(config_path: Option<&Path>, workers: Option<usize>) -> anyhow::Result<AppContext> {
    let config = Config::load(config_path)?;
    let workers = workers.unwrap_or(config.scraper.max_concurrency);
    Ok(AppContext::with_workers(config, workers)?)
}
