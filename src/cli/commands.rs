use std::path::Path;

use serde_json::json;

use crate::app::{AppContext, Result, SiftError};
use crate::scraper::extractor::{page_title, truncate_chars};
use crate::scraper::{CheckpointClassifier, PipelineError, ScrapeOutcome};

/// Preview length for plain-text output
const CONTENT_PREVIEW_CHARS: usize = 300;

pub async fn serve(ctx: &AppContext, host: Option<&str>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or(&ctx.config.server.host);
    let port = port.unwrap_or(ctx.config.server.port);

    crate::server::serve(ctx.pipeline.clone(), host, port).await
}

pub async fn scrape_urls(ctx: &AppContext, urls: Vec<String>, as_json: bool) -> Result<()> {
    if !as_json {
        println!("Scraping {} URL(s)...", urls.len());
    }

    let results = ctx.parallel_scraper.scrape_all(urls).await;
    let errors = results.iter().filter(|(_, r)| r.is_err()).count();

    if as_json {
        let values: Vec<_> = results
            .iter()
            .map(|(url, result)| result_json(url, result))
            .collect();
        let out = serde_json::to_string_pretty(&values)
            .map_err(|e| SiftError::Other(format!("Failed to encode results: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    for (url, result) in &results {
        match result {
            Ok(outcome) => {
                println!("\n{}", outcome.data.title);
                println!("  {}", outcome.data.url);
                println!("  via {} fetch, {} extraction", outcome.tier, outcome.method);
                println!("  {}", outcome.data.description);
                println!(
                    "\n{}",
                    truncate_chars(&outcome.data.content, CONTENT_PREVIEW_CHARS)
                );
            }
            Err(e) => {
                eprintln!("\n! {} - {}", url, e);
            }
        }
    }

    println!(
        "\nScrape complete: {} succeeded, {} errors",
        results.len() - errors,
        errors
    );
    Ok(())
}

/// Run the checkpoint classifier over a saved page
pub fn classify_file(path: &Path) -> Result<()> {
    let html = std::fs::read_to_string(path)?;
    let title = page_title(&html);
    let verdict = CheckpointClassifier::default().classify(&html, &title);

    println!("Title: {}", title);
    if verdict.is_checkpoint {
        println!("Checkpoint: {}", verdict.kind);
        println!("  {}", verdict.message);
    } else {
        println!("No checkpoint detected");
    }

    Ok(())
}

/// Same shape as the HTTP response, plus the source URL and tier
fn result_json(
    url: &str,
    result: &std::result::Result<ScrapeOutcome, PipelineError>,
) -> serde_json::Value {
    match result {
        Ok(outcome) => json!({
            "url": url,
            "success": true,
            "data": outcome.data,
            "extractionMethod": outcome.method,
            "tier": outcome.tier.to_string(),
        }),
        Err(e) => json!({
            "url": url,
            "success": false,
            "error": e.to_string(),
        }),
    }
}
