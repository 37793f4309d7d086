mod cli;
mod config;
mod core;
mod error;

use crate::cli::{Cli, Mode, USAGE};
use crate::config::Config;
use crate::core::{
    ChatClient, DiscoveryService, JsonSpanExtractor, LedgerStore, Pipeline, ReviewClassifier,
    TranscriptService, display_score, rank_reviews,
};
use crate::error::Result;
use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            tracing::debug!("argument error: {err}");
            usage_exit()
        }
    };

    let mode = match cli.mode() {
        Ok(mode) => mode,
        Err(e) => {
            println!("{e}");
            usage_exit()
        }
    };

    let config = Config::from_env()
        .with_handle(cli.handle.clone())
        .with_ledger_paths(cli.processed.clone(), cli.reviews.clone())
        .with_json_mode(cli.json_mode);

    match mode {
        Mode::Discover => run_discover(&config).await?,
        Mode::Leaderboard => run_leaderboard(&config).await,
        Mode::Process(video_ids) => run_process(&config, &video_ids, cli.checkpoint).await?,
    }

    Ok(())
}

fn usage_exit() -> ! {
    println!("{USAGE}");
    std::process::exit(1)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_discover(config: &Config) -> Result<()> {
    println!("Searching for latest videos for: {}", config.handle);

    let ledgers = LedgerStore::new(config.ledger_paths.clone());
    let processed = ledgers.processed_ids().await;

    let discovery = DiscoveryService::new(&config.handle)?
        .discover(&processed)
        .await?;

    println!(
        "Found {} listed videos, {} not processed yet",
        discovery.listed.len(),
        discovery.pending.len()
    );
    println!("{}", serde_json::to_string(&discovery.pending)?);

    if !discovery.pending.is_empty() {
        println!("{}", discovery.pending.join(","));
    }

    Ok(())
}

async fn run_leaderboard(config: &Config) {
    let ledgers = LedgerStore::new(config.ledger_paths.clone());
    let ranked = rank_reviews(ledgers.reviews().await);

    if ranked.is_empty() {
        println!("No reviews found in {}.", config.ledger_paths.reviews.display());
        return;
    }

    println!("{:<6} {:<8} {:<50} Video", "Rank", "Score", "Description");
    for (index, review) in ranked.iter().enumerate() {
        let description: String = review.description.chars().take(48).collect();
        println!(
            "{:<6} {:<8} {:<50} {}",
            index + 1,
            display_score(&review.score),
            description,
            review.video_url
        );
    }
}

async fn run_process(config: &Config, video_ids: &[String], checkpoint: bool) -> Result<()> {
    println!("Processing {} videos for @{}", video_ids.len(), config.handle);

    let ledgers = LedgerStore::new(config.ledger_paths.clone());
    let classifier = ReviewClassifier::new(ChatClient::new(config), JsonSpanExtractor::new()?);
    let pipeline = Pipeline::new(
        &config.handle,
        TranscriptService::new(config)?,
        classifier,
        &ledgers,
    )
    .with_checkpoint(checkpoint);

    let outcome = pipeline.run(video_ids).await?;

    println!();
    println!("Videos processed: {}", outcome.processed_ids.len());
    println!("Reviews added:    {}", outcome.new_reviews.len());
    println!("Unusable replies: {}", outcome.unusable);
    println!("Review ledger now holds {} reviews", ledgers.reviews().await.len());
    println!(
        "Ledgers updated: {}, {}",
        config.ledger_paths.reviews.display(),
        config.ledger_paths.processed.display()
    );

    Ok(())
}
