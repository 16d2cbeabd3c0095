//! keiba-scraper CLI
//!
//! Fetches netkeiba race pages and prints their scraped fields.

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keiba_scraper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Card { race_id } => cli::run_card(race_id).await,
        Commands::Result { race_id } => cli::run_result(race_id).await,
        Commands::Odds { race_id } => cli::run_odds(race_id).await,
        Commands::Horse { horse_id } => cli::run_horse(horse_id).await,
        Commands::Training { race_id } => cli::run_training(race_id).await,
        Commands::Search {
            name,
            venue,
            distance,
            course,
            start_year,
            start_month,
            end_year,
            end_month,
        } => {
            cli::run_search(
                name,
                venue,
                distance,
                course,
                start_year,
                start_month,
                end_year,
                end_month,
            )
            .await
        }
    }
}
