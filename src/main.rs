use crate::config::Config;
use crate::domain::{normalize, FilterPolicy};
use crate::notify::{Notifier, SlackClient, TrelloClient};
use crate::pipeline::Pipeline;
use crate::scraper::{HttpFetcher, ListingSource, OpenRent, RawListing, SearchCriteria, SpareRoom};
use crate::store::{FileDetailStore, JsonSeenStore};
use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

mod config;
mod domain;
mod errors;
mod notify;
mod pipeline;
mod scraper;
mod store;

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[command(name = "rentwatch", about = "Watch rental sites and announce new listings")]
struct Cli {
    /// Record new listings without sending any notifications
    #[arg(long)]
    nonotify: bool,

    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and normalize one OpenRent listing and print it, storing nothing
    Inspect {
        property_id: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let today = Local::now().date_naive();
    let fetcher = HttpFetcher::new()?;

    match cli.command {
        Some(Commands::Inspect { property_id }) => {
            let criteria = SearchCriteria {
                radius: 0,
                min_value: 0.0,
                max_value: 0.0,
                avail_from: today,
            };
            let page = OpenRent::new(&fetcher, criteria).fetch_listing(&property_id)?;
            let listing = normalize(RawListing::OpenRent(page), today)?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(())
        }
        None => {
            let config = Config::load(&cli.config)
                .with_context(|| format!("loading {}", cli.config.display()))?;
            run(&config, &fetcher, today, !cli.nonotify)
        }
    }
}

fn run(
    config: &Config,
    fetcher: &HttpFetcher,
    today: chrono::NaiveDate,
    notify: bool,
) -> anyhow::Result<()> {
    let criteria = SearchCriteria::from_config(config, today);
    let openrent = OpenRent::new(fetcher, criteria.clone());
    let spareroom = SpareRoom::new(
        fetcher,
        criteria,
        config.spareroom_search_ids.clone(),
        config.page_delay(),
    );
    let sources: [&dyn ListingSource; 2] = [&openrent, &spareroom];

    let notifier = Notifier::new(
        Box::new(SlackClient::new(config.slack_token.clone())),
        Box::new(TrelloClient::new(
            config.trello_key.clone(),
            config.trello_token.clone(),
            config.trello_board.clone(),
        )),
        config.slack_channel.clone(),
        config.work_addresses(),
    );

    let seen = JsonSeenStore::new(config.seen_path());
    let details = FileDetailStore::new(&config.data_dir);
    let policy = FilterPolicy::from_config(config, today);

    let pipeline = Pipeline::new(&seen, &details, &notifier, &policy, today);
    let reports = pipeline.run(&sources, &config.areas(), notify)?;

    let notified: usize = reports.iter().map(|r| r.notified).sum();
    let stored: usize = reports.iter().map(|r| r.stored).sum();
    info!(
        "Run complete: {} passes, {} listings stored, {} notifications sent",
        reports.len(),
        stored,
        notified
    );
    Ok(())
}
