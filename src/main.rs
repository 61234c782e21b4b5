mod catalog;
mod config;
mod error;
mod submission;
mod voting;
mod web;

use std::process;
use std::sync::Arc;

use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use catalog::JsonFileCatalog;
use config::Config;
use submission::{MemorySink, SubmissionSink};
use web::{AppState, PgSubmissionSink};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "song_vote=info".into()))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            process::exit(1);
        }
    };

    let catalog = Arc::new(JsonFileCatalog::new(config.catalog_path.clone()));
    let sink: Arc<dyn SubmissionSink> = match config.database_url.clone() {
        Some(url) => Arc::new(PgSubmissionSink::new(url)),
        None => {
            warn!("DATABASE_URL not set, ballots will only be kept in memory");
            Arc::new(MemorySink::default())
        }
    };

    let state = AppState::new(catalog, sink, config.max_votes, config.session_ttl);
    web::setup(config.bind_addr, state).await;
}
