use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{config::load_settings, HttpCatalogClient, ProductListing};
use shared::domain::{QueryState, SortField, SortOrder};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod input;
mod session;
mod view;

use session::run_session;

#[derive(Parser, Debug)]
#[command(about = "Search and sort the remote product catalog")]
struct Args {
    /// Overrides `api_base_url` from storefront.toml / the environment.
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long)]
    debounce_ms: Option<u64>,
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long, default_value_t = SortField::Title)]
    sort_by: SortField,
    #[arg(long, default_value_t = SortOrder::Asc)]
    sort_order: SortOrder,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.api_base_url {
        settings.api_base_url = url;
    }
    if let Some(ms) = args.debounce_ms {
        settings.search_debounce_ms = ms;
    }
    info!(
        api_base_url = %settings.api_base_url,
        debounce_ms = settings.search_debounce_ms,
        "starting storefront"
    );

    let client = HttpCatalogClient::new(&settings.api_base_url)
        .context("failed to configure catalog client")?;
    let listing = ProductListing::with_query(
        Arc::new(client),
        QueryState::new(args.search, args.sort_by, args.sort_order),
    );

    println!("{}", view::render_controls());
    run_session(
        BufReader::new(tokio::io::stdin()),
        listing,
        settings.search_debounce(),
        std::io::stdout(),
    )
    .await?;
    Ok(())
}
