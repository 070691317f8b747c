use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{config::load_settings, posts, HttpCatalogClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod page;
mod site;

#[derive(Parser, Debug)]
#[command(about = "Pre-render post detail pages from the remote catalog")]
struct Cli {
    /// Overrides `api_base_url` from storefront.toml / the environment.
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the slugs that get a pre-rendered page, as JSON.
    Params,
    /// Render one post page to stdout.
    Render { slug: String },
    /// Render every post page under `<out-dir>/blog/<slug>/index.html`.
    Build {
        #[arg(long, default_value = "dist")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(url) = cli.api_base_url {
        settings.api_base_url = url;
    }
    let client = HttpCatalogClient::new(&settings.api_base_url)
        .context("failed to configure catalog client")?;

    match cli.command {
        Command::Params => {
            let params = posts::static_params(&client).await?;
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
        Command::Render { slug } => {
            let post = posts::load_post(&client, &slug).await?;
            print!("{}", page::render_post(&post));
        }
        Command::Build { out_dir } => {
            let written = site::build_site(&client, &out_dir).await?;
            info!(pages = written.len(), out_dir = %out_dir.display(), "site build finished");
            println!("wrote {} pages to {}", written.len(), out_dir.display());
        }
    }

    Ok(())
}
