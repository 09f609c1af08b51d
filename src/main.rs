use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use newsfeed::config::Config;
use newsfeed::display::{page_back, render_row, DisplayList, PagingEnd, PagingOptions};
use newsfeed::feed::FetchCoordinator;
use newsfeed::source::HttpFeedSource;
use std::path::PathBuf;

/// Get the default config file path (~/.config/newsfeed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("newsfeed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "newsfeed", about = "Page back through a news feed, one time window at a time")]
struct Args {
    /// Config file (defaults to ~/.config/newsfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// API base URL, overriding the config file
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Older pages to load after the first one
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Maximum row width in columns
    #[arg(long, default_value_t = 100)]
    width: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only feed rows
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    tracing::debug!(?config, "Effective configuration");

    let client = reqwest::Client::builder()
        .user_agent(concat!("newsfeed/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let source = HttpFeedSource::new(
        client,
        &config.endpoint,
        config.access_token(),
        config.source_options(),
    )
    .with_context(|| format!("Invalid API endpoint '{}'", config.endpoint))?;

    let (coordinator, mut events) = FetchCoordinator::new(source, config.coordinator_options())
        .context("Failed to start feed coordinator")?;
    let mut list = DisplayList::new();
    let options = PagingOptions { pages: args.pages };
    let width = args.width;

    let paging = page_back(&coordinator, &mut events, &mut list, options, |rows| {
        let now = Utc::now().timestamp();
        for item in rows {
            println!("{}", render_row(item, now, width));
        }
    });

    let end = tokio::select! {
        biased;

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down");
            None
        }
        end = paging => Some(end?),
    };

    match end {
        Some(PagingEnd::Exhausted) => println!("-- no older items --"),
        Some(PagingEnd::Failed(error)) => eprintln!("Error: {}", error),
        Some(PagingEnd::PagesDone) | None => {}
    }
    println!("{} items loaded", list.count());
    Ok(())
}
