//! Fetch the catalog and print the top songs.
//!
//! ```text
//! cargo run -p core-service --example catalog_demo -- [search terms]
//! ```
//!
//! Set `LYRICS_CATALOG_URL` to point at another endpoint and `RUST_LOG`-style
//! filters through `LYRICS_LOG` (e.g. `core_catalog=debug`).

use anyhow::Context;
use bridge_traits::logger::LogLevel;
use core_runtime::config::CatalogConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut logging = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Info)
        .with_spans(false);
    if let Ok(filter) = std::env::var("LYRICS_LOG") {
        logging = logging.with_filter(filter);
    }
    init_logging(logging).context("initializing logging")?;

    let config = CatalogConfig::builder()
        .endpoint_from_env()
        .build()
        .context("building catalog config")?;
    let core = core_service::bootstrap_desktop(config)
        .await
        .context("bootstrapping desktop core")?;
    let catalog = core.catalog();

    catalog
        .fetch_popular_songs()
        .await
        .context("fetching songs")?;

    println!("Top songs:");
    for (rank, song) in catalog.top_songs().iter().enumerate() {
        let marker = if catalog.is_favorite(song) { "*" } else { " " };
        println!(
            "{:>3}.{} {} - {} ({} views)",
            rank + 1,
            marker,
            song.title(),
            song.artist(),
            song.formatted_views()
        );
    }

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if !query.is_empty() {
        let results = catalog.search_songs(&query);
        println!("\n{} result(s) for '{}':", results.len(), query);
        for song in results {
            println!("  {} - {}", song.title(), song.artist());
            println!("    {}", catalog.preview(&song));
        }
    }

    Ok(())
}
