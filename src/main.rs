use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

mod catalog;
mod cli;
mod config;
mod embedding;
mod products;
mod search;
#[cfg(test)]
mod tests;
mod web;

use catalog::{CatalogRemote, CatalogStore};
use config::Config;
use embedding::{EmbeddingProvider, HttpEmbeddingProvider};
use search::SearchService;

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();
    let mut config = Config::load();

    if let cli::Command::Search {
        limit: Some(limit), ..
    } = &args.command
    {
        config.search.result_limit = *limit;
    }

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbeddingProvider::new(
        &config.provider.base_url,
        Duration::from_secs(config.provider.timeout_secs),
    )?);
    let store: Arc<dyn CatalogStore> = Arc::new(CatalogRemote::new(
        &config.catalog.base_url,
        &config.catalog.api_key,
        Duration::from_secs(config.catalog.timeout_secs),
    )?);

    match args.command {
        cli::Command::Daemon { addr } => {
            let service = Arc::new(SearchService::new(
                provider.clone(),
                store.clone(),
                &config.search,
            ));
            web::start_daemon(service, store, provider, &addr);
            Ok(())
        }

        cli::Command::Search { query, .. } => {
            let service = SearchService::new(provider, store, &config.search);
            let results = service.search(&query)?;
            println!("{}", serde_json::to_string_pretty(&results).unwrap());
            Ok(())
        }

        cli::Command::Products => {
            let products = store.list_products()?;
            println!("{}", serde_json::to_string_pretty(&products).unwrap());
            Ok(())
        }

        cli::Command::Analyze { image_url } => {
            let embedding = provider.embed_image(&image_url)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "embedding": embedding }))
                    .unwrap()
            );
            Ok(())
        }

        cli::Command::Warmup => {
            let elapsed = provider.warmup()?;
            println!("provider answered in {}ms", elapsed.as_millis());
            Ok(())
        }
    }
}
