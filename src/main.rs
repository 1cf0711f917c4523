// This is the entry point of the site-data generator.
//
// **Architecture Overview:**
// - `core/` = Conversion and traversal logic (no network, no filesystem)
// - `infra/` = Implementations of core traits (Google APIs, cache, image files, outputs)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Collect every document below the configured Drive folder
// 4. Write the page data (and optionally standalone pages)

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::core::config::SiteConfig;
use crate::core::site::SiteCollector;
use crate::infra::google::{FetchCache, GoogleDriveClient, ServiceAccountAuth};
use crate::infra::images::ImageDownloader;
use crate::infra::output::{render_pages, write_page_data};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SiteConfig::from_env().context("Failed to load configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // One HTTP client shared by auth, API calls and image downloads.

    let http = reqwest::Client::builder()
        .user_agent(concat!("drive-docs-site/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let auth = ServiceAccountAuth::new(config.service_account.clone(), http.clone())
        .context("Failed to set up service account authentication")?;
    let cache = FetchCache::new(&config.cache_dir, config.cache_duration);
    let drive = GoogleDriveClient::new(http.clone(), auth, cache);
    let images = ImageDownloader::new(http, config.image_dir(), config.image_url_path.clone());
    let collector = SiteCollector::new(drive, images, config.path_prefix.clone());

    tracing::info!(folder_id = %config.root_folder_id, "Collecting documents from Google Drive");

    let records = collector
        .collect(&config.root_folder_id)
        .await
        .context("Failed to collect documents from Google Drive")?;

    write_page_data(&config.data_file, &records)
        .await
        .context("Failed to write page data")?;

    if config.render_pages {
        render_pages(&config.output_dir, &records)
            .await
            .context("Failed to render pages")?;
    }

    Ok(())
}
