//! One-shot tool that fills missing `image` fields in the catalog file.
//!
//! Writes `<catalog>.bak` first, then looks up each coverless book on Google
//! Books. Set `GOOGLE_BOOKS_API_KEY` to raise the quota and `CATALOG_FILE` to
//! point at a different catalog.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookscout::{
    config::Config,
    services::{catalog, Catalog, GoogleBooksProvider},
};

/// Delay between lookups to stay polite with the API
const PAUSE: Duration = Duration::from_millis(300);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookscout=info,fetch_covers=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let path = PathBuf::from(&config.catalog_file);
    if !path.exists() {
        bail!("Could not find catalog at {}", path.display());
    }

    let mut books = Catalog::from_path(&path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;

    let mut backup = path.clone().into_os_string();
    backup.push(".bak");
    let backup = PathBuf::from(backup);
    books
        .save_to(&backup)
        .with_context(|| format!("Failed to write backup {}", backup.display()))?;
    tracing::info!(backup = %backup.display(), "Backup written");

    let provider = GoogleBooksProvider::new(config.google_books_api_url.clone(), config.api_key());
    let updated = catalog::backfill_covers(&mut books, &provider, PAUSE).await;

    books
        .save_to(&path)
        .with_context(|| format!("Failed to write catalog {}", path.display()))?;

    tracing::info!(
        updated,
        total = books.len(),
        path = %path.display(),
        backup = %backup.display(),
        "Cover backfill done; restore the backup to revert"
    );
    Ok(())
}
