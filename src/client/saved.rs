//! Saved-image listing fetch.

use tracing::info;

use super::HttpClient;
use crate::config::Settings;
use crate::error::Result;
use crate::listing::{parse_listing_at, ImageEntry};

/// Fetch the saved-images directory listing and extract its image entries.
///
/// Entries come back in listing order; sorting happens in pagination.
pub async fn fetch_saved_entries(
    client: &HttpClient,
    settings: &Settings,
    feed_id: Option<&str>,
) -> Result<Vec<ImageEntry>> {
    let path = settings.saved_listing_path(feed_id);
    let response = client.get(&path).await?;
    let document_url = response.url.clone();
    let html = response.text().await?;

    let entries = parse_listing_at(&html, Some(&document_url), &path, &settings.image_suffix);
    info!("Found {} saved images under {}", entries.len(), path);
    Ok(entries)
}
