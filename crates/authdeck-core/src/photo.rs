//! Profile photo fetching.
//!
//! The user panel shows photo metadata, not pixels, so fetching resolves a
//! URL to decoded dimensions and format. Staleness handling (latest-wins)
//! lives with the UI state, not here.

use anyhow::{Context, Result};

/// Decoded photo metadata for the user panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoMeta {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub bytes: usize,
}

/// Fetches a photo URL and decodes its metadata.
pub async fn fetch_photo(http: &reqwest::Client, url: &str) -> Result<PhotoMeta> {
    tracing::debug!(url, "fetching profile photo");
    let response = http
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch photo from {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("Photo fetch failed (HTTP {status})");
    }

    let bytes = response
        .bytes()
        .await
        .context("Failed to read photo body")?;
    decode_meta(&bytes)
}

/// Decodes image metadata from raw bytes.
pub fn decode_meta(bytes: &[u8]) -> Result<PhotoMeta> {
    let format = image::guess_format(bytes).context("Unrecognized image format")?;
    let image = image::load_from_memory(bytes).context("Failed to decode image")?;
    Ok(PhotoMeta {
        width: image.width(),
        height: image.height(),
        format: format!("{format:?}").to_lowercase(),
        bytes: bytes.len(),
    })
}
