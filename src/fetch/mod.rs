//! Retrieval of raw dataset bytes.
//!
//! A source is either an `http(s)` URL, fetched through an [`HttpClient`],
//! or a path on the local filesystem. Gzip payloads are decoded on the way
//! out, whichever way they arrived.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Returns `true` when `source` should be fetched over HTTP rather than read
/// from disk.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Loads `source` from the network or the filesystem and gunzips it when the
/// payload carries the gzip magic bytes.
#[tracing::instrument(skip(client), fields(source = %source))]
pub async fn read_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if is_remote(source) {
        fetch_bytes(client, source).await?
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("could not read {source}"))?
    };
    debug!(bytes = bytes.len(), "Source bytes received");
    maybe_gunzip(bytes)
}

pub fn maybe_gunzip(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }

    let mut decoded = Vec::with_capacity(bytes.len() * 4);
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut decoded)
        .context("gzip payload is corrupt")?;
    debug!(compressed = bytes.len(), decoded = decoded.len(), "Gzip payload decoded");
    Ok(decoded)
}
