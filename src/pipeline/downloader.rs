// Ghibli Assets Downloader
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Streams a single remote image into its fixed temp path. Names are
// deterministic ({id}-{role}.jpg), so callers must not run two downloads
// for the same film and role at once.

use crate::config::{OUTPUT_EXTENSION, TEMP_EXTENSION};
use crate::pipeline::download_guard::DownloadGuard;
use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Which of a film's two images is being handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    Poster,
    Banner,
}

impl ImageRole {
    /// Processing order within a film.
    pub const ALL: [ImageRole; 2] = [ImageRole::Poster, ImageRole::Banner];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageRole::Poster => "poster",
            ImageRole::Banner => "banner",
        }
    }

    fn file_name(&self, stem: &str, extension: &str) -> String {
        format!("{}-{}.{}", stem, self.as_str(), extension)
    }

    /// `{dir}/{stem}-{role}.jpg`
    pub fn temp_path(&self, image_dir: &Path, stem: &str) -> PathBuf {
        image_dir.join(self.file_name(stem, TEMP_EXTENSION))
    }

    /// `{dir}/{stem}-{role}.webp`
    pub fn output_path(&self, image_dir: &Path, stem: &str) -> PathBuf {
        image_dir.join(self.file_name(stem, OUTPUT_EXTENSION))
    }

    /// Site-relative path stored in the mapping, e.g. `/images/{stem}-poster.webp`.
    pub fn public_path(&self, public_prefix: &str, stem: &str) -> String {
        format!(
            "{}/{}",
            public_prefix.trim_end_matches('/'),
            self.file_name(stem, OUTPUT_EXTENSION)
        )
    }
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remove `path` if it exists. A file that is already gone is not an error.
pub async fn remove_stale(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!("[DOWNLOAD] Removed stale file {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Removing stale file {:?}", path)),
    }
}

/// Download `url` into `dest`, returning the number of bytes written.
///
/// Any file already at `dest` (a temp kept by an earlier failed conversion)
/// is removed first, so on every error path `dest` does not exist afterward.
/// A transport or write error mid-body removes the partial file.
pub async fn download_image(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    remove_stale(dest).await?;

    let url = DownloadGuard::validate_url(url).map_err(anyhow::Error::msg)?;
    debug!("[DOWNLOAD] GET {} -> {:?}", url, dest);

    let mut response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Requesting {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Image request to {} failed with status {}", url, status);
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Creating {:?}", parent))?;
    }

    let mut file = File::create(dest)
        .await
        .with_context(|| format!("Creating temp file {:?}", dest))?;

    let mut written: u64 = 0;
    let streamed: Result<()> = async {
        while let Some(chunk) = response.chunk().await.context("Reading image body")? {
            file.write_all(&chunk).await.context("Writing temp file")?;
            written += chunk.len() as u64;
        }
        file.flush().await.context("Flushing temp file")?;
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Err(e) = streamed {
        drop(file);
        if let Err(rm_err) = tokio::fs::remove_file(dest).await {
            warn!("[DOWNLOAD] Could not remove partial file {:?}: {}", dest, rm_err);
        }
        return Err(e.context(format!("Downloading {}", url)));
    }

    info!("[DOWNLOAD] Saved {} bytes to {:?}", written, dest);
    Ok(written)
}
