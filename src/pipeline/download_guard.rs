// Ghibli Assets Download Guard
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Screens image URLs before fetch and turns upstream film ids into
// file-name-safe stems. Both inputs come from a remote API we don't control.

use std::collections::HashMap;
use tracing::warn;
use url::Url;

const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

pub struct DownloadGuard;

impl DownloadGuard {
    /// Validate an image URL before downloading. Returns the parsed URL if safe.
    pub fn validate_url(raw: &str) -> Result<Url, String> {
        let url = Url::parse(raw.trim()).map_err(|e| format!("Invalid URL '{}': {}", raw, e))?;

        if !ALLOWED_SCHEMES.contains(&url.scheme()) {
            warn!("[GUARD] Blocked URL with scheme '{}': {}", url.scheme(), raw);
            return Err(format!(
                "Unsupported scheme '{}' — only http(s) image URLs are fetched",
                url.scheme()
            ));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(format!("URL has no host: {}", raw));
        }

        Ok(url)
    }

    /// Strip path traversal and reserved characters so an id can name a file.
    pub fn sanitize_filename(name: &str) -> String {
        name.replace("..", "")
            .replace('/', "_")
            .replace('\\', "_")
            .replace('\0', "")
            .replace(':', "_")
            .replace('*', "_")
            .replace('?', "_")
            .replace('"', "_")
            .replace('<', "_")
            .replace('>', "_")
            .replace('|', "_")
            .trim()
            .to_string()
    }

    /// Sanitized stem for a film id, or an error if nothing usable remains.
    pub fn file_stem_for(id: &str) -> Result<String, String> {
        let stem = Self::sanitize_filename(id);
        if stem.is_empty() {
            return Err(format!("Film id '{}' cannot be used as a file name", id));
        }
        Ok(stem)
    }
}

/// File stems handed out during one run. Two different ids that sanitize to
/// the same stem would share temp and output files, so the later one is refused.
#[derive(Debug, Default)]
pub struct StemClaims {
    owners: HashMap<String, String>,
}

impl StemClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stem for `film_id`, reserved for it. Claiming the same id again is fine.
    pub fn claim(&mut self, film_id: &str) -> Result<String, String> {
        let stem = DownloadGuard::file_stem_for(film_id)?;
        match self.owners.get(&stem) {
            Some(owner) if owner != film_id => {
                warn!(
                    "[GUARD] Film id '{}' collides with '{}' on file stem '{}'",
                    film_id, owner, stem
                );
                Err(format!(
                    "Film id '{}' maps to file stem '{}' already used by film '{}'",
                    film_id, stem, owner
                ))
            }
            Some(_) => Ok(stem),
            None => {
                self.owners.insert(stem.clone(), film_id.to_string());
                Ok(stem)
            }
        }
    }
}
