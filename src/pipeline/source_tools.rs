// Ghibli Assets Source Tools - Film Acquisition
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Fetches the film list from the upstream API. A failure here is fatal
// to the run; there is no retry.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One film as returned by the films endpoint. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Poster URL
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub movie_banner: Option<String>,
}

impl Film {
    pub fn poster_url(&self) -> Option<&str> {
        non_empty(self.image.as_deref())
    }

    pub fn banner_url(&self) -> Option<&str> {
        non_empty(self.movie_banner.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Shared HTTP client. No timeout is set beyond reqwest's defaults.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("ghibli-assets/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Building HTTP client")
}

/// GET the films endpoint and parse it as a JSON array of films.
pub async fn fetch_films(client: &Client, api_url: &str) -> Result<Vec<Film>> {
    info!("[FETCH] Requesting film list from {}", api_url);

    let films: Vec<Film> = client
        .get(api_url)
        .send()
        .await
        .with_context(|| format!("Requesting film list from {}", api_url))?
        .error_for_status()
        .context("Film list request returned an error status")?
        .json()
        .await
        .context("Film list response is not a JSON array of films")?;

    info!("[FETCH] Received {} films", films.len());
    Ok(films)
}
