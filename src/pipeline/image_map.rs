// Ghibli Assets Image Map
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// The film id -> local asset paths table. The pipeline builds one per run and
// writes it once; site code reads it back through the lookup accessors.

use crate::pipeline::downloader::ImageRole;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_POSTER_FALLBACK: &str = "/images/placeholder-poster.webp";
pub const DEFAULT_BANNER_FALLBACK: &str = "/images/placeholder-banner.webp";

/// Local paths for one film. A missing field means that image was absent
/// upstream or failed to download/convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl ImageEntry {
    pub fn get(&self, role: ImageRole) -> Option<&str> {
        match role {
            ImageRole::Poster => self.poster.as_deref(),
            ImageRole::Banner => self.banner.as_deref(),
        }
    }

    pub fn set(&mut self, role: ImageRole, path: String) {
        match role {
            ImageRole::Poster => self.poster = Some(path),
            ImageRole::Banner => self.banner = Some(path),
        }
    }
}

/// Keyed by film id. A `BTreeMap` keeps the written JSON stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageMap {
    entries: BTreeMap<String, ImageEntry>,
}

impl ImageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `film_id` has an entry, even if it ends up empty.
    pub fn ensure_film(&mut self, film_id: &str) -> &mut ImageEntry {
        self.entries.entry(film_id.to_string()).or_default()
    }

    pub fn record(&mut self, film_id: &str, role: ImageRole, public_path: String) {
        self.ensure_film(film_id).set(role, public_path);
    }

    pub fn get(&self, film_id: &str) -> Option<&ImageEntry> {
        self.entries.get(film_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ImageEntry)> {
        self.entries.iter()
    }

    /// Number of stored paths across all films (posters plus banners).
    pub fn image_count(&self) -> usize {
        self.entries
            .values()
            .map(|e| ImageRole::ALL.iter().filter(|r| e.get(**r).is_some()).count())
            .sum()
    }

    /// Local poster path for `film_id`, else `fallback`, else the placeholder.
    pub fn poster_path(&self, film_id: &str, fallback: Option<&str>) -> String {
        self.path_or(film_id, ImageRole::Poster, fallback.unwrap_or(DEFAULT_POSTER_FALLBACK))
    }

    /// Local banner path for `film_id`, else `fallback`, else the placeholder.
    pub fn banner_path(&self, film_id: &str, fallback: Option<&str>) -> String {
        self.path_or(film_id, ImageRole::Banner, fallback.unwrap_or(DEFAULT_BANNER_FALLBACK))
    }

    fn path_or(&self, film_id: &str, role: ImageRole, fallback: &str) -> String {
        self.get(film_id)
            .and_then(|e| e.get(role))
            .unwrap_or(fallback)
            .to_string()
    }

    /// Write as pretty JSON, overwriting whatever was there.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Creating mapping directory {:?}", parent))?;
        }

        let mut json = serde_json::to_string_pretty(self).context("Serializing image map")?;
        json.push('\n');
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Writing image map to {:?}", path))?;

        info!("[MAP] Wrote {} film entries to {:?}", self.len(), path);
        Ok(())
    }

    /// Read a mapping file. A missing file is an empty map, since the site can
    /// build before the pipeline has ever run.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Parsing image map {:?}", path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("[MAP] {:?} not found, using empty image map", path);
                Ok(Self::new())
            }
            Err(e) => Err(e).with_context(|| format!("Reading image map {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASTLE: &str = "2baf70d1-42bb-4437-b551-e5fed5a87abe";

    fn sample() -> ImageMap {
        let mut map = ImageMap::new();
        map.record(CASTLE, ImageRole::Poster, format!("/images/{}-poster.webp", CASTLE));
        map.record(CASTLE, ImageRole::Banner, format!("/images/{}-banner.webp", CASTLE));
        map.record("58611129", ImageRole::Poster, "/images/58611129-poster.webp".into());
        map.ensure_film("empty-film");
        map
    }

    #[test]
    fn test_json_shape_omits_missing_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json[CASTLE]["poster"],
            format!("/images/{}-poster.webp", CASTLE)
        );
        assert!(json["58611129"].get("banner").is_none());
        assert_eq!(json["empty-film"], serde_json::json!({}));
    }

    #[test]
    fn test_image_count() {
        assert_eq!(sample().image_count(), 3);
        assert_eq!(ImageMap::new().image_count(), 0);
    }

    #[test]
    fn test_lookup_fallbacks() {
        let map = sample();
        assert_eq!(map.poster_path(CASTLE, None), format!("/images/{}-poster.webp", CASTLE));
        assert_eq!(map.banner_path("58611129", Some("https://cdn/b.jpg")), "https://cdn/b.jpg");
        assert_eq!(map.banner_path("58611129", None), DEFAULT_BANNER_FALLBACK);
        assert_eq!(map.poster_path("unknown", None), DEFAULT_POSTER_FALLBACK);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("ghibli_map_{}", std::process::id()));
        let path = dir.join("data").join("image-map.json");

        let map = sample();
        map.save(&path).await.unwrap();
        let loaded = ImageMap::load(&path).await.unwrap();
        assert_eq!(loaded, map);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \""), "expected pretty-printed JSON");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let map = ImageMap::load(Path::new("__no_such_image_map_9d2.json")).await.unwrap();
        assert!(map.is_empty());
    }
}
