// Ghibli Assets Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Paths and endpoints come from the environment (optionally via .env),
// CLI flags override them in main. Encoding quality is not configurable.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://ghibliapi.vercel.app/films";
pub const DEFAULT_IMAGE_DIR: &str = "public/images";
pub const DEFAULT_MAP_PATH: &str = "src/data/image-map.json";
pub const DEFAULT_PUBLIC_PREFIX: &str = "/images";
pub const DEFAULT_ENCODER: &str = "cwebp";

/// WebP quality handed to the encoder on every conversion.
pub const WEBP_QUALITY: u8 = 60;

/// Extension of the compressed output images.
pub const OUTPUT_EXTENSION: &str = "webp";

/// Extension of the downloaded originals awaiting conversion.
pub const TEMP_EXTENSION: &str = "jpg";

/// Everything a single pipeline run needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Endpoint returning the JSON array of films.
    pub api_url: String,
    /// Directory receiving temp downloads and compressed images.
    pub image_dir: PathBuf,
    /// Where the id -> paths mapping is written.
    pub map_path: PathBuf,
    /// Site-relative prefix used for paths stored in the mapping.
    pub public_prefix: String,
    /// Encoder program name or path.
    pub encoder: String,
    /// Arguments placed before the encoder's own arguments.
    pub encoder_prefix_args: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            map_path: PathBuf::from(DEFAULT_MAP_PATH),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            encoder: DEFAULT_ENCODER.to_string(),
            encoder_prefix_args: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Build a config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_url: get("FILMS_API_URL").unwrap_or(defaults.api_url),
            image_dir: get("IMAGE_DIR").map(PathBuf::from).unwrap_or(defaults.image_dir),
            map_path: get("IMAGE_MAP_PATH").map(PathBuf::from).unwrap_or(defaults.map_path),
            public_prefix: get("IMAGE_PUBLIC_PREFIX").unwrap_or(defaults.public_prefix),
            encoder: get("WEBP_ENCODER").unwrap_or(defaults.encoder),
            encoder_prefix_args: defaults.encoder_prefix_args,
        }
    }
}
