// Ghibli Assets Pipeline Core
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// fetch -> (download, convert)* -> write map -> summarize
//
// Films and images are handled strictly one after another. Per-image
// failures become ImageOutcome values; only the encoder probe, the list
// fetch and the final writes can abort a run.

use crate::config::PipelineConfig;
use crate::pipeline::download_guard::StemClaims;
use crate::pipeline::downloader::{download_image, ImageRole};
use crate::pipeline::image_map::ImageMap;
use crate::pipeline::production_tools::WebpEncoder;
use crate::pipeline::report::{compressed_bytes_in, SizeReport};
use crate::pipeline::source_tools::{build_client, fetch_films, Film};
use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::fmt;
use tracing::{info, warn};

/// Where a per-image failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Convert,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Download => f.write_str("download"),
            Stage::Convert => f.write_str("convert"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    /// Converted and recorded in the map.
    Converted { public_path: String, size_bytes: u64 },
    /// The film has no URL for this role; nothing was attempted.
    Missing,
    Failed { stage: Stage, reason: String },
}

/// What happened to one image of one film.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutcome {
    pub film_id: String,
    pub role: ImageRole,
    pub status: OutcomeStatus,
}

impl ImageOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self.status, OutcomeStatus::Converted { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub film_count: usize,
    pub image_map: ImageMap,
    pub outcomes: Vec<ImageOutcome>,
    pub size: SizeReport,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &ImageOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

pub struct ImagePipeline {
    config: PipelineConfig,
    client: Client,
    encoder: WebpEncoder,
}

impl ImagePipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let client = build_client()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: PipelineConfig, client: Client) -> Self {
        let encoder =
            WebpEncoder::with_prefix_args(config.encoder.clone(), config.encoder_prefix_args.clone());
        Self {
            config,
            client,
            encoder,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Pre-flight probe. Runs before any network activity.
    pub fn ensure_encoder(&self) -> Result<()> {
        if !self.encoder.is_available() {
            bail!(
                "WebP encoder '{}' was not found on PATH. Install it (e.g. the 'webp' package) or set WEBP_ENCODER.",
                self.encoder.program
            );
        }
        info!("[PIPELINE] Encoder '{}' available", self.encoder.program);
        Ok(())
    }

    /// Run the whole pipeline once, writing the map and returning the report.
    pub async fn run(&self) -> Result<RunReport> {
        self.ensure_encoder()?;

        let films = fetch_films(&self.client, &self.config.api_url).await?;

        tokio::fs::create_dir_all(&self.config.image_dir)
            .await
            .with_context(|| format!("Creating image directory {:?}", self.config.image_dir))?;

        let mut image_map = ImageMap::new();
        let mut claims = StemClaims::new();
        let mut outcomes = Vec::with_capacity(films.len() * ImageRole::ALL.len());

        for (idx, film) in films.iter().enumerate() {
            info!("[PIPELINE] ({}/{}) {}", idx + 1, films.len(), film.title);
            outcomes.extend(self.process_film(film, &mut image_map, &mut claims).await);
        }

        image_map.save(&self.config.map_path).await?;

        let size = SizeReport {
            images_downloaded: image_map.image_count(),
            images_expected: films.len() * ImageRole::ALL.len(),
            compressed_bytes: compressed_bytes_in(&self.config.image_dir).await,
        };

        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        if failed > 0 {
            warn!("[PIPELINE] Finished with {} image failure(s)", failed);
        } else {
            info!("[PIPELINE] Finished without failures");
        }

        Ok(RunReport {
            film_count: films.len(),
            image_map,
            outcomes,
            size,
        })
    }

    /// Poster then banner, each independent of the other.
    pub async fn process_film(
        &self,
        film: &Film,
        image_map: &mut ImageMap,
        claims: &mut StemClaims,
    ) -> Vec<ImageOutcome> {
        image_map.ensure_film(&film.id);
        let stem = claims.claim(&film.id);

        let mut outcomes = Vec::with_capacity(ImageRole::ALL.len());
        for role in ImageRole::ALL {
            let url = match role {
                ImageRole::Poster => film.poster_url(),
                ImageRole::Banner => film.banner_url(),
            };

            let status = match (url, &stem) {
                (None, _) => OutcomeStatus::Missing,
                (Some(url), Ok(stem)) => self.process_image(stem, role, url).await,
                (Some(_), Err(reason)) => OutcomeStatus::Failed {
                    stage: Stage::Download,
                    reason: reason.clone(),
                },
            };

            match &status {
                OutcomeStatus::Converted { public_path, .. } => {
                    image_map.record(&film.id, role, public_path.clone());
                }
                OutcomeStatus::Missing => {
                    info!("[PIPELINE] {} has no {} image", film.id, role);
                }
                OutcomeStatus::Failed { stage, reason } => {
                    warn!("[PIPELINE] {} {} failed at {}: {}", film.id, role, stage, reason);
                }
            }

            outcomes.push(ImageOutcome {
                film_id: film.id.clone(),
                role,
                status,
            });
        }
        outcomes
    }

    async fn process_image(&self, stem: &str, role: ImageRole, url: &str) -> OutcomeStatus {
        let dir = &self.config.image_dir;
        let temp = role.temp_path(dir, stem);
        let output = role.output_path(dir, stem);

        if let Err(e) = download_image(&self.client, url, &temp).await {
            return OutcomeStatus::Failed {
                stage: Stage::Download,
                reason: format!("{:#}", e),
            };
        }

        match self.encoder.convert(&temp, &output).await {
            Ok(result) => OutcomeStatus::Converted {
                public_path: role.public_path(&self.config.public_prefix, stem),
                size_bytes: result.size_bytes,
            },
            Err(e) => OutcomeStatus::Failed {
                stage: Stage::Convert,
                reason: format!("{:#}", e),
            },
        }
    }
}
