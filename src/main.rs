// Ghibli Assets Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use ghibli_assets::config::PipelineConfig;
use ghibli_assets::pipeline::core::ImagePipeline;
use ghibli_assets::pipeline::image_map::ImageMap;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "ghibli-assets")]
#[command(about = "Film poster/banner optimizer for the static site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every film's images, convert them to WebP and write the image map
    Optimize {
        /// Films endpoint (overrides FILMS_API_URL)
        #[arg(long)]
        api_url: Option<String>,

        /// Output directory for images (overrides IMAGE_DIR)
        #[arg(long)]
        image_dir: Option<PathBuf>,

        /// Image map output path (overrides IMAGE_MAP_PATH)
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// WebP encoder program (overrides WEBP_ENCODER)
        #[arg(short, long)]
        encoder: Option<String>,
    },

    /// Print the local image path for a film
    Lookup {
        /// Film id
        #[arg(short, long)]
        id: String,

        /// Look up the banner instead of the poster
        #[arg(short, long)]
        banner: bool,

        /// Path returned when the film has no local image
        #[arg(short, long)]
        fallback: Option<String>,

        /// Image map path (overrides IMAGE_MAP_PATH)
        #[arg(short, long)]
        mapping: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("🚨 [GHIBLI-ASSETS PANIC] at {}: {}", location, message);
    }));

    let args = Cli::parse();
    let mut config = PipelineConfig::from_env();

    match args.command {
        Commands::Optimize {
            api_url,
            image_dir,
            mapping,
            encoder,
        } => {
            if let Some(v) = api_url {
                config.api_url = v;
            }
            if let Some(v) = image_dir {
                config.image_dir = v;
            }
            if let Some(v) = mapping {
                config.map_path = v;
            }
            if let Some(v) = encoder {
                config.encoder = v;
            }

            let pipeline = ImagePipeline::new(config)?;

            if let Err(e) = pipeline.ensure_encoder() {
                error!("❌ {}", e);
                std::process::exit(1);
            }

            info!("--- GHIBLI ASSETS: optimizing film images ---");
            let report = match pipeline.run().await {
                Ok(report) => report,
                Err(e) => {
                    error!("❌ Image optimization failed: {:#}", e);
                    std::process::exit(1);
                }
            };

            for failure in report.failures() {
                warn!("⚠️ Skipped {} image for film {}", failure.role, failure.film_id);
            }

            println!("✅ Image map saved to {:?}", pipeline.config().map_path);
            println!("{}", report.size);
        }
        Commands::Lookup {
            id,
            banner,
            fallback,
            mapping,
        } => {
            let path = mapping.unwrap_or(config.map_path);
            let map = ImageMap::load(&path).await?;
            let local = if banner {
                map.banner_path(&id, fallback.as_deref())
            } else {
                map.poster_path(&id, fallback.as_deref())
            };
            println!("{}", local);
        }
    }

    Ok(())
}
