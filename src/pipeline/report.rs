// Ghibli Assets Size Report
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// End-of-run summary. The "original size" is not measured: it is the
// compressed total scaled by ESTIMATED_ORIGINAL_FACTOR, and is always
// presented as an estimate.

use crate::config::OUTPUT_EXTENSION;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Assumed ratio between a downloaded original and its WebP output.
pub const ESTIMATED_ORIGINAL_FACTOR: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SizeReport {
    pub images_downloaded: usize,
    pub images_expected: usize,
    pub compressed_bytes: u64,
}

impl SizeReport {
    pub fn estimated_original_bytes(&self) -> u64 {
        (self.compressed_bytes as f64 * ESTIMATED_ORIGINAL_FACTOR).round() as u64
    }

    pub fn estimated_savings_percent(&self) -> f64 {
        let original = self.estimated_original_bytes();
        if original == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_bytes as f64 / original as f64) * 100.0
    }
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1_048_576.0
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 Image optimization summary")?;
        writeln!(f, "   Images downloaded: {}/{}", self.images_downloaded, self.images_expected)?;
        writeln!(f, "   Compressed size:   {:.2} MB", megabytes(self.compressed_bytes))?;
        writeln!(
            f,
            "   Original size:     ~{:.2} MB (estimated, x{:.1})",
            megabytes(self.estimated_original_bytes()),
            ESTIMATED_ORIGINAL_FACTOR
        )?;
        write!(
            f,
            "   Savings:           ~{:.1}% (estimated)",
            self.estimated_savings_percent()
        )
    }
}

/// Sum the sizes of compressed images directly inside `dir`.
/// Leftover temp downloads are not counted. A missing directory sums to zero.
pub async fn compressed_bytes_in(dir: &Path) -> u64 {
    let mut total = 0;

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(e) => e,
        Err(_) => return total,
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("[REPORT] Scan of {:?} stopped early: {}", dir, e);
                break;
            }
        };
        let path = entry.path();
        let is_output = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case(OUTPUT_EXTENSION));
        if !is_output {
            continue;
        }
        match entry.metadata().await {
            Ok(meta) if meta.is_file() => total += meta.len(),
            Ok(_) => {}
            Err(e) => warn!("[REPORT] Could not stat {:?}, not counted: {}", path, e),
        }
    }
    total
}
