// Ghibli Assets Production Tools - WebP Encoding
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Wraps the external WebP encoder (cwebp by default). Arguments are passed
// as a list, never through a shell, and paths that look like flags are
// prefixed with "./".

use crate::config::WEBP_QUALITY;
use crate::pipeline::downloader::remove_stale;
use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};
use which::which;

/// Result of a conversion.
#[derive(Debug)]
pub struct ProductionResult {
    pub output_path: PathBuf,
    pub size_bytes: u64,
}

/// Make a path safe to pass as a positional argument.
pub fn safe_arg_path(path: &Path) -> PathBuf {
    if path.to_string_lossy().starts_with('-') {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

/// The external encoder invocation: program plus optional leading arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct WebpEncoder {
    pub program: String,
    pub prefix_args: Vec<String>,
}

impl WebpEncoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    /// Run `program` with `prefix_args` ahead of the encoder arguments,
    /// e.g. a wrapper script or interpreter.
    pub fn with_prefix_args(program: impl Into<String>, prefix_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args,
        }
    }

    /// Resolve the encoder program on PATH (or as a path). Nothing is executed.
    pub fn locate(&self) -> Result<PathBuf> {
        which(&self.program).with_context(|| format!("`{}` not found in PATH", self.program))
    }

    pub fn is_available(&self) -> bool {
        self.locate().is_ok()
    }

    /// Full argument list: prefix args, then `-q <quality> <input> -o <output>`.
    pub fn build_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.prefix_args.iter().map(OsString::from).collect();
        args.push("-q".into());
        args.push(WEBP_QUALITY.to_string().into());
        args.push(safe_arg_path(input).into_os_string());
        args.push("-o".into());
        args.push(safe_arg_path(output).into_os_string());
        args
    }

    /// Transcode `input` to `output`. On success the input is deleted; on
    /// failure the input is left where it is and the error is returned.
    /// Any existing `output` is removed first, so only a file written by this
    /// encoder run counts as success.
    pub async fn convert(&self, input: &Path, output: &Path) -> Result<ProductionResult> {
        info!("[ENCODER] Converting {:?} -> {:?} (q={})", input, output, WEBP_QUALITY);

        remove_stale(output).await?;

        let out = Command::new(&self.program)
            .args(self.build_args(input, output))
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Spawning encoder '{}'", self.program))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            bail!(
                "Encoder '{}' failed on {:?} ({}): {}",
                self.program,
                input,
                out.status,
                stderr.trim()
            );
        }

        let size_bytes = tokio::fs::metadata(output)
            .await
            .with_context(|| format!("Encoder reported success but {:?} is missing", output))?
            .len();

        tokio::fs::remove_file(input)
            .await
            .with_context(|| format!("Removing temp file {:?}", input))?;
        debug!("[ENCODER] Removed temp source {:?}", input);

        Ok(ProductionResult {
            output_path: output.to_path_buf(),
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_order() {
        let encoder = WebpEncoder::new("cwebp");
        let args = encoder.build_args(Path::new("img/a-poster.jpg"), Path::new("img/a-poster.webp"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(args, vec!["-q", "60", "img/a-poster.jpg", "-o", "img/a-poster.webp"]);
    }

    #[test]
    fn test_build_args_injection() {
        let encoder = WebpEncoder::new("cwebp");
        let args = encoder.build_args(Path::new("-poster.jpg"), Path::new("-poster.webp"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        assert!(args.contains(&"./-poster.jpg".to_string()) || args.contains(&".\\-poster.jpg".to_string()));
        assert!(!args.contains(&"-poster.webp".to_string()));
    }

    #[test]
    fn test_prefix_args_come_first() {
        let encoder = WebpEncoder::with_prefix_args("sh", vec!["-c".into(), "true".into()]);
        let args = encoder.build_args(Path::new("in.jpg"), Path::new("out.webp"));
        assert_eq!(args[0], OsString::from("-c"));
        assert_eq!(args[2], OsString::from("-q"));
    }

    #[test]
    fn test_missing_program_unresolved() {
        let err = WebpEncoder::new("definitely-not-a-webp-encoder-7f3a").locate().unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-webp-encoder-7f3a"));
        assert!(!WebpEncoder::new("").is_available());
        assert!(!WebpEncoder::new("./no/such/cwebp").is_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_resolves_on_path() {
        assert!(WebpEncoder::new("sh").is_available());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_encoder_does_not_reuse_stale_output() {
        let dir = std::env::temp_dir().join(format!("ghibli_enc_stale_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("abc-poster.jpg");
        let output = dir.join("abc-poster.webp");
        std::fs::write(&input, b"fresh").unwrap();
        std::fs::write(&output, b"stale-from-last-run").unwrap();

        let encoder = WebpEncoder::with_prefix_args("sh", vec!["-c".into(), "exit 0".into()]);
        let result = encoder.convert(&input, &output).await;

        assert!(result.is_err());
        assert!(input.exists(), "temp source must stay after a failed conversion");
        assert!(!output.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
