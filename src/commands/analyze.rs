//! Analyze command - score a key's suitability before using it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use decouplet::{
    analyze_bytes_key, analyze_image_key, ImageKey, STRONG_KEY_SCORE, WEAK_KEY_SCORE,
};

use super::CommandExecutor;

/// Score how well a key will serve encoding.
///
/// Higher scores mean lower odds of match failures. Scores under 10
/// flag a key as unreliable; 20 and up is comfortable.
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Path to a byte-buffer key file (any file, used as raw bytes)
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Path to an image key (PNG, JPEG, BMP, ...)
    #[arg(long)]
    pub key_image: Option<PathBuf>,
}

impl CommandExecutor for AnalyzeCommand {
    fn execute(&self) -> Result<()> {
        let score = match (&self.key_file, &self.key_image) {
            (Some(path), None) => {
                let data = std::fs::read(path)
                    .with_context(|| format!("Failed to read key from {}", path.display()))?;
                analyze_bytes_key(&data)
            }
            (None, Some(path)) => {
                let key = ImageKey::from_file(path)
                    .with_context(|| format!("Failed to load image key from {}", path.display()))?;
                analyze_image_key(&key)
            }
            (None, None) => anyhow::bail!("No key specified. Use --key-file or --key-image"),
            (Some(_), Some(_)) => anyhow::bail!("Use either --key-file or --key-image, not both"),
        };

        println!("Key strength: {}", score);
        if score < WEAK_KEY_SCORE {
            println!("Verdict: unreliable - expect match failures, pick a longer or more varied key");
        } else if score >= STRONG_KEY_SCORE {
            println!("Verdict: comfortable");
        } else {
            println!("Verdict: usable");
        }
        Ok(())
    }
}
