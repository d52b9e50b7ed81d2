//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor`
//! trait, keeping argument parsing and execution together per command.

mod analyze;
mod decode;
mod encode;

pub use analyze::AnalyzeCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use decouplet::{BytesKey, ImageKey, TranscodingKey};

/// Trait for command execution - Strategy pattern.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self) -> Result<()>;
}

/// Loads a key from either a raw byte file or an image file.
///
/// Exactly one of the two paths must be given; image keys are decoded
/// with the image loader, anything else is used byte for byte.
pub(crate) fn load_key(
    key_file: Option<&PathBuf>,
    key_image: Option<&PathBuf>,
    verbose: bool,
) -> Result<Arc<dyn TranscodingKey>> {
    match (key_file, key_image) {
        (Some(path), None) => {
            let data = std::fs::read(path)
                .with_context(|| format!("Failed to read key from {}", path.display()))?;
            if verbose {
                eprintln!("Loaded byte key ({} bytes)", data.len());
            }
            Ok(Arc::new(BytesKey::new(data)))
        }
        (None, Some(path)) => {
            let key = ImageKey::from_file(path)
                .with_context(|| format!("Failed to load image key from {}", path.display()))?;
            if verbose {
                let (w, h) = key.dimensions();
                eprintln!("Loaded image key ({}x{} pixels)", w, h);
            }
            Ok(Arc::new(key))
        }
        (None, None) => anyhow::bail!("No key specified. Use --key-file or --key-image"),
        (Some(_), Some(_)) => anyhow::bail!("Use either --key-file or --key-image, not both"),
    }
}

/// Builds the tokio runtime backing the async strategies.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to create tokio runtime")
}
