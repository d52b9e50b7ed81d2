//! Decode command - recover a payload from an encoded message.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncReadExt;

use decouplet::{decode, decode_partial_stream};

use super::{load_key, runtime, CommandExecutor};

/// Decode a message back into its payload.
///
/// Must be given the exact key the message was encoded with; the
/// variant (byte file vs image) has to match the message header.
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// Path to a byte-buffer key file (any file, used as raw bytes)
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Path to an image key (PNG, JPEG, BMP, ...)
    #[arg(long)]
    pub key_image: Option<PathBuf>,

    /// Message text (reads stdin if neither this nor --file)
    #[arg(short, long)]
    pub code: Option<String>,

    /// File with the encoded message
    #[arg(short, long, conflicts_with = "code")]
    pub file: Option<PathBuf>,

    /// Input is a partial stream (frames mixed with raw passthrough)
    #[arg(long)]
    pub partial: bool,

    /// Write the decoded payload here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommandExecutor for DecodeCommand {
    fn execute(&self) -> Result<()> {
        let key = load_key(self.key_file.as_ref(), self.key_image.as_ref(), self.verbose)?;
        let message = self.read_message()?;

        let decoded = if self.partial {
            let rt = runtime()?;
            rt.block_on(async move {
                let mut reader = decode_partial_stream(io::Cursor::new(message), Arc::clone(&key));
                let mut out = Vec::new();
                reader.read_to_end(&mut out).await?;
                Ok::<_, anyhow::Error>(out)
            })
            .context("Failed to decode message")?
        } else {
            decode(&message, key.as_ref()).context("Failed to decode message")?
        };

        if self.verbose {
            eprintln!("Decoded {} payload bytes", decoded.len());
        }

        match &self.output {
            Some(path) => std::fs::write(path, &decoded)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => io::stdout().write_all(&decoded)?,
        }
        Ok(())
    }
}

impl DecodeCommand {
    fn read_message(&self) -> Result<Vec<u8>> {
        if let Some(code) = &self.code {
            return Ok(code.trim().as_bytes().to_vec());
        }
        if let Some(path) = &self.file {
            return std::fs::read(path)
                .with_context(|| format!("Failed to read message from {}", path.display()));
        }
        eprintln!("Reading message from stdin (Ctrl+D to finish):");
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read message from stdin")?;
        Ok(buffer)
    }
}
