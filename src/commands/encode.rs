//! Encode command - transcode a payload against a shared key.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncReadExt;

use decouplet::{encode, encode_parallel, encode_partial_stream};

use super::{load_key, runtime, CommandExecutor};

/// Encode a payload into a printable message.
///
/// The key can be any file (--key-file, used byte for byte) or an image
/// (--key-image, sampled per pixel). Whoever holds the same key can
/// decode the message; nobody else gets more than obfuscation.
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// Path to a byte-buffer key file (any file, used as raw bytes)
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Path to an image key (PNG, JPEG, BMP, ...)
    #[arg(long)]
    pub key_image: Option<PathBuf>,

    /// Message text to encode (reads stdin if neither this nor --file)
    #[arg(short, long)]
    pub message: Option<String>,

    /// File with the payload to encode
    #[arg(short, long, conflicts_with = "message")]
    pub file: Option<PathBuf>,

    /// Encode with one concurrent task per payload byte
    #[arg(long, conflicts_with_all = ["take", "skip"])]
    pub parallel: bool,

    /// Partial streaming: bytes to encode per frame
    #[arg(long, requires = "skip")]
    pub take: Option<usize>,

    /// Partial streaming: bytes to pass through raw per frame
    #[arg(long, requires = "take")]
    pub skip: Option<usize>,

    /// Write the encoded message here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose output (key and strategy diagnostics on stderr)
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommandExecutor for EncodeCommand {
    fn execute(&self) -> Result<()> {
        let key = load_key(self.key_file.as_ref(), self.key_image.as_ref(), self.verbose)?;
        let payload = self.read_payload()?;

        if self.verbose {
            eprintln!("Encoding {} payload bytes", payload.len());
        }

        let encoded = if let (Some(take), Some(skip)) = (self.take, self.skip) {
            if self.verbose {
                eprintln!("Partial streaming: take={}, skip={}", take, skip);
            }
            let rt = runtime()?;
            rt.block_on(async move {
                let mut reader =
                    encode_partial_stream(io::Cursor::new(payload), Arc::clone(&key), take, skip);
                let mut out = Vec::new();
                reader.read_to_end(&mut out).await?;
                Ok::<_, anyhow::Error>(out)
            })
            .context("Failed to encode payload")?
        } else if self.parallel {
            let rt = runtime()?;
            rt.block_on(encode_parallel(&payload, Arc::clone(&key)))
                .context("Failed to encode payload")?
        } else {
            encode(&payload, key.as_ref()).context("Failed to encode payload")?
        };

        if self.verbose {
            eprintln!("Encoded message is {} bytes", encoded.len());
        }

        match &self.output {
            Some(path) => std::fs::write(path, &encoded)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => {
                io::stdout().write_all(&encoded)?;
                io::stdout().write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

impl EncodeCommand {
    fn read_payload(&self) -> Result<Vec<u8>> {
        if let Some(message) = &self.message {
            return Ok(message.clone().into_bytes());
        }
        if let Some(path) = &self.file {
            return std::fs::read(path)
                .with_context(|| format!("Failed to read payload from {}", path.display()));
        }
        eprintln!("Reading payload from stdin (Ctrl+D to finish):");
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read payload from stdin")?;
        Ok(buffer)
    }
}
