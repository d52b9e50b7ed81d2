//! Decouplet - key-driven reversible text transcoding
//!
//! CLI for encoding payloads against a pre-shared key (byte file or
//! image) and decoding them back. The key never travels with the
//! message; both sides must hold the same one.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{AnalyzeCommand, CommandExecutor, DecodeCommand, EncodeCommand};

/// Decouplet - key-driven reversible text transcoding
///
/// Encode turns a payload into a printable message using a shared key;
/// decode recovers it with the same key. Not encryption: obfuscation
/// keyed on key secrecy and diversity.
#[derive(Parser)]
#[command(name = "decouplet")]
#[command(version)]
#[command(about = "Reversible message-to-text transcoding keyed by a shared byte or image key")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a payload into a printable message
    Encode(EncodeCommand),

    /// Decode a message back into its payload
    Decode(DecodeCommand),

    /// Score a key's suitability for encoding
    Analyze(AnalyzeCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode(cmd) => cmd.execute(),
        Commands::Decode(cmd) => cmd.execute(),
        Commands::Analyze(cmd) => cmd.execute(),
    }
}
