//! # Decouplet - key-driven reversible text transcoding
//!
//! Decouplet turns a payload into printable text using a pre-shared key
//! (any byte buffer, or an image), and turns it back with the same key.
//!
//! ## Overview
//!
//! Every payload byte becomes one **token**: two (symbol, location)
//! references into the key. Encoding draws a random anchor location,
//! then scans the key for a partner location whose magnitude differs
//! from the anchor's by exactly the payload byte (mod 256). Decoding is
//! a pure lookup (read both magnitudes back and subtract), so it needs
//! no search and no randomness. The random anchor means the same
//! payload encodes differently every time, while the same key always
//! decodes it exactly.
//!
//! This is obfuscation keyed on the secrecy and diversity of the key,
//! **not** encryption: there is no confidentiality or integrity proof,
//! output is larger than input, and small or uniform keys can fail to
//! encode some byte values at all (see [`analysis`]).
//!
//! ## Execution strategies
//!
//! The same transform runs four ways: sequential, parallel (one task
//! per byte, deterministic output order), streaming (single background
//! task with a blocking capacity-1 handoff), and partial streaming,
//! which interleaves encoded frames with raw passthrough so only a
//! chosen slice of the source is transcoded.
//!
//! ## Example
//!
//! ```rust
//! use decouplet::{decode_bytes, encode_bytes};
//!
//! // Any byte buffer works as a key; the more varied, the better.
//! let key: Vec<u8> = (0u8..=255).collect();
//!
//! let encoded = encode_bytes(b"Test", &key).unwrap();
//! // Printable message, e.g. "[dcplt-byteec-0.2]a9c0e8j4j8d4j8c9"
//!
//! let decoded = decode_bytes(&encoded, &key).unwrap();
//! assert_eq!(decoded, b"Test");
//! ```
//!
//! ## Modules
//!
//! - [`key`]: the key contract and the byte-buffer / image variants
//! - [`matcher`]: the randomized byte-to-token search and its inverse
//! - [`grammar`]: message header, token grammar, partial-stream framing
//! - [`engine`]: sequential, parallel, streaming, and partial strategies
//! - [`analysis`]: advisory key-strength scoring
//! - [`stream`]: the `AsyncRead` handoff used by streaming strategies

pub mod analysis;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod key;
pub mod matcher;
pub mod stream;

// Re-export commonly used types at the crate root
pub use analysis::{analyze_bytes_key, analyze_image_key, STRONG_KEY_SCORE, WEAK_KEY_SCORE};
pub use engine::{
    decode, decode_partial_stream, decode_stream, encode, encode_parallel, encode_partial_stream,
    encode_stream, encode_with_finder,
};
pub use error::TranscodeError;
pub use grammar::FORMAT_VERSION;
pub use key::{
    decode_bytes, decode_bytes_partial_stream, decode_bytes_stream, decode_image,
    decode_image_partial_stream, decode_image_stream, encode_bytes, encode_bytes_parallel,
    encode_bytes_partial_stream, encode_bytes_stream, encode_image, encode_image_parallel,
    encode_image_partial_stream, encode_image_stream, BytesKey, ImageKey, ImageKeyError,
    TranscodingKey,
};
pub use matcher::MatchFinder;
pub use stream::TranscodedReader;
