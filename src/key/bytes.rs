//! Byte-buffer key variant.
//!
//! Any byte buffer works as a key: locations are indices into the
//! buffer, and the magnitude of symbol `s` at index `i` is
//! `buffer[i] + offset(s)` (mod 256) with a fixed per-symbol offset
//! table. The offsets are key-independent; the byte at the index is
//! what ties a magnitude to the key content.

use std::sync::Arc;

use tokio::io::AsyncRead;

use crate::engine;
use crate::error::TranscodeError;
use crate::key::{Dictionary, TranscodingKey};
use crate::stream::TranscodedReader;

/// Symbols available to byte-buffer keys.
const BYTE_ALPHABET: &[u8] = b"abcdefghijk";

/// Per-symbol magnitude offsets, in alphabet order.
const SYMBOL_OFFSETS: [u8; 11] = [0, 1, 2, 4, 6, 8, 10, 16, 32, 64, 128];

/// A key backed by an arbitrary byte buffer.
#[derive(Debug, Clone)]
pub struct BytesKey {
    data: Vec<u8>,
}

impl BytesKey {
    /// Wraps a byte buffer as a key.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<&[u8]> for BytesKey {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

impl From<Vec<u8>> for BytesKey {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl TranscodingKey for BytesKey {
    fn type_tag(&self) -> &'static str {
        "byteec"
    }

    fn alphabet(&self) -> &'static [u8] {
        BYTE_ALPHABET
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn dictionary_at(&self, location: usize) -> Option<Dictionary> {
        let base = *self.data.get(location)?;
        Some(Dictionary::new(
            BYTE_ALPHABET
                .iter()
                .zip(SYMBOL_OFFSETS)
                .map(|(&symbol, offset)| (symbol, base.wrapping_add(offset))),
        ))
    }
}

/// Encodes `input` sequentially against a byte-buffer key.
pub fn encode_bytes(input: &[u8], key: &[u8]) -> Result<Vec<u8>, TranscodeError> {
    engine::encode(input, &BytesKey::new(key))
}

/// Encodes `input` with one concurrent task per input byte.
pub async fn encode_bytes_parallel(input: &[u8], key: &[u8]) -> Result<Vec<u8>, TranscodeError> {
    engine::encode_parallel(input, Arc::new(BytesKey::new(key))).await
}

/// Encodes a source stream against a byte-buffer key.
///
/// Must be called from within a tokio runtime; the returned reader
/// yields the encoded message as it is produced.
pub fn encode_bytes_stream<R>(source: R, key: impl Into<BytesKey>) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    engine::encode_stream(source, Arc::new(key.into()))
}

/// Encodes a source stream partially: `take` bytes encoded, `skip`
/// bytes passed through raw, repeating until the source is exhausted.
pub fn encode_bytes_partial_stream<R>(
    source: R,
    key: impl Into<BytesKey>,
    take: usize,
    skip: usize,
) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    engine::encode_partial_stream(source, Arc::new(key.into()), take, skip)
}

/// Decodes a full message against a byte-buffer key.
pub fn decode_bytes(input: &[u8], key: &[u8]) -> Result<Vec<u8>, TranscodeError> {
    engine::decode(input, &BytesKey::new(key))
}

/// Decodes an encoded stream against a byte-buffer key.
pub fn decode_bytes_stream<R>(source: R, key: impl Into<BytesKey>) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    engine::decode_stream(source, Arc::new(key.into()))
}

/// Decodes a partially encoded stream against a byte-buffer key.
pub fn decode_bytes_partial_stream<R>(source: R, key: impl Into<BytesKey>) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    engine::decode_partial_stream(source, Arc::new(key.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_and_alphabet() {
        let key = BytesKey::new(b"abc".as_slice());

        assert_eq!(key.type_tag(), "byteec");
        assert_eq!(key.alphabet(), b"abcdefghijk");
        assert_eq!(key.len(), 3);
    }

    #[test]
    fn test_dictionary_folds_byte_into_offsets() {
        let key = BytesKey::new(vec![100u8, 200]);

        let dict = key.dictionary_at(0).unwrap();
        assert_eq!(dict.magnitude_of(b'a'), Some(100));
        assert_eq!(dict.magnitude_of(b'b'), Some(101));
        assert_eq!(dict.magnitude_of(b'k'), Some(228)); // 100 + 128

        // Wraps mod 256 rather than overflowing.
        let dict = key.dictionary_at(1).unwrap();
        assert_eq!(dict.magnitude_of(b'k'), Some(72)); // 200 + 128 - 256
    }

    #[test]
    fn test_dictionary_out_of_bounds() {
        let key = BytesKey::new(vec![1u8, 2, 3]);

        assert!(key.dictionary_at(2).is_some());
        assert!(key.dictionary_at(3).is_none());
    }

    #[test]
    fn test_alphabet_disjoint_from_digits() {
        let key = BytesKey::new(vec![0u8]);
        for symbol in key.alphabet() {
            assert!(!symbol.is_ascii_digit());
        }
    }
}
