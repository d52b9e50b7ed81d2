//! Key abstraction for transcoding.
//!
//! A key is an addressable space of locations, each of which yields a
//! small symbol→magnitude table (the *dictionary* at that location).
//! Encoding searches this space for a location/symbol pair realizing a
//! byte difference; decoding reads the table back at the locations a
//! token names. Two variants ship with the crate:
//!
//! - [`BytesKey`]: any byte buffer; locations are indices, magnitudes
//!   fold the byte at the index into a fixed per-symbol offset table.
//! - [`ImageKey`]: a decoded image; locations are pixels in row-major
//!   order, magnitudes are the pixel's color channels.
//!
//! New variants only need to implement [`TranscodingKey`]; the matcher,
//! grammar, and engine are generic over it.

mod bytes;
mod image;

pub use self::bytes::{
    decode_bytes, decode_bytes_partial_stream, decode_bytes_stream, encode_bytes,
    encode_bytes_parallel, encode_bytes_partial_stream, encode_bytes_stream, BytesKey,
};
pub use self::image::{
    decode_image, decode_image_partial_stream, decode_image_stream, encode_image,
    encode_image_parallel, encode_image_partial_stream, encode_image_stream, ImageKey,
    ImageKeyError,
};

/// A key usable for encoding and decoding.
///
/// Implementations must be cheap to query: `dictionary_at` is called once
/// per scanned location during encoding and twice per token during
/// decoding, and nothing is cached across calls.
pub trait TranscodingKey: Send + Sync {
    /// Wire tag identifying the key variant, e.g. `"byteec"`.
    fn type_tag(&self) -> &'static str;

    /// The symbol alphabet. Symbols are single ASCII characters and must
    /// never overlap the digits `0`-`9`, which keeps token index spans
    /// self-delimiting.
    fn alphabet(&self) -> &'static [u8];

    /// Number of addressable locations in the key space.
    fn len(&self) -> usize;

    /// Whether the key space has no locations at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The symbol→magnitude table at one location, or `None` if the
    /// location is outside the key space.
    fn dictionary_at(&self, location: usize) -> Option<Dictionary>;
}

/// Symbol→magnitude table for a single key location.
///
/// Magnitudes are unsigned 8-bit; all arithmetic over them wraps mod 256.
#[derive(Debug, Clone)]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
}

/// One symbol with its magnitude at the sampled location.
#[derive(Debug, Clone, Copy)]
pub struct DictionaryEntry {
    /// ASCII symbol character.
    pub symbol: u8,
    /// Magnitude of the symbol at this location.
    pub magnitude: u8,
}

impl Dictionary {
    /// Creates a dictionary from `(symbol, magnitude)` pairs.
    pub fn new(pairs: impl IntoIterator<Item = (u8, u8)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(symbol, magnitude)| DictionaryEntry { symbol, magnitude })
                .collect(),
        }
    }

    /// All entries, in alphabet order.
    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    /// Magnitude of `symbol`, or `None` if the symbol is not in the
    /// alphabet this dictionary was built from.
    pub fn magnitude_of(&self, symbol: u8) -> Option<u8> {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_lookup() {
        let dict = Dictionary::new([(b'a', 10), (b'b', 20)]);

        assert_eq!(dict.magnitude_of(b'a'), Some(10));
        assert_eq!(dict.magnitude_of(b'b'), Some(20));
        assert_eq!(dict.magnitude_of(b'z'), None);
        assert_eq!(dict.entries().len(), 2);
    }
}
