//! Image key variant.
//!
//! A decoded image works as a key: locations are pixels taken in
//! row-major order (`index = y * width + x`), and the magnitudes at a
//! pixel are its color channels: red, green, blue, alpha, plus the
//! derived cyan, magenta, yellow, and black. Unlike the byte-buffer
//! variant there is no fixed offset table; the dictionary is computed
//! from pixel content at lookup time.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, RgbaImage};
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::engine;
use crate::error::TranscodeError;
use crate::key::{Dictionary, TranscodingKey};
use crate::stream::TranscodedReader;

/// Symbols available to image keys, one per color channel.
const IMAGE_ALPHABET: &[u8] = b"rgbacmyk";

/// Errors that can occur while materializing an image key.
#[derive(Error, Debug)]
pub enum ImageKeyError {
    #[error("image load error: {0}")]
    Load(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A key backed by a decoded image.
#[derive(Debug, Clone)]
pub struct ImageKey {
    pixels: RgbaImage,
}

impl ImageKey {
    /// Loads an image key from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ImageKeyError> {
        let image = image::open(path).map_err(|e| ImageKeyError::Load(e.to_string()))?;
        Ok(Self::from_image(image))
    }

    /// Loads an image key from encoded image bytes (PNG, JPEG, ...).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageKeyError> {
        let image =
            image::load_from_memory(bytes).map_err(|e| ImageKeyError::Load(e.to_string()))?;
        Ok(Self::from_image(image))
    }

    /// Wraps an already decoded image.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            pixels: image.to_rgba8(),
        }
    }

    /// Image dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Splits a linear location back into pixel coordinates.
    fn coordinates(&self, location: usize) -> Option<(u32, u32)> {
        let width = self.pixels.width() as usize;
        if width == 0 || location >= self.len() {
            return None;
        }
        Some(((location % width) as u32, (location / width) as u32))
    }
}

/// Derives CMYK channel values from RGB.
///
/// White point is the maximum channel; a fully black pixel maps to
/// `(0, 0, 0, 255)`.
fn rgb_to_cmyk(r: u8, g: u8, b: u8) -> (u8, u8, u8, u8) {
    let w = r.max(g).max(b);
    if w == 0 {
        return (0, 0, 0, 0xff);
    }
    let c = ((u32::from(w - r) * 0xff) / u32::from(w)) as u8;
    let m = ((u32::from(w - g) * 0xff) / u32::from(w)) as u8;
    let y = ((u32::from(w - b) * 0xff) / u32::from(w)) as u8;
    (c, m, y, 0xff - w)
}

impl TranscodingKey for ImageKey {
    fn type_tag(&self) -> &'static str {
        "imgec"
    }

    fn alphabet(&self) -> &'static [u8] {
        IMAGE_ALPHABET
    }

    fn len(&self) -> usize {
        let (width, height) = self.pixels.dimensions();
        width as usize * height as usize
    }

    fn dictionary_at(&self, location: usize) -> Option<Dictionary> {
        let (x, y) = self.coordinates(location)?;
        let [r, g, b, a] = self.pixels.get_pixel(x, y).0;
        let (c, m, ye, k) = rgb_to_cmyk(r, g, b);
        Some(Dictionary::new([
            (b'r', r),
            (b'g', g),
            (b'b', b),
            (b'a', a),
            (b'c', c),
            (b'm', m),
            (b'y', ye),
            (b'k', k),
        ]))
    }
}

/// Encodes `input` sequentially against an image key.
pub fn encode_image(input: &[u8], key: &ImageKey) -> Result<Vec<u8>, TranscodeError> {
    engine::encode(input, key)
}

/// Encodes `input` with one concurrent task per input byte.
pub async fn encode_image_parallel(
    input: &[u8],
    key: Arc<ImageKey>,
) -> Result<Vec<u8>, TranscodeError> {
    engine::encode_parallel(input, key).await
}

/// Encodes a source stream against an image key.
pub fn encode_image_stream<R>(source: R, key: Arc<ImageKey>) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    engine::encode_stream(source, key)
}

/// Encodes a source stream partially against an image key.
pub fn encode_image_partial_stream<R>(
    source: R,
    key: Arc<ImageKey>,
    take: usize,
    skip: usize,
) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    engine::encode_partial_stream(source, key, take, skip)
}

/// Decodes a full message against an image key.
pub fn decode_image(input: &[u8], key: &ImageKey) -> Result<Vec<u8>, TranscodeError> {
    engine::decode(input, key)
}

/// Decodes an encoded stream against an image key.
pub fn decode_image_stream<R>(source: R, key: Arc<ImageKey>) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    engine::decode_stream(source, key)
}

/// Decodes a partially encoded stream against an image key.
pub fn decode_image_partial_stream<R>(source: R, key: Arc<ImageKey>) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    engine::decode_partial_stream(source, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn test_key() -> ImageKey {
        let img = RgbaImage::from_fn(4, 3, |x, y| {
            Rgba([(x * 50) as u8, (y * 80) as u8, ((x + y) * 10) as u8, 255])
        });
        ImageKey::from_image(DynamicImage::ImageRgba8(img))
    }

    #[test]
    fn test_len_and_tag() {
        let key = test_key();

        assert_eq!(key.type_tag(), "imgec");
        assert_eq!(key.len(), 12);
        assert_eq!(key.dimensions(), (4, 3));
    }

    #[test]
    fn test_location_linearization() {
        let key = test_key();

        // index = y*width + x, so location 6 is pixel (2, 1).
        let dict = key.dictionary_at(6).unwrap();
        assert_eq!(dict.magnitude_of(b'r'), Some(100));
        assert_eq!(dict.magnitude_of(b'g'), Some(80));
        assert_eq!(dict.magnitude_of(b'b'), Some(30));
        assert_eq!(dict.magnitude_of(b'a'), Some(255));

        assert!(key.dictionary_at(12).is_none());
    }

    #[test]
    fn test_rgb_to_cmyk() {
        // Black pixel: no chroma, full black channel.
        assert_eq!(rgb_to_cmyk(0, 0, 0), (0, 0, 0, 255));
        // Pure white: nothing at all.
        assert_eq!(rgb_to_cmyk(255, 255, 255), (0, 0, 0, 0));
        // Pure red: cyan absent, magenta and yellow saturated.
        assert_eq!(rgb_to_cmyk(255, 0, 0), (0, 255, 255, 0));
    }

    #[test]
    fn test_dictionary_carries_all_channels() {
        let key = test_key();
        let dict = key.dictionary_at(0).unwrap();

        for symbol in IMAGE_ALPHABET {
            assert!(dict.magnitude_of(*symbol).is_some());
        }
        assert_eq!(dict.magnitude_of(b'z'), None);
    }
}
