//! Key strength analysis.
//!
//! Advisory scoring for how well a key will serve the match search: a
//! diverse key realizes more byte differences, so encodings fail less
//! often. Scores are the geometric mean of value diversity and
//! addressable length, monotonic in both, comparable across keys of
//! the same variant, and deliberately coarse. As a rule of thumb,
//! anything under 10 is unreliable and 20 or more is comfortable; the
//! score is advisory and never a guarantee that every byte value can be
//! realized.

use crate::key::{ImageKey, TranscodingKey};

/// Score below which a key should be considered unreliable.
pub const WEAK_KEY_SCORE: u32 = 10;

/// Score at which a key is comfortably diverse.
pub const STRONG_KEY_SCORE: u32 = 20;

/// Scores a byte-buffer key.
///
/// Diversity is the number of distinct byte values in the buffer.
pub fn analyze_bytes_key(key: &[u8]) -> u32 {
    let mut seen = [false; 256];
    for &b in key {
        seen[b as usize] = true;
    }
    let distinct = seen.iter().filter(|&&s| s).count();
    score(distinct, key.len())
}

/// Scores an image key.
///
/// Diversity is the number of distinct channel magnitudes across the
/// image's pixels; large images are sampled on a stride, which keeps
/// the score stable since repeated content adds no new magnitudes.
pub fn analyze_image_key(key: &ImageKey) -> u32 {
    const MAX_SAMPLES: usize = 4096;

    let len = key.len();
    let stride = (len / MAX_SAMPLES).max(1);

    let mut seen = [false; 256];
    let mut location = 0;
    while location < len {
        if let Some(dict) = key.dictionary_at(location) {
            for entry in dict.entries() {
                seen[entry.magnitude as usize] = true;
            }
        }
        location += stride;
    }
    let distinct = seen.iter().filter(|&&s| s).count();
    score(distinct, len)
}

fn score(distinct: usize, len: usize) -> u32 {
    ((distinct * len) as f64).sqrt() as u32
}
