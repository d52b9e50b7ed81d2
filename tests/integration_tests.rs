//! Integration tests for Decouplet
//!
//! Round-trip correctness is the central invariant: whatever a key
//! encodes, the same key decodes back byte for byte, under every
//! execution strategy (sequential, parallel, streaming, partial).
//!
//! A random anchor can land on a key value that cannot realize a given
//! byte, and the engine retries exactly once before reporting
//! MatchNotFound. Tests that must always pass therefore use keys with
//! full byte coverage (any anchor realizes any difference), or scan a
//! fixed set of seeds so the outcome stays deterministic.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, Rgba, RgbaImage};
use tokio::io::AsyncReadExt;

use decouplet::{
    analyze_bytes_key, analyze_image_key, decode_bytes, decode_bytes_partial_stream,
    decode_bytes_stream, decode_image, encode_bytes, encode_bytes_parallel,
    encode_bytes_partial_stream, encode_bytes_stream, encode_image, encode_image_parallel,
    encode_with_finder, BytesKey, ImageKey, MatchFinder, TranscodeError,
};

const SPEC_KEY: &[u8] = b"tEst Key3#$T234";

/// A key containing every byte value; every difference is realizable
/// from every anchor.
fn coverage_key() -> Vec<u8> {
    (0u8..=255).collect()
}

/// An image key whose red channel covers every byte value, so any
/// difference is realizable from any anchor.
fn gradient_image_key() -> ImageKey {
    let img = RgbaImage::from_fn(64, 64, |x, y| {
        Rgba([
            ((x + y * 64) % 256) as u8,
            (x * 4) as u8,
            (y * 4) as u8,
            255,
        ])
    });
    ImageKey::from_image(DynamicImage::ImageRgba8(img))
}

#[test]
fn test_round_trip() {
    // The short shared-phrase key leaves a few unlucky anchor values;
    // scanning fixed seeds keeps the test deterministic.
    for attempt in 0u8..20 {
        let mut finder = MatchFinder::seeded([attempt; 32]);
        match encode_with_finder(b"Test", &BytesKey::new(SPEC_KEY), &mut finder) {
            Ok(encoded) => {
                assert_eq!(decode_bytes(&encoded, SPEC_KEY).unwrap(), b"Test");
                return;
            }
            Err(TranscodeError::MatchNotFound) => continue,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    panic!("no seed produced a full encoding");
}

#[test]
fn test_round_trip_full_symbol_spread() {
    let payload = "!!**_-+Test THIS bigger message with More Symbols\
                   @$_()#$%^#@!~#2364###$%! *(#$%)^@#%$@";
    let key = coverage_key();

    let encoded = encode_bytes(payload.as_bytes(), &key).unwrap();
    let decoded = decode_bytes(&encoded, &key).unwrap();
    assert_eq!(decoded, payload.as_bytes());
}

#[test]
fn test_round_trip_every_byte_value() {
    let payload: Vec<u8> = (0u8..=255).collect();
    let key = coverage_key();

    let encoded = encode_bytes(&payload, &key).unwrap();
    assert_eq!(decode_bytes(&encoded, &key).unwrap(), payload);
}

#[test]
fn test_encodings_differ_but_decode_identically() {
    let key = coverage_key();
    let first = encode_bytes(b"Test", &key).unwrap();
    let second = encode_bytes(b"Test", &key).unwrap();

    assert_eq!(decode_bytes(&first, &key).unwrap(), b"Test");
    assert_eq!(decode_bytes(&second, &key).unwrap(), b"Test");
}

#[test]
fn test_empty_payload_round_trip() {
    let encoded = encode_bytes(b"", SPEC_KEY).unwrap();
    assert_eq!(encoded, b"[dcplt-byteec-0.2]");
    assert_eq!(decode_bytes(&encoded, SPEC_KEY).unwrap(), b"");
}

#[tokio::test]
async fn test_parallel_equals_sequential() {
    let key = coverage_key();
    let payload = b"order is preserved no matter when tasks finish";

    let parallel = encode_bytes_parallel(payload, &key).await.unwrap();
    let sequential = encode_bytes(payload, &key).unwrap();

    // Tokens differ (random anchors), decoded payloads do not.
    assert_eq!(decode_bytes(&parallel, &key).unwrap(), payload);
    assert_eq!(decode_bytes(&sequential, &key).unwrap(), payload);
}

#[tokio::test]
async fn test_streaming_round_trip() {
    let key = coverage_key();
    let payload = b"Test this message and see it stream".to_vec();

    let encoded = encode_bytes_stream(Cursor::new(payload.clone()), key.clone());
    let mut decoded = decode_bytes_stream(encoded, key);

    let mut out = Vec::new();
    decoded.read_to_end(&mut out).await.unwrap();
    assert_eq!(out, payload);
}

#[tokio::test]
async fn test_partial_streaming_round_trip() {
    let key = coverage_key();
    let payload =
        b"Test this message and see it stream and be partially encoded! here".to_vec();

    let encoded = encode_bytes_partial_stream(Cursor::new(payload.clone()), key.clone(), 1, 3);
    let mut decoded = decode_bytes_partial_stream(encoded, key);

    let mut out = Vec::new();
    decoded.read_to_end(&mut out).await.unwrap();
    assert_eq!(out, payload);
}

#[tokio::test]
async fn test_partial_stream_encodes_only_the_taken_bytes() {
    let key = coverage_key();
    let payload = b"abcdefghij".to_vec();
    let mut encoded = encode_bytes_partial_stream(Cursor::new(payload), key, 1, 3);

    let mut out = Vec::new();
    encoded.read_to_end(&mut out).await.unwrap();
    let text = String::from_utf8_lossy(&out);

    // Three frames ('a', 'e', 'i'); the skipped runs stay readable.
    assert_eq!(text.matches(";[&").count(), 3);
    assert_eq!(text.matches("&];").count(), 3);
    assert!(text.contains("bcd"));
    assert!(text.contains("fgh"));
}

#[test]
fn test_image_key_round_trip() {
    let key = gradient_image_key();
    let payload = b"pixels make fine keys too";

    let encoded = encode_image(payload, &key).unwrap();
    assert!(encoded.starts_with(b"[dcplt-imgec-0.2]"));
    assert_eq!(decode_image(&encoded, &key).unwrap(), payload);
}

#[tokio::test]
async fn test_image_key_parallel_round_trip() {
    let key = Arc::new(gradient_image_key());
    let payload = b"Test";

    let encoded = encode_image_parallel(payload, Arc::clone(&key)).await.unwrap();
    assert_eq!(decode_image(&encoded, key.as_ref()).unwrap(), payload);
}

#[test]
fn test_key_variants_do_not_mix() {
    let image_key = gradient_image_key();
    let encoded = encode_image(b"Test", &image_key).unwrap();

    assert!(matches!(
        decode_bytes(&encoded, SPEC_KEY),
        Err(TranscodeError::KeyMismatch { .. })
    ));
}

#[test]
fn test_unknown_header_rejected() {
    assert!(matches!(
        decode_bytes(b"[dcplt-otherec-0.2]a1b2", SPEC_KEY),
        Err(TranscodeError::UnsupportedFormat { .. })
    ));
    assert!(matches!(
        decode_bytes(b"[dcplt-byteec-9.9]a1b2", SPEC_KEY),
        Err(TranscodeError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_dangling_symbol_rejected() {
    // Symbol 'b' arrives with no digits after 'a1'.
    assert!(matches!(
        decode_bytes(b"[dcplt-byteec-0.2]a1bc3", SPEC_KEY),
        Err(TranscodeError::MalformedToken { .. })
    ));
}

#[test]
fn test_truncated_message_rejected() {
    // One and a half tokens.
    assert!(matches!(
        decode_bytes(b"[dcplt-byteec-0.2]a1b2a3", SPEC_KEY),
        Err(TranscodeError::TruncatedMessage)
    ));
}

#[test]
fn test_key_strength_thresholds() {
    assert!(analyze_bytes_key(b"badkey") < 10);

    let good = b"This is a Key$%@#$@^^%$&$%%^*{})([p[]Should _-!`~";
    assert!(analyze_bytes_key(good) >= 10);

    let great =
        b"GREAFgolanVMb elefwoejgitoiqwaz12353445789870-0=)(_#@$^#$&$%&$*$&$0238959_=2340+=12!@#$%^&*(()";
    assert!(analyze_bytes_key(great) >= 20);

    assert!(analyze_image_key(&gradient_image_key()) >= 20);
}
