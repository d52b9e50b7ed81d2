//! Message grammar and framing.
//!
//! A message is `Header || Token*` with no separators. The header is
//! `[dcplt-<type>-<version>]`; each token is
//! `<symbol><decimalIndex><symbol><decimalIndex>` and encodes exactly one
//! payload byte. Symbol alphabets never contain digits, so the longest
//! run of digits after a symbol is unambiguously that symbol's index and
//! the whole grammar parses without lookahead beyond one byte.
//!
//! Partial streams interleave fully-framed messages between `;[&` and
//! `&];` markers with raw passthrough bytes outside the marks.

use crate::error::TranscodeError;
use crate::key::TranscodingKey;

/// Wire format version emitted and accepted by this crate.
pub const FORMAT_VERSION: &str = "0.2";

/// Opens every message header.
const HEADER_PREFIX: &[u8] = b"[dcplt-";

/// Upper bound on a plausible header, used to stop runaway scans.
const MAX_HEADER_LEN: usize = 32;

/// Key type tags this crate knows how to produce.
const KNOWN_TAGS: &[&str] = &["byteec", "imgec"];

/// Marks the start of an encoded segment in a partial stream.
pub const PARTIAL_START: &[u8] = b";[&";

/// Marks the end of an encoded segment in a partial stream.
pub const PARTIAL_END: &[u8] = b"&];";

/// One payload byte, encoded as two symbol/location references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Symbol resolved at the anchor location.
    pub symbol1: u8,
    /// Anchor location in key space.
    pub location1: usize,
    /// Symbol resolved at the partner location.
    pub symbol2: u8,
    /// Partner location in key space.
    pub location2: usize,
}

impl Token {
    /// Text form of the token.
    pub fn render(&self) -> String {
        format!(
            "{}{}{}{}",
            self.symbol1 as char, self.location1, self.symbol2 as char, self.location2
        )
    }
}

/// A parsed and validated message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Key variant tag, e.g. `"byteec"`.
    pub type_tag: String,
    /// Format version, e.g. `"0.2"`.
    pub version: String,
}

impl MessageHeader {
    fn render(&self) -> String {
        format!("[dcplt-{}-{}]", self.type_tag, self.version)
    }
}

/// Renders the header for a key type.
pub fn message_header(type_tag: &str) -> String {
    format!("[dcplt-{}-{}]", type_tag, FORMAT_VERSION)
}

/// Strips and parses the header at the front of `input`.
///
/// Returns the header and the remaining message body. Input that does
/// not begin with a parseable header is `UnsupportedFormat`; input that
/// ends mid-header is `TruncatedMessage`.
pub fn parse_header(input: &[u8]) -> Result<(MessageHeader, &[u8]), TranscodeError> {
    let probe_len = input.len().min(MAX_HEADER_LEN);
    let unsupported = |input: &[u8]| TranscodeError::UnsupportedFormat {
        header: String::from_utf8_lossy(&input[..input.len().min(MAX_HEADER_LEN)]).into_owned(),
    };

    if input.is_empty() {
        return Err(unsupported(input));
    }
    if input.len() < HEADER_PREFIX.len() {
        return if HEADER_PREFIX.starts_with(input) {
            Err(TranscodeError::TruncatedMessage)
        } else {
            Err(unsupported(input))
        };
    }
    if !input.starts_with(HEADER_PREFIX) {
        return Err(unsupported(input));
    }

    let close = match input[..probe_len].iter().position(|&b| b == b']') {
        Some(pos) => pos,
        None if input.len() < MAX_HEADER_LEN => return Err(TranscodeError::TruncatedMessage),
        None => return Err(unsupported(input)),
    };

    let body = &input[HEADER_PREFIX.len()..close];
    let header = parse_header_body(body).ok_or_else(|| unsupported(input))?;
    Ok((header, &input[close + 1..]))
}

/// Parses `<tag>-<version>` between the header prefix and `]`.
fn parse_header_body(body: &[u8]) -> Option<MessageHeader> {
    let text = std::str::from_utf8(body).ok()?;
    let (tag, version) = text.split_once('-')?;
    if tag.is_empty() || version.is_empty() {
        return None;
    }
    Some(MessageHeader {
        type_tag: tag.to_string(),
        version: version.to_string(),
    })
}

/// Checks a parsed header against the key the caller supplied.
///
/// An unknown tag or version is `UnsupportedFormat`. A known tag that
/// does not match the key is `KeyMismatch`: the message is fine, the
/// caller handed the wrong key variant to the transform.
pub fn check_header<K: TranscodingKey + ?Sized>(
    header: &MessageHeader,
    key: &K,
) -> Result<(), TranscodeError> {
    if header.version != FORMAT_VERSION || !KNOWN_TAGS.contains(&header.type_tag.as_str()) {
        return Err(TranscodeError::UnsupportedFormat {
            header: header.render(),
        });
    }
    if header.type_tag != key.type_tag() {
        return Err(TranscodeError::KeyMismatch {
            expected: header.type_tag.clone(),
            found: key.type_tag().to_string(),
        });
    }
    Ok(())
}

/// Incremental token parser.
///
/// Push bytes one at a time; a completed token pops out when the byte
/// that starts the next token arrives. Call [`TokenParser::finish`] at
/// end of input to flush the final token. The same machine backs bulk
/// decode, streaming decode, and the encoded segments of partial
/// streams.
#[derive(Debug)]
pub struct TokenParser {
    alphabet: &'static [u8],
    state: ParseState,
}

#[derive(Debug)]
enum ParseState {
    /// Expecting the first symbol of a token.
    Start,
    /// Reading the anchor index digits.
    FirstIndex {
        symbol1: u8,
        value: usize,
        digits: usize,
    },
    /// Reading the partner index digits.
    SecondIndex {
        symbol1: u8,
        location1: usize,
        symbol2: u8,
        value: usize,
        digits: usize,
    },
}

impl TokenParser {
    /// Creates a parser for a key's alphabet.
    pub fn new(alphabet: &'static [u8]) -> Self {
        Self {
            alphabet,
            state: ParseState::Start,
        }
    }

    /// Feeds one byte; returns a token when one is completed by this byte.
    pub fn push(&mut self, byte: u8) -> Result<Option<Token>, TranscodeError> {
        let is_symbol = self.alphabet.contains(&byte);
        let digit = (byte as char).to_digit(10);

        match self.state {
            ParseState::Start => {
                if is_symbol {
                    self.state = ParseState::FirstIndex {
                        symbol1: byte,
                        value: 0,
                        digits: 0,
                    };
                    Ok(None)
                } else {
                    Err(TranscodeError::malformed(format!(
                        "expected a symbol, found '{}'",
                        printable(byte)
                    )))
                }
            }
            ParseState::FirstIndex {
                symbol1,
                value,
                digits,
            } => {
                if let Some(d) = digit {
                    self.state = ParseState::FirstIndex {
                        symbol1,
                        value: accumulate(value, d as usize)?,
                        digits: digits + 1,
                    };
                    Ok(None)
                } else if is_symbol && digits > 0 {
                    self.state = ParseState::SecondIndex {
                        symbol1,
                        location1: value,
                        symbol2: byte,
                        value: 0,
                        digits: 0,
                    };
                    Ok(None)
                } else {
                    Err(TranscodeError::malformed(format!(
                        "symbol '{}' has no index digits",
                        symbol1 as char
                    )))
                }
            }
            ParseState::SecondIndex {
                symbol1,
                location1,
                symbol2,
                value,
                digits,
            } => {
                if let Some(d) = digit {
                    self.state = ParseState::SecondIndex {
                        symbol1,
                        location1,
                        symbol2,
                        value: accumulate(value, d as usize)?,
                        digits: digits + 1,
                    };
                    Ok(None)
                } else if is_symbol && digits > 0 {
                    let token = Token {
                        symbol1,
                        location1,
                        symbol2,
                        location2: value,
                    };
                    self.state = ParseState::FirstIndex {
                        symbol1: byte,
                        value: 0,
                        digits: 0,
                    };
                    Ok(Some(token))
                } else {
                    Err(TranscodeError::malformed(format!(
                        "symbol '{}' has no index digits",
                        symbol2 as char
                    )))
                }
            }
        }
    }

    /// Flushes the parser at end of input and resets it.
    ///
    /// A cleanly finished input yields the final token (or nothing, for
    /// an empty body); anything mid-token is `TruncatedMessage`.
    pub fn finish(&mut self) -> Result<Option<Token>, TranscodeError> {
        match std::mem::replace(&mut self.state, ParseState::Start) {
            ParseState::Start => Ok(None),
            ParseState::SecondIndex {
                symbol1,
                location1,
                symbol2,
                value,
                digits,
            } if digits > 0 => Ok(Some(Token {
                symbol1,
                location1,
                symbol2,
                location2: value,
            })),
            _ => Err(TranscodeError::TruncatedMessage),
        }
    }
}

/// Shifts one decimal digit into an index, rejecting overflow.
fn accumulate(value: usize, digit: usize) -> Result<usize, TranscodeError> {
    value
        .checked_mul(10)
        .and_then(|v| v.checked_add(digit))
        .ok_or_else(|| TranscodeError::malformed("location index too large"))
}

fn printable(byte: u8) -> String {
    if byte.is_ascii_graphic() || byte == b' ' {
        (byte as char).to_string()
    } else {
        format!("\\x{:02x}", byte)
    }
}
