//! Transcoding error types.

use thiserror::Error;

/// Errors that can occur while encoding or decoding against a key.
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// The key could not realize the required byte difference.
    ///
    /// Both the initial scan and the single retry from a fresh anchor were
    /// exhausted. The key is too small or too uniform for this byte value.
    #[error("match not found")]
    MatchNotFound,

    /// A token violated the grammar.
    #[error("malformed token: {reason}")]
    MalformedToken {
        /// What the parser saw instead of a valid token element.
        reason: String,
    },

    /// The message ended inside the header or inside a token.
    #[error("truncated message")]
    TruncatedMessage,

    /// The message header names an unknown key type or format version.
    #[error("unsupported format: {header}")]
    UnsupportedFormat {
        /// The offending header text (or what could be read of it).
        header: String,
    },

    /// The message was produced with a different key variant than supplied.
    #[error("key mismatch: message is {expected}, key is {found}")]
    KeyMismatch {
        /// Key type tag named by the message header.
        expected: String,
        /// Key type tag of the supplied key.
        found: String,
    },

    /// I/O error from an underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Builds a `MalformedToken` from anything printable.
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TranscodeError::MalformedToken {
            reason: reason.into(),
        }
    }

    /// Converts into an `std::io::Error` for delivery over a stream.
    ///
    /// I/O variants pass through untouched so the original kind survives.
    pub(crate) fn into_io(self) -> std::io::Error {
        match self {
            TranscodeError::Io(e) => e,
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
