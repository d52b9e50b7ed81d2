//! Execution strategies over the per-byte transform.
//!
//! Four disciplines share the same match search and grammar:
//!
//! - [`encode`]/[`decode`]: one byte at a time, in order; the first
//!   failure aborts with that byte's error.
//! - [`encode_parallel`]: one task per input byte; every task owns the
//!   output slot matching its index, so the assembled message is
//!   byte-identical to the sequential one regardless of completion
//!   order. Failures funnel into a bounded channel and the lowest
//!   failing index wins.
//! - [`encode_stream`]/[`decode_stream`]: a single background task and
//!   a capacity-1 handoff; the producer blocks until the consumer
//!   reads, keeping memory constant in the source length.
//! - [`encode_partial_stream`]/[`decode_partial_stream`]: streaming
//!   with alternating encoded frames (`take` bytes) and raw passthrough
//!   (`skip` bytes) until the source is exhausted.
//!
//! The key is read-only and shared freely across tasks; nothing here
//! mutates it.

use std::io;
use std::sync::Arc;

use rand::Rng;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;

use crate::error::TranscodeError;
use crate::grammar::{self, Token, TokenParser, PARTIAL_END, PARTIAL_START};
use crate::key::TranscodingKey;
use crate::matcher::{resolve_token, MatchFinder};
use crate::stream::{Chunk, TranscodedReader};

/// Encodes `input` sequentially: header, then one token per byte.
pub fn encode<K: TranscodingKey + ?Sized>(
    input: &[u8],
    key: &K,
) -> Result<Vec<u8>, TranscodeError> {
    encode_with_finder(input, key, &mut MatchFinder::new())
}

/// Sequential encode with a caller-supplied finder.
///
/// Lets callers pin the random source, e.g. [`MatchFinder::seeded`] for
/// reproducible output.
pub fn encode_with_finder<K: TranscodingKey + ?Sized, R: Rng>(
    input: &[u8],
    key: &K,
    finder: &mut MatchFinder<R>,
) -> Result<Vec<u8>, TranscodeError> {
    let mut output = grammar::message_header(key.type_tag()).into_bytes();
    for &byte in input {
        let token = finder.find_pair(byte, key)?;
        output.extend_from_slice(token.render().as_bytes());
    }
    Ok(output)
}

/// Decodes a full message against `key`.
pub fn decode<K: TranscodingKey + ?Sized>(
    input: &[u8],
    key: &K,
) -> Result<Vec<u8>, TranscodeError> {
    let (header, body) = grammar::parse_header(input)?;
    grammar::check_header(&header, key)?;

    let mut parser = TokenParser::new(key.alphabet());
    let mut output = Vec::new();
    for &byte in body {
        if let Some(token) = parser.push(byte)? {
            output.push(resolve_token(&token, key)?);
        }
    }
    if let Some(token) = parser.finish()? {
        output.push(resolve_token(&token, key)?);
    }
    Ok(output)
}

/// Encodes `input` with one concurrent task per input byte.
///
/// Output byte order matches input order: task `i` fills slot `i`, and
/// slots are concatenated only after every task has finished. When
/// several tasks fail, the error of the lowest input index is surfaced
/// and the output is discarded.
pub async fn encode_parallel<K>(input: &[u8], key: Arc<K>) -> Result<Vec<u8>, TranscodeError>
where
    K: TranscodingKey + ?Sized + 'static,
{
    let mut output = grammar::message_header(key.type_tag()).into_bytes();

    let (err_tx, mut err_rx) = mpsc::channel::<(usize, TranscodeError)>(input.len().max(1));
    let mut handles = Vec::with_capacity(input.len());
    for (index, &byte) in input.iter().enumerate() {
        let key = Arc::clone(&key);
        let err_tx = err_tx.clone();
        handles.push(tokio::spawn(async move {
            let mut finder = MatchFinder::new();
            match finder.find_pair(byte, key.as_ref()) {
                Ok(token) => Some(token.render()),
                Err(e) => {
                    // Sized to the input length, so this never blocks.
                    let _ = err_tx.try_send((index, e));
                    None
                }
            }
        }));
    }
    drop(err_tx);

    let mut slots: Vec<Option<String>> = Vec::with_capacity(handles.len());
    for handle in handles {
        let slot = handle
            .await
            .map_err(|e| TranscodeError::Io(io::Error::new(io::ErrorKind::Other, e)))?;
        slots.push(slot);
    }

    let mut first_failure: Option<(usize, TranscodeError)> = None;
    while let Ok((index, err)) = err_rx.try_recv() {
        match first_failure {
            Some((lowest, _)) if lowest <= index => {}
            _ => first_failure = Some((index, err)),
        }
    }
    if let Some((_, err)) = first_failure {
        return Err(err);
    }

    for slot in slots {
        let token = slot.ok_or(TranscodeError::MatchNotFound)?;
        output.extend_from_slice(token.as_bytes());
    }
    Ok(output)
}

/// Encodes a source stream into a message stream.
///
/// Spawns the producer task immediately; must be called within a tokio
/// runtime. The returned reader yields the header, then one token per
/// source byte, and ends when the source does. Read and match failures
/// close the stream with that error.
pub fn encode_stream<R, K>(source: R, key: Arc<K>) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
    K: TranscodingKey + ?Sized + 'static,
{
    let (tx, reader) = TranscodedReader::channel();
    tokio::spawn(run_encode_stream(source, key, tx));
    reader
}

/// Decodes a message stream back into payload bytes.
pub fn decode_stream<R, K>(source: R, key: Arc<K>) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
    K: TranscodingKey + ?Sized + 'static,
{
    let (tx, reader) = TranscodedReader::channel();
    tokio::spawn(run_decode_stream(source, key, tx));
    reader
}

/// Encodes a source stream partially.
///
/// Each frame encodes `take` bytes between the partial markers and then
/// copies `skip` bytes through untouched; frames repeat until the
/// source is exhausted, which ends the stream cleanly. With `take == 0`
/// nothing is ever encoded and the entire source passes through raw.
pub fn encode_partial_stream<R, K>(
    source: R,
    key: Arc<K>,
    take: usize,
    skip: usize,
) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
    K: TranscodingKey + ?Sized + 'static,
{
    let (tx, reader) = TranscodedReader::channel();
    tokio::spawn(run_encode_partial(source, key, take, skip, tx));
    reader
}

/// Decodes a partially encoded stream.
///
/// Bytes between the partial markers are parsed and decoded as a full
/// message; everything outside passes through unmodified.
pub fn decode_partial_stream<R, K>(source: R, key: Arc<K>) -> TranscodedReader
where
    R: AsyncRead + Unpin + Send + 'static,
    K: TranscodingKey + ?Sized + 'static,
{
    let (tx, reader) = TranscodedReader::channel();
    tokio::spawn(run_decode_partial(source, key, tx));
    reader
}

async fn run_encode_stream<R, K>(source: R, key: Arc<K>, tx: mpsc::Sender<Chunk>)
where
    R: AsyncRead + Unpin,
    K: TranscodingKey + ?Sized,
{
    let mut source = BufReader::new(source);
    if !send_ok(&tx, grammar::message_header(key.type_tag()).into_bytes()).await {
        return;
    }
    let mut finder = MatchFinder::new();
    loop {
        let byte = match source.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return,
            Err(e) => return send_err(&tx, e).await,
        };
        match finder.find_pair(byte, key.as_ref()) {
            Ok(token) => {
                if !send_ok(&tx, token.render().into_bytes()).await {
                    return;
                }
            }
            Err(e) => return send_err(&tx, e.into_io()).await,
        }
    }
}

async fn run_decode_stream<R, K>(source: R, key: Arc<K>, tx: mpsc::Sender<Chunk>)
where
    R: AsyncRead + Unpin,
    K: TranscodingKey + ?Sized,
{
    let mut source = BufReader::new(source);
    if let Err(e) = read_stream_header(&mut source, key.as_ref()).await {
        return send_err(&tx, e.into_io()).await;
    }

    let mut parser = TokenParser::new(key.alphabet());
    loop {
        let byte = match source.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                match parser.finish() {
                    Ok(Some(token)) => {
                        emit_resolved(&tx, &token, key.as_ref()).await;
                    }
                    Ok(None) => {}
                    Err(e) => send_err(&tx, e.into_io()).await,
                }
                return;
            }
            Err(e) => return send_err(&tx, e).await,
        };
        match parser.push(byte) {
            Ok(Some(token)) => {
                if !emit_resolved(&tx, &token, key.as_ref()).await {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => return send_err(&tx, e.into_io()).await,
        }
    }
}

async fn run_encode_partial<R, K>(
    source: R,
    key: Arc<K>,
    take: usize,
    skip: usize,
    tx: mpsc::Sender<Chunk>,
) where
    R: AsyncRead + Unpin,
    K: TranscodingKey + ?Sized,
{
    let mut source = BufReader::new(source);
    if take == 0 {
        // Nothing is ever encoded; the whole source passes through.
        copy_raw(&mut source, &tx, usize::MAX).await;
        return;
    }

    let header = grammar::message_header(key.type_tag());
    let mut finder = MatchFinder::new();
    loop {
        // Encoded frame: up to `take` bytes. The frame opens lazily so
        // an already-exhausted source ends the stream without an empty
        // trailing frame.
        let mut opened = false;
        let mut encoded = 0;
        let mut at_eof = false;
        while encoded < take {
            let byte = match source.read_u8().await {
                Ok(b) => b,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    at_eof = true;
                    break;
                }
                Err(e) => return send_err(&tx, e).await,
            };
            if !opened {
                if !send_ok(&tx, PARTIAL_START.to_vec()).await
                    || !send_ok(&tx, header.clone().into_bytes()).await
                {
                    return;
                }
                opened = true;
            }
            match finder.find_pair(byte, key.as_ref()) {
                Ok(token) => {
                    if !send_ok(&tx, token.render().into_bytes()).await {
                        return;
                    }
                }
                Err(e) => return send_err(&tx, e.into_io()).await,
            }
            encoded += 1;
        }
        if opened && !send_ok(&tx, PARTIAL_END.to_vec()).await {
            return;
        }
        if at_eof {
            return;
        }
        // Raw passthrough: up to `skip` bytes; end-of-source completes
        // the stream.
        match copy_raw(&mut source, &tx, skip).await {
            CopyOutcome::Continue => {}
            CopyOutcome::Stop => return,
        }
    }
}

async fn run_decode_partial<R, K>(source: R, key: Arc<K>, tx: mpsc::Sender<Chunk>)
where
    R: AsyncRead + Unpin,
    K: TranscodingKey + ?Sized,
{
    let mut source = BufReader::new(source);
    // How much of the start marker the recent raw bytes match.
    let mut matched = 0;
    loop {
        let byte = match source.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                if matched > 0 {
                    send_ok(&tx, PARTIAL_START[..matched].to_vec()).await;
                }
                return;
            }
            Err(e) => return send_err(&tx, e).await,
        };
        if byte == PARTIAL_START[matched] {
            matched += 1;
            if matched == PARTIAL_START.len() {
                matched = 0;
                if !decode_frame(&mut source, key.as_ref(), &tx).await {
                    return;
                }
            }
        } else {
            // False start: flush what looked like a marker, then give
            // this byte a fresh chance to open one.
            if matched > 0 {
                if !send_ok(&tx, PARTIAL_START[..matched].to_vec()).await {
                    return;
                }
                matched = 0;
            }
            if byte == PARTIAL_START[0] {
                matched = 1;
            } else if !send_ok(&tx, vec![byte]).await {
                return;
            }
        }
    }
}

/// Decodes one marker-framed segment; `true` means keep streaming.
async fn decode_frame<R, K>(source: &mut R, key: &K, tx: &mpsc::Sender<Chunk>) -> bool
where
    R: AsyncRead + Unpin,
    K: TranscodingKey + ?Sized,
{
    if let Err(e) = read_stream_header(source, key).await {
        send_err(tx, e.into_io()).await;
        return false;
    }
    let mut parser = TokenParser::new(key.alphabet());
    loop {
        let byte = match source.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                send_err(tx, TranscodeError::TruncatedMessage.into_io()).await;
                return false;
            }
            Err(e) => {
                send_err(tx, e).await;
                return false;
            }
        };
        if byte == PARTIAL_END[0] {
            match parser.finish() {
                Ok(Some(token)) => {
                    if !emit_resolved(tx, &token, key).await {
                        return false;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    send_err(tx, e.into_io()).await;
                    return false;
                }
            }
            return expect_end_mark(source, tx).await;
        }
        match parser.push(byte) {
            Ok(Some(token)) => {
                if !emit_resolved(tx, &token, key).await {
                    return false;
                }
            }
            Ok(None) => {}
            Err(e) => {
                send_err(tx, e.into_io()).await;
                return false;
            }
        }
    }
}

/// Consumes the remainder of the end marker after its first byte.
async fn expect_end_mark<R: AsyncRead + Unpin>(source: &mut R, tx: &mpsc::Sender<Chunk>) -> bool {
    for &expected in &PARTIAL_END[1..] {
        match source.read_u8().await {
            Ok(b) if b == expected => {}
            Ok(b) => {
                let err = TranscodeError::malformed(format!(
                    "broken end mark: expected '{}', found '{}'",
                    expected as char, b as char
                ));
                send_err(tx, err.into_io()).await;
                return false;
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                send_err(tx, TranscodeError::TruncatedMessage.into_io()).await;
                return false;
            }
            Err(e) => {
                send_err(tx, e).await;
                return false;
            }
        }
    }
    true
}

/// Reads and validates a message header byte by byte.
///
/// Stops at the closing bracket so it works both at the front of a
/// whole stream and inside a partial frame.
async fn read_stream_header<R, K>(source: &mut R, key: &K) -> Result<(), TranscodeError>
where
    R: AsyncRead + Unpin,
    K: TranscodingKey + ?Sized,
{
    let mut buf = Vec::with_capacity(24);
    loop {
        let byte = match source.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                grammar::parse_header(&buf)?;
                return Err(TranscodeError::TruncatedMessage);
            }
            Err(e) => return Err(e.into()),
        };
        buf.push(byte);
        if byte == b']' {
            let (header, _) = grammar::parse_header(&buf)?;
            return grammar::check_header(&header, key);
        }
        if buf.len() >= 64 {
            grammar::parse_header(&buf)?;
            return Err(TranscodeError::TruncatedMessage);
        }
    }
}

enum CopyOutcome {
    /// The limit was reached with source bytes (possibly) remaining.
    Continue,
    /// End of source, consumer gone, or error already delivered.
    Stop,
}

/// Copies up to `limit` source bytes through verbatim.
async fn copy_raw<R: AsyncRead + Unpin>(
    source: &mut R,
    tx: &mpsc::Sender<Chunk>,
    limit: usize,
) -> CopyOutcome {
    let mut remaining = limit;
    let mut buf = [0u8; 1024];
    while remaining > 0 {
        let want = remaining.min(buf.len());
        match source.read(&mut buf[..want]).await {
            Ok(0) => return CopyOutcome::Stop,
            Ok(n) => {
                if !send_ok(tx, buf[..n].to_vec()).await {
                    return CopyOutcome::Stop;
                }
                remaining -= n;
            }
            Err(e) => {
                send_err(tx, e).await;
                return CopyOutcome::Stop;
            }
        }
    }
    CopyOutcome::Continue
}

/// Resolves a token and hands the byte to the consumer; `false` means
/// the stream is finished (error delivered or consumer gone).
async fn emit_resolved<K: TranscodingKey + ?Sized>(
    tx: &mpsc::Sender<Chunk>,
    token: &Token,
    key: &K,
) -> bool {
    match resolve_token(token, key) {
        Ok(byte) => send_ok(tx, vec![byte]).await,
        Err(e) => {
            send_err(tx, e.into_io()).await;
            false
        }
    }
}

async fn send_ok(tx: &mpsc::Sender<Chunk>, chunk: Vec<u8>) -> bool {
    tx.send(Ok(chunk)).await.is_ok()
}

async fn send_err(tx: &mpsc::Sender<Chunk>, err: io::Error) {
    let _ = tx.send(Err(err)).await;
}
