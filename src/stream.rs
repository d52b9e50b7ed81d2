//! Reader half of the streaming handoff.
//!
//! Streaming strategies run a single background task that produces
//! chunks into a capacity-1 channel: the producer blocks until the
//! consumer drains the previous chunk, so memory stays constant no
//! matter how large the source is. [`TranscodedReader`] is the consumer
//! half, exposed as `AsyncRead` so encoded and decoded streams compose
//! with any tokio I/O.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;

/// A unit of produced output, or the producer's terminal error.
pub(crate) type Chunk = io::Result<Vec<u8>>;

/// Consumer half of a streaming transcode.
///
/// Yields produced chunks in order. A clean end of source reads as EOF;
/// a producer-side failure surfaces as the error of the next read, after
/// which the stream reads as EOF. Dropping the reader closes the channel
/// and the producer task stops at its next send.
#[derive(Debug)]
pub struct TranscodedReader {
    rx: mpsc::Receiver<Chunk>,
    pending: Vec<u8>,
    offset: usize,
    finished: bool,
}

impl TranscodedReader {
    /// Creates the rendezvous channel and its reader half.
    pub(crate) fn channel() -> (mpsc::Sender<Chunk>, TranscodedReader) {
        let (tx, rx) = mpsc::channel(1);
        (
            tx,
            TranscodedReader {
                rx,
                pending: Vec::new(),
                offset: 0,
                finished: false,
            },
        )
    }
}

impl AsyncRead for TranscodedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if this.offset < this.pending.len() {
                let n = (this.pending.len() - this.offset).min(buf.remaining());
                buf.put_slice(&this.pending[this.offset..this.offset + n]);
                this.offset += n;
                return Poll::Ready(Ok(()));
            }
            if this.finished {
                return Poll::Ready(Ok(()));
            }
            match this.rx.poll_recv(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.pending = chunk;
                    this.offset = 0;
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Err(e));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    return Poll::Ready(Ok(()));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_chunks_arrive_in_order() {
        let (tx, mut reader) = TranscodedReader::channel();
        tokio::spawn(async move {
            tx.send(Ok(b"hello ".to_vec())).await.unwrap();
            tx.send(Ok(b"world".to_vec())).await.unwrap();
        });

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello world");
    }

    #[tokio::test]
    async fn test_error_is_terminal() {
        let (tx, mut reader) = TranscodedReader::channel();
        tokio::spawn(async move {
            tx.send(Ok(b"ok".to_vec())).await.unwrap();
            tx.send(Err(io::Error::new(io::ErrorKind::InvalidData, "boom")))
                .await
                .unwrap();
        });

        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ok");

        let err = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        // After the error the stream reads as EOF.
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dropping_reader_stops_producer() {
        let (tx, reader) = TranscodedReader::channel();
        drop(reader);
        assert!(tx.send(Ok(vec![1])).await.is_err());
    }
}
