//! Payload streaming
//!
//! Copies an exact number of zero bytes from an in-process source into a
//! writer, typically the stdin of a remote session.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use indicatif::ProgressBar;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::time::{timeout_at, Instant};

use crate::common::{Error, Result};
use crate::units::KILOBYTE;

/// Size of each chunk handed to the writer
const CHUNK_SIZE: usize = (64 * KILOBYTE) as usize;

/// Endless source of zero bytes
///
/// Never reports end-of-file. Create one per transfer.
#[derive(Debug, Default)]
pub struct ZeroSource {
    produced: u64,
}

impl ZeroSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes handed out so far
    pub fn produced(&self) -> u64 {
        self.produced
    }
}

impl AsyncRead for ZeroSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let n = buf.remaining();
        buf.initialize_unfilled().fill(0);
        buf.advance(n);
        self.produced += n as u64;
        Poll::Ready(Ok(()))
    }
}

/// Outcome of a payload copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    pub requested: u64,
    pub copied: u64,
}

impl TransferResult {
    pub fn is_exact(&self) -> bool {
        self.requested == self.copied
    }
}

/// Copy exactly `size` bytes from `source` into `sink`
///
/// The deadline is checked before every write and bounds each one, so a
/// stalled pipe cannot hold the copy past it. Writer errors end the copy
/// with the number of bytes the sink accepted, including partial chunks. The sink is flushed but
/// not shut down; closing it is the caller's decision.
pub async fn copy_exact<R, W>(
    source: &mut R,
    sink: &mut W,
    size: u64,
    deadline: Instant,
    progress: Option<&ProgressBar>,
) -> Result<TransferResult>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut limited = source.take(size);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut copied: u64 = 0;

    loop {
        if Instant::now() >= deadline {
            return Err(Error::TransferTimeout { copied });
        }

        let n = limited.read(&mut buf).await.map_err(Error::Io)?;
        if n == 0 {
            break;
        }

        // Count what the sink accepts per write, not per chunk
        let mut offset = 0;
        while offset < n {
            if offset > 0 && Instant::now() >= deadline {
                return Err(Error::TransferTimeout { copied });
            }
            let written = match timeout_at(deadline, sink.write(&buf[offset..n])).await {
                Ok(Ok(0)) => {
                    return Err(Error::Transport {
                        copied,
                        source: io::Error::new(io::ErrorKind::WriteZero, "sink accepted no bytes"),
                    })
                }
                Ok(Ok(written)) => written,
                Ok(Err(source)) => return Err(Error::Transport { copied, source }),
                Err(_) => return Err(Error::TransferTimeout { copied }),
            };
            offset += written;
            copied += written as u64;
            if let Some(pb) = progress {
                pb.set_position(copied);
            }
        }
    }

    match timeout_at(deadline, sink.flush()).await {
        Ok(Ok(())) => {}
        Ok(Err(source)) => return Err(Error::Transport { copied, source }),
        Err(_) => return Err(Error::TransferTimeout { copied }),
    }

    let result = TransferResult {
        requested: size,
        copied,
    };
    if !result.is_exact() {
        return Err(Error::ShortTransfer {
            requested: size,
            copied,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::MEGABYTE;
    use std::time::Duration;

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[tokio::test]
    async fn test_zero_source_yields_zeros_forever() {
        let mut source = ZeroSource::new();
        let mut buf = vec![0xffu8; 4096];
        for _ in 0..4 {
            let n = source.read(&mut buf).await.unwrap();
            assert_eq!(n, 4096);
            assert!(buf.iter().all(|b| *b == 0));
            buf.fill(0xff);
        }
        assert_eq!(source.produced(), 4 * 4096);
    }

    #[tokio::test]
    async fn test_copy_exact_counts_every_byte() {
        let size = 3 * MEGABYTE + 17;
        let mut sink = Vec::new();
        let result = copy_exact(&mut ZeroSource::new(), &mut sink, size, deadline(), None)
            .await
            .unwrap();

        assert_eq!(result.copied, size);
        assert!(result.is_exact());
        assert_eq!(sink.len() as u64, size);
        assert!(sink.iter().all(|b| *b == 0));
    }

    #[tokio::test]
    async fn test_copy_exact_zero_bytes() {
        let mut sink = Vec::new();
        let result = copy_exact(&mut ZeroSource::new(), &mut sink, 0, deadline(), None)
            .await
            .unwrap();
        assert_eq!(result, TransferResult { requested: 0, copied: 0 });
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_copy_exact_short_source() {
        let mut source: &[u8] = &[0u8; 100];
        let mut sink = Vec::new();
        let err = copy_exact(&mut source, &mut sink, 1000, deadline(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ShortTransfer { requested: 1000, copied: 100 }));
    }

    #[tokio::test]
    async fn test_copy_exact_reports_partial_count_on_broken_pipe() {
        let (mut writer, reader) = tokio::io::duplex(CHUNK_SIZE);
        let drain = tokio::spawn(async move {
            let mut reader = reader;
            let mut buf = vec![0u8; CHUNK_SIZE];
            let mut total = 0usize;
            while total < 2 * CHUNK_SIZE {
                total += reader.read(&mut buf).await.unwrap();
            }
            total
        });

        let err = copy_exact(
            &mut ZeroSource::new(),
            &mut writer,
            64 * MEGABYTE,
            deadline(),
            None,
        )
        .await
        .unwrap_err();

        let drained = drain.await.unwrap() as u64;
        match err {
            Error::Transport { copied, .. } => {
                assert!(copied >= drained.min(2 * CHUNK_SIZE as u64));
                assert!(copied < 64 * MEGABYTE);
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    /// Accepts up to `capacity` bytes, then fails with a broken pipe
    struct ClosingSink {
        capacity: usize,
        accepted: usize,
    }

    impl AsyncWrite for ClosingSink {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let room = self.capacity - self.accepted;
            if room == 0 {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")));
            }
            let n = buf.len().min(room);
            self.accepted += n;
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_copy_exact_counts_partial_chunk_before_failure() {
        let mut sink = ClosingSink {
            capacity: 100_000,
            accepted: 0,
        };
        let err = copy_exact(&mut ZeroSource::new(), &mut sink, 1_000_000, deadline(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(err.bytes_copied(), Some(sink.accepted as u64));
        assert_eq!(err.bytes_copied(), Some(100_000));
    }

    #[tokio::test]
    async fn test_copy_exact_honours_deadline() {
        // Nobody reads the other end, so the second chunk blocks
        let (mut writer, _reader) = tokio::io::duplex(CHUNK_SIZE);
        let limit = Instant::now() + Duration::from_millis(200);

        let err = copy_exact(&mut ZeroSource::new(), &mut writer, 16 * MEGABYTE, limit, None)
            .await
            .unwrap_err();

        match err {
            Error::TransferTimeout { copied } => assert_eq!(copied, CHUNK_SIZE as u64),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_copy_exact_past_deadline_copies_nothing() {
        let mut sink = Vec::new();
        let err = copy_exact(&mut ZeroSource::new(), &mut sink, 10, Instant::now(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TransferTimeout { copied: 0 }));
    }
}
