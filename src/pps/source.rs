//! # Byte Sources
//!
//! The bus carries no start or stop markers, so the reader needs to know not
//! only which bytes arrived but also when the line went quiet. A
//! [`ByteSource`] therefore yields [`ByteEvent`]s: data bytes, idle gaps and
//! the end of the stream.

use crate::error::PpsError;
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

/// One observation of the receive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteEvent {
    /// A received data byte
    Byte(u8),
    /// The line stayed idle for longer than the inter-telegram silence
    Gap,
    /// The stream has ended; no further events follow
    End,
}

/// Trait for producers of bus events
#[async_trait]
pub trait ByteSource: Send {
    /// Wait for the next event. Blocks while the line is busy but silent for
    /// less than one gap.
    async fn next_event(&mut self) -> Result<ByteEvent, PpsError>;
}

/// Adapts any async byte stream (serial port, file, pipe) into a
/// [`ByteSource`], deriving gaps from a read timeout.
pub struct StreamSource<R> {
    reader: R,
    gap: Duration,
    buf: [u8; 64],
    pos: usize,
    len: usize,
    ended: bool,
}

impl<R: AsyncRead + Unpin + Send> StreamSource<R> {
    /// Create a source that reports a gap after `gap` of silence
    pub fn new(reader: R, gap: Duration) -> Self {
        StreamSource {
            reader,
            gap,
            buf: [0u8; 64],
            pos: 0,
            len: 0,
            ended: false,
        }
    }

    /// Silence after which a gap is reported
    pub fn gap(&self) -> Duration {
        self.gap
    }

    /// Give back the wrapped reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ByteSource for StreamSource<R> {
    async fn next_event(&mut self) -> Result<ByteEvent, PpsError> {
        if self.pos < self.len {
            let b = self.buf[self.pos];
            self.pos += 1;
            return Ok(ByteEvent::Byte(b));
        }
        if self.ended {
            return Ok(ByteEvent::End);
        }

        match timeout(self.gap, self.reader.read(&mut self.buf)).await {
            Err(_) => Ok(ByteEvent::Gap),
            Ok(Ok(0)) => {
                self.ended = true;
                Ok(ByteEvent::End)
            }
            Ok(Ok(n)) => {
                self.len = n;
                self.pos = 1;
                Ok(ByteEvent::Byte(self.buf[0]))
            }
            // Serial drivers may surface their own read timeout instead of
            // blocking; that is an idle line as well.
            Ok(Err(e)) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(ByteEvent::Gap)
            }
            Ok(Err(e)) => Err(PpsError::Io(e)),
        }
    }
}
