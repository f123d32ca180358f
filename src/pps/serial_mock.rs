//! Mock byte sources for testing
//!
//! This module provides a mock serial port and a scripted event source that
//! can be used to test the PPS reader without a bus interface attached.

use crate::error::PpsError;
use crate::pps::source::{ByteEvent, ByteSource};
use crate::pps::telegram::pack_telegram;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Mock serial port that replays queued receive data.
///
/// Once the queue is drained a read returns zero bytes, which the
/// [`StreamSource`](crate::pps::source::StreamSource) reports as the end of
/// the stream.
#[derive(Clone)]
pub struct MockSerialPort {
    /// Data to be read from the port (incoming)
    pub rx_buffer: Arc<Mutex<VecDeque<u8>>>,
    /// Simulated errors
    pub next_error: Arc<Mutex<Option<io::Error>>>,
    /// Largest number of bytes handed out per read
    pub chunk_size: Arc<Mutex<usize>>,
}

impl Default for MockSerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSerialPort {
    pub fn new() -> Self {
        MockSerialPort {
            rx_buffer: Arc::new(Mutex::new(VecDeque::new())),
            next_error: Arc::new(Mutex::new(None)),
            chunk_size: Arc::new(Mutex::new(usize::MAX)),
        }
    }

    /// Queue data to be read from the port
    pub fn queue_rx_data(&self, data: &[u8]) {
        let mut rx = self.rx_buffer.lock().unwrap();
        rx.extend(data);
    }

    /// Queue a well-formed telegram
    pub fn queue_telegram(&self, address: u8, telegram_type: u8, value: u16) {
        self.queue_rx_data(&pack_telegram(address, telegram_type, value));
    }

    /// Bytes not yet read
    pub fn pending(&self) -> usize {
        self.rx_buffer.lock().unwrap().len()
    }

    /// Limit how many bytes a single read returns
    pub fn set_chunk_size(&self, size: usize) {
        *self.chunk_size.lock().unwrap() = size.max(1);
    }

    /// Set an error to be returned on the next read
    pub fn set_next_error(&self, error: io::Error) {
        *self.next_error.lock().unwrap() = Some(error);
    }
}

impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Poll::Ready(Err(error));
        }

        let chunk = *self.chunk_size.lock().unwrap();
        let mut rx = self.rx_buffer.lock().unwrap();
        let available = rx.len().min(buf.remaining()).min(chunk);

        if available > 0 {
            let data: Vec<u8> = rx.drain(..available).collect();
            buf.put_slice(&data);
        }

        Poll::Ready(Ok(()))
    }
}

/// Byte source that replays a fixed list of events, then reports the end
/// of the stream.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    events: VecDeque<ByteEvent>,
}

impl ScriptedSource {
    pub fn new(events: impl IntoIterator<Item = ByteEvent>) -> Self {
        ScriptedSource {
            events: events.into_iter().collect(),
        }
    }

    /// Script of raw bytes with no gaps
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes.iter().map(|b| ByteEvent::Byte(*b)))
    }

    /// Script of telegrams, each followed by an idle gap
    pub fn from_telegrams<'a>(telegrams: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut events = Vec::new();
        for t in telegrams {
            events.extend(t.iter().map(|b| ByteEvent::Byte(*b)));
            events.push(ByteEvent::Gap);
        }
        Self::new(events)
    }

    pub fn push(&mut self, event: ByteEvent) {
        self.events.push_back(event);
    }
}

#[async_trait]
impl ByteSource for ScriptedSource {
    async fn next_event(&mut self) -> Result<ByteEvent, PpsError> {
        Ok(self.events.pop_front().unwrap_or(ByteEvent::End))
    }
}
