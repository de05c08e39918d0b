//! Bridge with an internal byte accumulator.

use std::io;
use std::ops::{Deref, DerefMut};

use bytes::{Bytes, BytesMut};

use super::{Bridge, Terminal, TransportBase};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::reactor::StreamHandle;
use crate::transport::Transport;

/// Buffers inbound bytes so reads can be bounded by size.
///
/// An abnormal closure is held back until every byte received before it has
/// been returned, then reported once.
pub struct BufferedTransport<H = StreamHandle> {
    base: TransportBase<H>,
    buffer: BytesMut,
    error: Option<Error>,
}

impl<H: Transport> BufferedTransport<H> {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            base: TransportBase::new(config, std::any::type_name::<Self>()),
            buffer: BytesMut::new(),
            error: None,
        }
    }

    /// Reads `size` bytes, or everything until EOF when `size` is `None`.
    ///
    /// Returns fewer than `size` bytes only when the stream ended first.
    pub fn read(&mut self, size: Option<usize>) -> Result<Bytes> {
        if !self.base.is_exhausted() {
            let outcome = self
                .base
                .fill_while(&mut self.buffer, |buffer| size.is_none_or(|size| buffer.len() < size));
            self.settle(outcome)?;
        }
        let result = match size {
            Some(size) => self.buffer.split_to(size.min(self.buffer.len())),
            None => self.buffer.split(),
        };
        self.finish(result.freeze())
    }

    /// Receives at most one upstream chunk, returning up to `maxlen` bytes.
    ///
    /// Bytes beyond `maxlen` stay buffered for the next call.
    pub fn recv(&mut self, maxlen: Option<usize>) -> Result<Bytes> {
        if !self.base.is_exhausted() && self.buffer.is_empty() {
            let outcome = self.base.fill_while(&mut self.buffer, |buffer| buffer.is_empty());
            self.settle(outcome)?;
        }
        let result = match maxlen {
            Some(maxlen) => self.buffer.split_to(maxlen.min(self.buffer.len())),
            None => self.buffer.split(),
        };
        self.finish(result.freeze())
    }

    /// Number of bytes received and not yet returned.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drops any buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn write(&self, data: &[u8]) -> Result<()> {
        self.base.write(data)
    }

    fn settle(&mut self, outcome: Result<()>) -> Result<()> {
        match Terminal::classify(outcome)? {
            None => {}
            Some(Terminal::Done) => self.base.exhaust(),
            Some(Terminal::Failed(error)) => {
                log::debug!("Holding back error until {} buffered bytes are read: {}", self.buffer.len(), error);
                self.base.exhaust();
                self.error = Some(error);
            }
        }
        Ok(())
    }

    fn finish(&mut self, result: Bytes) -> Result<Bytes> {
        if result.is_empty() {
            if let Some(error) = self.error.take() {
                return Err(error);
            }
        }
        Ok(result)
    }
}

impl<H: Transport> Bridge for BufferedTransport<H> {
    type Handle = H;

    fn with_config(config: BridgeConfig) -> Self {
        Self::new(config)
    }

    fn base(&self) -> &TransportBase<H> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TransportBase<H> {
        &mut self.base
    }
}

impl<H: Transport> Deref for BufferedTransport<H> {
    type Target = TransportBase<H>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl<H: Transport> DerefMut for BufferedTransport<H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

impl<H: Transport> Iterator for BufferedTransport<H> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.recv(None) {
            Ok(chunk) if chunk.is_empty() => None,
            other => Some(other),
        }
    }
}

impl<H: Transport> io::Read for BufferedTransport<H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let chunk = self.recv(Some(buf.len()))?;
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl<H: Transport> io::Write for BufferedTransport<H> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.base.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
