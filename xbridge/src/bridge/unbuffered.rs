//! Bridge without an internal byte buffer.

use std::io;
use std::ops::{Deref, DerefMut};

use bytes::{Bytes, BytesMut};

use super::{Bridge, Terminal, TransportBase};
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::reactor::StreamHandle;
use crate::transport::Transport;

/// Each `recv` hands back exactly one upstream chunk.
pub struct UnbufferedTransport<H = StreamHandle> {
    base: TransportBase<H>,
}

impl<H: Transport> UnbufferedTransport<H> {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            base: TransportBase::new(config, std::any::type_name::<Self>()),
        }
    }

    /// Receives a single chunk of undefined size.
    ///
    /// Returns an empty chunk if the connection was closed cleanly and the
    /// error if it was not. Every call after that returns an empty chunk.
    pub fn recv(&mut self) -> Result<Bytes> {
        if self.base.is_exhausted() {
            return Ok(Bytes::new());
        }
        let chunk = self.base.wait_chunk();
        let terminal = match chunk {
            Ok(chunk) => return Ok(chunk),
            Err(error) => Terminal::classify(Err(error))?,
        };
        self.base.exhaust();
        match terminal {
            Some(Terminal::Failed(error)) => Err(error),
            Some(Terminal::Done) | None => Ok(Bytes::new()),
        }
    }

    /// Reads until the connection closes cleanly.
    ///
    /// If it closes with an error, the data received so far is dropped and
    /// the error is returned; the next call returns an empty chunk.
    pub fn read(&mut self) -> Result<Bytes> {
        let mut result = BytesMut::new();
        loop {
            let chunk = self.recv()?;
            if chunk.is_empty() {
                break;
            }
            result.extend_from_slice(&chunk);
        }
        Ok(result.freeze())
    }

    pub fn write(&self, data: &[u8]) -> Result<()> {
        self.base.write(data)
    }
}

impl<H: Transport> Bridge for UnbufferedTransport<H> {
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

impl<H: Transport> Deref for UnbufferedTransport<H> {
    type Target = TransportBase<H>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl<H: Transport> DerefMut for UnbufferedTransport<H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

impl<H: Transport> Iterator for UnbufferedTransport<H> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.recv() {
            Ok(chunk) if chunk.is_empty() => None,
            other => Some(other),
        }
    }
}

impl<H: Transport> io::Write for UnbufferedTransport<H> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.base.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
