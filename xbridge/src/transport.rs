//! Connection handle capabilities.
//!
//! This module provides the [`Transport`] trait listing every operation the
//! bridge forwards to the underlying connection handle, and the
//! [`PushProducer`] trait the handle calls back into for outbound flow control.
//!
//! # Implementations
//!
//! - `StreamHandle`: handle to a socket driven by the [`Reactor`](crate::Reactor)
//! - Test doubles implementing only the required methods

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Address of either end of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAddr {
    Tcp(SocketAddr),
    Unix(Option<PathBuf>),
    /// Anything a custom connector reports.
    Other(String),
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerAddr::Tcp(addr) => write!(f, "{}", addr),
            PeerAddr::Unix(Some(path)) => write!(f, "unix:{}", path.display()),
            PeerAddr::Unix(None) => write!(f, "unix:<unnamed>"),
            PeerAddr::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Outbound-flow listener registered on a transport.
///
/// The transport calls these from the event loop thread, so implementations
/// must return immediately.
pub trait PushProducer: Send + Sync {
    /// The outbound buffer is congested.
    fn pause_producing(&self);

    /// The outbound buffer drained.
    fn resume_producing(&self);

    /// The transport is going away; no further calls follow.
    fn stop_producing(&self);
}

/// Capability interface of a connection handle.
///
/// Required methods are the ones every handle has. Optional capabilities
/// default to [`Error::Unsupported`].
pub trait Transport {
    /// Queues bytes for sending. Never blocks.
    fn write(&self, data: &[u8]) -> Result<()>;

    /// Stops delivery of inbound data.
    fn pause_producing(&self);

    /// Restarts delivery of inbound data.
    fn resume_producing(&self);

    /// Registers the outbound-flow listener.
    fn register_producer(&self, producer: Box<dyn PushProducer>, streaming: bool) -> Result<()>;

    /// Sets the outbound buffer size at which the producer is paused.
    fn set_buffer_size(&self, _size: usize) -> Result<()> {
        Err(Error::unsupported::<Self>("set_buffer_size"))
    }

    fn peer_addr(&self) -> Result<PeerAddr> {
        Err(Error::unsupported::<Self>("peer_addr"))
    }

    fn local_addr(&self) -> Result<PeerAddr> {
        Err(Error::unsupported::<Self>("local_addr"))
    }

    /// Closes the connection once queued writes are flushed.
    fn lose_connection(&self) -> Result<()> {
        Err(Error::unsupported::<Self>("lose_connection"))
    }
}
