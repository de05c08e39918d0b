//! # XBridge - Blocking I/O over an Event-Driven Transport
//!
//! XBridge lets code written in a blocking, sequential style drive a
//! connection whose I/O is owned by a single-threaded event loop that only
//! speaks through callbacks. It provides:
//!
//! - **Exchange channel**: order-preserving, error-carrying handoff from the event loop
//! - **Flow control**: the transport is paused unless a reader is actually waiting
//! - **Write gating**: writers wait while the outbound queue is congested
//! - **Two read styles**: chunk-at-a-time or accumulate-to-size
//! - **Bootstrap**: blocking client connects and a thread per accepted connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Application threads (blocking)                │
//! │  ┌──────────────────────┐  ┌──────────────────────────┐ │
//! │  │ UnbufferedTransport  │  │ BufferedTransport        │ │
//! │  └──────────────────────┘  └──────────────────────────┘ │
//! │        TransportBase: FlowControl, WriteGate             │
//! ├─────────────────────────────────────────────────────────┤
//! │                    Exchange channel                      │
//! ├─────────────────────────────────────────────────────────┤
//! │            Reactor thread (tokio current-thread)         │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────┐  │
//! │  │  Adapter    │◀─│ driver task  │─▶│ socket         │  │
//! │  └─────────────┘  └──────────────┘  └────────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use xbridge::{BridgeConfig, BufferedTransport, ClientCreator, Reactor, ReactorConfig};
//!
//! let reactor = Reactor::start(ReactorConfig::default())?;
//! let creator = ClientCreator::new(&reactor, BridgeConfig::default());
//! let mut conn: BufferedTransport = creator.connect_tcp("127.0.0.1", 8080)?;
//!
//! conn.write(b"GET / HTTP/1.0\r\n\r\n")?;
//! let head = conn.read(Some(12))?;
//! let rest = conn.read(None)?;
//! ```

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod bridge;
pub mod config;
pub mod error;
pub mod exchange;
pub mod flow;
pub mod protocol;
pub mod reactor;
pub mod transport;

// Re-export commonly used types
pub use bootstrap::{ClientCreator, SpawnFactory};
pub use bridge::{Bridge, BufferedTransport, TransportBase, UnbufferedTransport};
pub use config::{BridgeConfig, ReactorConfig};
pub use error::{Error, ErrorKind, Result};
pub use protocol::{Adapter, Delivery, Protocol};
pub use reactor::{Connector, Established, Listening, Reactor, StreamHandle};
pub use transport::{PeerAddr, PushProducer, Transport};
