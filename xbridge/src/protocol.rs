//! Event loop callback surface.
//!
//! The event loop reports connection lifecycle through [`Protocol`]. The
//! [`Adapter`] implementation turns each callback into one item on an
//! exchange channel, which is how the asynchronous side talks to a blocking
//! bridge.

use bytes::Bytes;

use crate::error::Error;
use crate::exchange::ExchangeSender;

/// One item travelling from the event loop to the bridge.
#[derive(Debug)]
pub enum Delivery<H> {
    /// The connection handle. Always the first item.
    Connected(H),

    /// One inbound chunk, exactly as the event loop read it.
    Data(Bytes),
}

/// Callbacks invoked by the event loop, on the event loop thread.
///
/// Implementations must not block.
pub trait Protocol<H>: Send + 'static {
    fn connection_made(&mut self, transport: H);

    fn data_received(&mut self, data: Bytes);

    /// `reason` is [`Error::ConnectionDone`] for a clean close.
    fn connection_lost(&mut self, reason: Error);

    /// A client connect attempt failed before any handle existed.
    fn connection_failed(&mut self, reason: Error) {
        self.connection_lost(reason);
    }
}

/// Forwards every event loop callback onto an exchange channel.
#[derive(Debug)]
pub struct Adapter<H> {
    exchange: Option<ExchangeSender<Delivery<H>>>,
}

impl<H> Adapter<H> {
    pub fn new(exchange: ExchangeSender<Delivery<H>>) -> Self {
        Self {
            exchange: Some(exchange),
        }
    }

    /// False once the terminal event went through.
    pub fn is_open(&self) -> bool {
        self.exchange.is_some()
    }

    fn send(&self, delivery: Delivery<H>) {
        match &self.exchange {
            Some(exchange) => exchange.send(delivery),
            None => log::warn!("Event delivered after connection was lost, dropping it"),
        }
    }
}

impl<H: Send + 'static> Protocol<H> for Adapter<H> {
    fn connection_made(&mut self, transport: H) {
        log::debug!("Connection made");
        self.send(Delivery::Connected(transport));
    }

    fn data_received(&mut self, data: Bytes) {
        log::trace!("Received chunk len={}", data.len());
        self.send(Delivery::Data(data));
    }

    fn connection_lost(&mut self, reason: Error) {
        match self.exchange.take() {
            Some(exchange) => {
                log::debug!("Connection lost: {}", reason);
                exchange.send_error(reason);
            }
            None => log::warn!("Connection lost reported twice: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::exchange;
    use std::io;

    #[test]
    fn test_events_become_deliveries() {
        let (tx, mut rx) = exchange::channel::<Delivery<u32>>();
        let mut adapter = Adapter::new(tx);

        adapter.connection_made(42);
        adapter.data_received(Bytes::from_static(b"ab"));
        adapter.data_received(Bytes::from_static(b"c"));
        adapter.connection_lost(Error::ConnectionDone);
        assert!(!adapter.is_open());

        assert!(matches!(rx.wait().unwrap(), Delivery::Connected(42)));
        match rx.wait().unwrap() {
            Delivery::Data(chunk) => assert_eq!(&chunk[..], b"ab"),
            other => panic!("unexpected delivery: {other:?}"),
        }
        match rx.wait().unwrap() {
            Delivery::Data(chunk) => assert_eq!(&chunk[..], b"c"),
            other => panic!("unexpected delivery: {other:?}"),
        }
        assert!(rx.wait().unwrap_err().is_clean_close());
    }

    #[test]
    fn test_double_loss_is_ignored() {
        let (tx, mut rx) = exchange::channel::<Delivery<u32>>();
        let mut adapter = Adapter::new(tx);
        adapter.connection_lost(Error::ConnectionLost(io::Error::other("first")));
        adapter.connection_lost(Error::ConnectionDone);
        adapter.data_received(Bytes::from_static(b"late"));

        assert_eq!(rx.wait().unwrap_err().kind(), ErrorKind::ConnectionLost);
        assert_eq!(rx.wait().unwrap_err().kind(), ErrorKind::Disconnected);
    }

    #[test]
    fn test_connection_failed_defaults_to_lost() {
        let (tx, mut rx) = exchange::channel::<Delivery<u32>>();
        let mut adapter = Adapter::new(tx);
        adapter.connection_failed(Error::ConnectFailed(io::Error::other("refused")));
        assert_eq!(rx.wait().unwrap_err().kind(), ErrorKind::ConnectFailed);
    }
}
