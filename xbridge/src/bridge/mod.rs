//! Blocking bridges over an event-loop-driven connection.
//!
//! [`TransportBase`] owns the exchange channel and the connection handle and
//! carries everything both variants share: the initial handshake, flow
//! control, gated writes and capability delegation.
//!
//! - [`UnbufferedTransport`]: every `recv` returns one upstream chunk
//! - [`BufferedTransport`]: byte accumulator with size-bounded reads

mod buffered;
mod unbuffered;

pub use buffered::BufferedTransport;
pub use unbuffered::UnbufferedTransport;

use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::config::BridgeConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::exchange::{self, ExchangeReceiver};
use crate::flow::{FlowControl, GateProducer, WriteGate};
use crate::protocol::{Adapter, Delivery};
use crate::transport::{PeerAddr, PushProducer, Transport};

/// Common surface the bootstrap needs from a bridge variant.
pub trait Bridge: Sized {
    type Handle: Transport;

    fn with_config(config: BridgeConfig) -> Self;

    fn base(&self) -> &TransportBase<Self::Handle>;

    fn base_mut(&mut self) -> &mut TransportBase<Self::Handle>;

    /// Creates the adapter to hand to the event loop.
    fn build_adapter(&mut self) -> Adapter<Self::Handle> {
        self.base_mut().build_adapter()
    }

    /// Blocks until the connection handle arrives.
    fn initialize(&mut self) -> Result<()> {
        self.base_mut().initialize()
    }
}

pub struct TransportBase<H> {
    config: BridgeConfig,
    bridge: &'static str,
    exchange: Option<ExchangeReceiver<Delivery<H>>>,
    exhausted: bool,
    transport: Option<H>,
    flow: FlowControl,
    write_gate: Option<Arc<WriteGate>>,
}

impl<H: Transport> TransportBase<H> {
    /// `bridge` is the name reported when a capability is missing.
    pub fn new(config: BridgeConfig, bridge: &'static str) -> Self {
        Self {
            config,
            bridge,
            exchange: None,
            exhausted: false,
            transport: None,
            flow: FlowControl::new(),
            write_gate: None,
        }
    }

    pub fn build_adapter(&mut self) -> Adapter<H> {
        let (sender, receiver) = exchange::channel();
        self.exchange = Some(receiver);
        self.exhausted = false;
        Adapter::new(sender)
    }

    pub fn initialize(&mut self) -> Result<()> {
        let exchange = self.exchange.as_mut().ok_or(Error::NotConnected)?;
        let transport = match exchange.wait() {
            Ok(Delivery::Connected(transport)) => transport,
            Ok(Delivery::Data(_)) => {
                self.exhaust();
                return Err(Error::Protocol("first delivery was data, not a connection handle"));
            }
            Err(error) => {
                self.exhaust();
                return Err(error);
            }
        };

        if let Some(size) = self.config.buffer_size {
            if let Err(e) = transport.set_buffer_size(size) {
                log::warn!("Buffer size hint {} not applied: {}", size, self.widen(e));
            }
        }
        self.flow.engage(&transport);

        let gate = Arc::clone(self.write_gate.get_or_insert_with(|| Arc::new(WriteGate::new())));
        transport.register_producer(Box::new(GateProducer::new(gate)), true)?;

        log::debug!("{} initialized", self.bridge);
        self.transport = Some(transport);
        Ok(())
    }

    /// The connection handle, or [`Error::NotConnected`] before `initialize`.
    pub fn transport(&self) -> Result<&H> {
        self.transport.as_ref().ok_or(Error::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// True once the terminal event has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn pause_depth(&self) -> isize {
        self.flow.depth()
    }

    /// Writes immediately, then waits until the outbound path is ready again.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        self.transport()?.write(data)?;
        if let Some(gate) = &self.write_gate {
            gate.wait();
        }
        Ok(())
    }

    pub fn pause_producing(&mut self) -> Result<()> {
        let transport = self.transport.as_ref().ok_or(Error::NotConnected)?;
        self.flow.pause(transport);
        Ok(())
    }

    pub fn resume_producing(&mut self) -> Result<()> {
        let transport = self.transport.as_ref().ok_or(Error::NotConnected)?;
        self.flow.resume(transport);
        Ok(())
    }

    pub fn register_producer(&self, producer: Box<dyn PushProducer>, streaming: bool) -> Result<()> {
        self.delegate(|t| t.register_producer(producer, streaming))
    }

    pub fn set_buffer_size(&self, size: usize) -> Result<()> {
        self.delegate(|t| t.set_buffer_size(size))
    }

    pub fn peer_addr(&self) -> Result<PeerAddr> {
        self.delegate(|t| t.peer_addr())
    }

    pub fn local_addr(&self) -> Result<PeerAddr> {
        self.delegate(|t| t.local_addr())
    }

    pub fn lose_connection(&self) -> Result<()> {
        self.delegate(|t| t.lose_connection())
    }

    fn delegate<T>(&self, call: impl FnOnce(&H) -> Result<T>) -> Result<T> {
        call(self.transport()?).map_err(|e| self.widen(e))
    }

    // Handles report missing capabilities without knowing which bridge wraps them.
    fn widen(&self, error: Error) -> Error {
        match error {
            Error::Unsupported {
                handle, capability, ..
            } => Error::Unsupported {
                bridge: self.bridge,
                handle,
                capability,
            },
            other => other,
        }
    }

    pub(crate) fn exhaust(&mut self) {
        self.exhausted = true;
        self.exchange = None;
    }

    /// One resume/wait/pause cycle around a single data delivery.
    pub(crate) fn wait_chunk(&mut self) -> Result<Bytes> {
        let transport = self.transport.as_ref().ok_or(Error::NotConnected)?;
        let exchange = self.exchange.as_mut().ok_or(Error::NotConnected)?;
        let _resumed = self.flow.resumed(transport);
        next_data(exchange)
    }

    /// Appends deliveries to `buffer` while `more` holds, keeping the
    /// transport resumed for the whole span.
    pub(crate) fn fill_while(
        &mut self,
        buffer: &mut BytesMut,
        mut more: impl FnMut(&BytesMut) -> bool,
    ) -> Result<()> {
        if !more(buffer) {
            return Ok(());
        }
        let transport = self.transport.as_ref().ok_or(Error::NotConnected)?;
        let exchange = self.exchange.as_mut().ok_or(Error::NotConnected)?;
        let _resumed = self.flow.resumed(transport);
        while more(buffer) {
            let chunk = next_data(exchange)?;
            buffer.extend_from_slice(&chunk);
        }
        Ok(())
    }
}

fn next_data<H>(exchange: &mut ExchangeReceiver<Delivery<H>>) -> Result<Bytes> {
    loop {
        match exchange.wait()? {
            Delivery::Data(chunk) if !chunk.is_empty() => return Ok(chunk),
            Delivery::Data(_) => continue,
            Delivery::Connected(_) => log::warn!("Ignoring repeated connection handle"),
        }
    }
}

/// Outcome of a read that hit a terminal item, as seen by a variant.
pub(crate) enum Terminal {
    /// Clean closure.
    Done,
    /// Abnormal closure carrying its reason.
    Failed(Error),
}

impl Terminal {
    /// Splits a pull result into "keep going" and the terminal cases. Errors
    /// that are not terminal, like reading before `initialize`, pass through.
    pub(crate) fn classify(outcome: Result<()>) -> Result<Option<Terminal>> {
        match outcome {
            Ok(()) => Ok(None),
            Err(error) if error.kind() == ErrorKind::NotConnected => Err(error),
            Err(Error::ConnectionDone) => Ok(Some(Terminal::Done)),
            Err(error) => Ok(Some(Terminal::Failed(error))),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::protocol::Protocol;
    use std::io;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_initialize_pauses_and_registers_gate() {
        let (bridge, mock) =
            connected::<UnbufferedTransport<MockTransport>>(BridgeConfig::new().with_buffer_size(512), &[], Error::ConnectionDone);
        let base = bridge.base();
        assert!(base.is_connected());
        assert_eq!(base.pause_depth(), 1);
        assert_eq!(mock.calls(), ["pause"]);
        let state = mock.state.lock();
        assert_eq!(state.buffer_size, Some(512));
        assert!(state.producer.is_some());
    }

    #[test]
    fn test_initialize_tolerates_fixed_buffer_size() {
        let mock = MockTransport::default();
        mock.state.lock().fixed_buffer = true;
        let mut bridge = BufferedTransport::<MockTransport>::with_config(BridgeConfig::new().with_buffer_size(512));
        let mut adapter = bridge.build_adapter();
        adapter.connection_made(mock.clone());
        adapter.data_received(Bytes::from_static(b"ok"));
        adapter.connection_lost(Error::ConnectionDone);

        bridge.initialize().unwrap();
        assert!(bridge.base().is_connected());
        assert_eq!(bridge.base().pause_depth(), 1);
        assert_eq!(mock.state.lock().buffer_size, None);
        assert!(mock.state.lock().producer.is_some());
        assert_eq!(&bridge.read(None).unwrap()[..], b"ok");
        assert_eq!(
            bridge.base().set_buffer_size(64).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_not_connected_is_distinct_from_unsupported() {
        let base = TransportBase::<MockTransport>::new(BridgeConfig::new(), "Bridge");
        assert_eq!(base.peer_addr().unwrap_err().kind(), ErrorKind::NotConnected);
        assert_eq!(base.write(b"x").unwrap_err().kind(), ErrorKind::NotConnected);

        let (bridge, _mock) =
            connected::<UnbufferedTransport<MockTransport>>(BridgeConfig::new(), &[], Error::ConnectionDone);
        assert_eq!(
            bridge.base().peer_addr().unwrap(),
            PeerAddr::Other("mock-peer".to_string())
        );
        match bridge.base().local_addr().unwrap_err() {
            Error::Unsupported {
                bridge, capability, ..
            } => {
                assert!(bridge.contains("UnbufferedTransport"));
                assert_eq!(capability, "local_addr");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_initialize_surfaces_connect_failure() {
        let mut bridge = BufferedTransport::<MockTransport>::with_config(BridgeConfig::new());
        let mut adapter = bridge.build_adapter();
        adapter.connection_failed(Error::ConnectFailed(io::Error::other("refused")));

        let err = bridge.initialize().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectFailed);
        assert!(std::error::Error::source(&err).is_some());
        assert!(bridge.base().is_exhausted());
        assert!(bridge.read(None).unwrap().is_empty());
    }

    #[test]
    fn test_initialize_without_adapter() {
        let mut bridge = UnbufferedTransport::<MockTransport>::with_config(BridgeConfig::new());
        assert_eq!(bridge.initialize().unwrap_err().kind(), ErrorKind::NotConnected);
    }

    #[test]
    fn test_write_waits_for_gate() {
        let (bridge, mock) =
            connected::<UnbufferedTransport<MockTransport>>(BridgeConfig::new(), &[], Error::ConnectionDone);

        bridge.base().write(b"first").unwrap();
        let producer = mock.state.lock().producer.take().unwrap();
        producer.pause_producing();

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.resume_producing();
        });
        bridge.base().write(b"second").unwrap();
        releaser.join().unwrap();
        assert_eq!(mock.written(), b"firstsecond");
    }

    #[test]
    fn test_resume_pause_pass_through_nests() {
        let (mut bridge, mock) =
            connected::<BufferedTransport<MockTransport>>(BridgeConfig::new(), &[], Error::ConnectionDone);
        let base = bridge.base_mut();
        base.pause_producing().unwrap();
        assert_eq!(base.pause_depth(), 2);
        base.resume_producing().unwrap();
        base.resume_producing().unwrap();
        assert_eq!(base.pause_depth(), 0);
        assert_eq!(mock.calls(), ["pause", "resume"]);
    }
}
