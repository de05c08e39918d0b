//! Pairing bridges with connection establishment.
//!
//! [`ClientCreator`] connects and returns an initialized bridge to the
//! calling thread. [`SpawnFactory`] accepts connections and runs a handler on
//! a fresh thread per connection.

use std::io;
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

#[cfg(unix)]
use std::path::Path;

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::protocol::Adapter;
use crate::reactor::{Connector, Listening, Reactor, StreamHandle};
use crate::transport::PeerAddr;

/// Connects to a remote end and returns a connected bridge.
pub struct ClientCreator<'r> {
    reactor: &'r Reactor,
    config: BridgeConfig,
}

impl<'r> ClientCreator<'r> {
    pub fn new(reactor: &'r Reactor, config: BridgeConfig) -> Self {
        Self { reactor, config }
    }

    fn make<B: Bridge<Handle = StreamHandle>>(&self) -> (B, Adapter<StreamHandle>) {
        let mut bridge = B::with_config(self.config.clone());
        let adapter = bridge.build_adapter();
        (bridge, adapter)
    }

    pub fn connect_tcp<B>(&self, host: &str, port: u16) -> Result<B>
    where
        B: Bridge<Handle = StreamHandle>,
    {
        let (mut bridge, adapter) = self.make::<B>();
        self.reactor.connect_tcp(host, port, adapter);
        bridge.initialize()?;
        Ok(bridge)
    }

    #[cfg(unix)]
    pub fn connect_unix<B>(&self, path: impl AsRef<Path>) -> Result<B>
    where
        B: Bridge<Handle = StreamHandle>,
    {
        let (mut bridge, adapter) = self.make::<B>();
        self.reactor.connect_unix(path, adapter);
        bridge.initialize()?;
        Ok(bridge)
    }

    /// Connects through any [`Connector`], e.g. a TLS or service-discovery one.
    pub fn connect_with<B, C>(&self, connector: C) -> Result<B>
    where
        B: Bridge<Handle = StreamHandle>,
        C: Connector,
    {
        let (mut bridge, adapter) = self.make::<B>();
        self.reactor.connect_with(connector, adapter);
        bridge.initialize()?;
        Ok(bridge)
    }
}

/// Spawns a thread per incoming connection and hands it a connected bridge.
pub struct SpawnFactory<B, F> {
    handler: Arc<F>,
    config: BridgeConfig,
    _bridge: PhantomData<fn() -> B>,
}

impl<B, F> SpawnFactory<B, F>
where
    B: Bridge<Handle = StreamHandle> + Send + 'static,
    F: Fn(B) + Send + Sync + 'static,
{
    pub fn new(handler: F, config: BridgeConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            config,
            _bridge: PhantomData,
        }
    }

    /// Builds the adapter for one accepted peer and starts its thread.
    ///
    /// Runs on the reactor thread; initialization failures are logged, never
    /// returned.
    pub fn build_protocol(&self, peer: &PeerAddr) -> Adapter<StreamHandle> {
        let mut bridge = B::with_config(self.config.clone());
        let adapter = bridge.build_adapter();
        let handler = Arc::clone(&self.handler);
        let peer = peer.clone();
        let name = format!("xbridge-conn-{}", peer);

        let spawned = thread::Builder::new().name(name).spawn({
            let peer = peer.clone();
            move || match bridge.initialize() {
                Ok(()) => (*handler)(bridge),
                Err(e) => log::error!("{}: {}", peer, e),
            }
        });
        if let Err(e) = spawned {
            log::error!("{}: failed to spawn connection thread: {}", peer, e);
        }
        adapter
    }

    pub fn serve_tcp(self, reactor: &Reactor, addr: SocketAddr) -> io::Result<Listening> {
        reactor.listen_tcp(addr, move |peer| self.build_protocol(peer))
    }

    #[cfg(unix)]
    pub fn serve_unix(self, reactor: &Reactor, path: impl AsRef<Path>) -> io::Result<Listening> {
        reactor.listen_unix(path, move |peer| self.build_protocol(peer))
    }
}
