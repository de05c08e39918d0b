//! Single-threaded event loop.
//!
//! The [`Reactor`] runs a tokio current-thread runtime on one dedicated OS
//! thread. Every socket is owned by a driver task on that thread, which
//! reports lifecycle and data through a [`Protocol`] and takes orders from
//! the consumer side through a [`StreamHandle`].
//!
//! ```text
//!  consumer thread                 reactor thread
//!  ───────────────                 ──────────────
//!  StreamHandle ── Command ──▶ driver task ──▶ socket
//!       ▲                           │
//!       └──── Protocol callbacks ◀──┘
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

#[cfg(unix)]
use std::path::{Path, PathBuf};

use bytes::{Buf, Bytes, BytesMut};
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::ReactorConfig;
use crate::error::{Error, Result};
use crate::protocol::Protocol;
use crate::transport::{PeerAddr, PushProducer, Transport};

/// Pause before retrying after a failed accept.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Reactor {
    handle: Handle,
    shutdown: CancellationToken,
    thread: Option<JoinHandle<()>>,
    config: ReactorConfig,
}

impl Reactor {
    pub fn start(config: ReactorConfig) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let thread = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                log::debug!("Reactor running");
                runtime.block_on(token.cancelled());
                log::debug!("Reactor stopped");
            })?;

        Ok(Self {
            handle,
            shutdown,
            thread: Some(thread),
            config,
        })
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    /// Stops the loop and joins its thread. Open connections are dropped.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Reactor thread panicked");
            }
        }
    }

    pub fn connect_tcp<P>(&self, host: &str, port: u16, protocol: P)
    where
        P: Protocol<StreamHandle>,
    {
        self.connect_with(TcpConnector::new(host, port), protocol);
    }

    #[cfg(unix)]
    pub fn connect_unix<P>(&self, path: impl AsRef<Path>, protocol: P)
    where
        P: Protocol<StreamHandle>,
    {
        self.connect_with(UnixConnector::new(path), protocol);
    }

    /// Establishes a connection with `connector`, then drives it with `protocol`.
    ///
    /// A failed attempt is reported through [`Protocol::connection_failed`].
    pub fn connect_with<C, P>(&self, connector: C, mut protocol: P)
    where
        C: Connector,
        P: Protocol<StreamHandle>,
    {
        let config = self.config.clone();
        self.handle.spawn(async move {
            match connector.connect().await {
                Ok(established) => drive(established, protocol, config).await,
                Err(e) => {
                    log::warn!("Connect failed: {}", e);
                    protocol.connection_failed(Error::ConnectFailed(e));
                }
            }
        });
    }

    /// Accepts TCP connections, building one protocol per peer with `factory`.
    pub fn listen_tcp<F, P>(&self, addr: SocketAddr, mut factory: F) -> io::Result<Listening>
    where
        F: FnMut(&PeerAddr) -> P + Send + 'static,
        P: Protocol<StreamHandle>,
    {
        let listener = std::net::TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local = listener.local_addr()?;
        log::info!("Listening on TCP {}", local);

        let config = self.config.clone();
        let token = self.shutdown.child_token();
        let stop = token.clone();
        self.handle.spawn(async move {
            let listener = match TcpListener::from_std(listener) {
                Ok(listener) => listener,
                Err(e) => {
                    log::error!("Failed to register listener {}: {}", local, e);
                    return;
                }
            };
            loop {
                let accepted = tokio::select! {
                    _ = stop.cancelled() => break,
                    accepted = listener.accept() => accepted,
                };
                match accepted {
                    Ok((stream, peer)) => {
                        log::debug!("Accepted TCP connection from {}", peer);
                        if let Err(e) = stream.set_nodelay(true) {
                            log::trace!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                        }
                        let peer = PeerAddr::Tcp(peer);
                        let protocol = factory(&peer);
                        let established = Established {
                            stream,
                            peer,
                            local: PeerAddr::Tcp(local),
                        };
                        tokio::spawn(drive(established, protocol, config.clone()));
                    }
                    Err(e) => {
                        log::warn!("Accept failed on {}: {}", local, e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
            log::info!("Stopped listening on TCP {}", local);
        });

        Ok(Listening {
            local: PeerAddr::Tcp(local),
            token,
        })
    }

    /// Accepts Unix-domain connections. A stale socket at `path` is removed
    /// first; any other kind of file there fails with `AddrInUse`.
    #[cfg(unix)]
    pub fn listen_unix<F, P>(&self, path: impl AsRef<Path>, mut factory: F) -> io::Result<Listening>
    where
        F: FnMut(&PeerAddr) -> P + Send + 'static,
        P: Protocol<StreamHandle>,
    {
        let path = path.as_ref().to_path_buf();
        remove_stale_socket(&path)?;
        let listener = std::os::unix::net::UnixListener::bind(&path)?;
        listener.set_nonblocking(true)?;
        log::info!("Listening on Unix socket {:?}", path);

        let config = self.config.clone();
        let token = self.shutdown.child_token();
        let stop = token.clone();
        let local = PeerAddr::Unix(Some(path.clone()));
        let local_for_task = local.clone();
        self.handle.spawn(async move {
            let listener = match tokio::net::UnixListener::from_std(listener) {
                Ok(listener) => listener,
                Err(e) => {
                    log::error!("Failed to register listener {:?}: {}", path, e);
                    return;
                }
            };
            loop {
                let accepted = tokio::select! {
                    _ = stop.cancelled() => break,
                    accepted = listener.accept() => accepted,
                };
                match accepted {
                    Ok((stream, addr)) => {
                        let peer = PeerAddr::Unix(addr.as_pathname().map(Path::to_path_buf));
                        log::debug!("Accepted Unix connection from {}", peer);
                        let protocol = factory(&peer);
                        let established = Established {
                            stream,
                            peer,
                            local: local_for_task.clone(),
                        };
                        tokio::spawn(drive(established, protocol, config.clone()));
                    }
                    Err(e) => {
                        log::warn!("Accept failed on {:?}: {}", path, e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
            log::info!("Stopped listening on Unix socket {:?}", path);
        });

        Ok(Listening { local, token })
    }
}

#[cfg(unix)]
fn remove_stale_socket(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::FileTypeExt;

    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if !metadata.file_type().is_socket() {
        return Err(io::Error::new(
            io::ErrorKind::AddrInUse,
            format!("{} exists and is not a socket", path.display()),
        ));
    }
    log::debug!("Removing stale socket {:?}", path);
    std::fs::remove_file(path)
}

impl Drop for Reactor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A running accept loop.
#[derive(Debug)]
pub struct Listening {
    local: PeerAddr,
    token: CancellationToken,
}

impl Listening {
    pub fn local_addr(&self) -> &PeerAddr {
        &self.local
    }

    /// Stops accepting. Connections already accepted keep running.
    pub fn stop(&self) {
        self.token.cancel();
    }
}

/// A connected stream together with both of its addresses.
pub struct Established<S> {
    pub stream: S,
    pub peer: PeerAddr,
    pub local: PeerAddr,
}

/// Outbound connection establishment.
///
/// TCP and Unix-domain connectors ship with the crate; TLS or
/// service-discovery connectors plug in by implementing this trait.
pub trait Connector: Send + 'static {
    type Stream: AsyncRead + AsyncWrite + Send + 'static;

    fn connect(self) -> BoxFuture<'static, io::Result<Established<Self::Stream>>>;
}

#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
}

impl TcpConnector {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(self) -> BoxFuture<'static, io::Result<Established<TcpStream>>> {
        async move {
            let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
            stream.set_nodelay(true)?;
            let peer = PeerAddr::Tcp(stream.peer_addr()?);
            let local = PeerAddr::Tcp(stream.local_addr()?);
            log::debug!("TCP connected to {}", peer);
            Ok(Established {
                stream,
                peer,
                local,
            })
        }
        .boxed()
    }
}

#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct UnixConnector {
    path: PathBuf,
}

#[cfg(unix)]
impl UnixConnector {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[cfg(unix)]
impl Connector for UnixConnector {
    type Stream = tokio::net::UnixStream;

    fn connect(self) -> BoxFuture<'static, io::Result<Established<Self::Stream>>> {
        async move {
            let stream = tokio::net::UnixStream::connect(&self.path).await?;
            let local = PeerAddr::Unix(stream.local_addr()?.as_pathname().map(Path::to_path_buf));
            log::debug!("Unix socket connected to {:?}", self.path);
            Ok(Established {
                stream,
                peer: PeerAddr::Unix(Some(self.path)),
                local,
            })
        }
        .boxed()
    }
}

#[derive(Debug)]
enum Command {
    Write(Bytes),
    Pause,
    Resume,
    LoseConnection,
}

/// Outbound queue accounting shared by a handle and its driver.
///
/// Both sides update it under one lock so a pause can never land after the
/// resume that should have cancelled it.
struct Outbound {
    state: Mutex<OutboundState>,
}

struct OutboundState {
    queued: usize,
    high_water: usize,
    producer: Option<Box<dyn PushProducer>>,
    producer_paused: bool,
    stopped: bool,
}

impl Outbound {
    fn new(high_water: usize) -> Self {
        Self {
            state: Mutex::new(OutboundState {
                queued: 0,
                high_water,
                producer: None,
                producer_paused: false,
                stopped: false,
            }),
        }
    }

    /// Accounts for `len` bytes and hands them to the driver with `send`.
    fn queue(&self, len: usize, send: impl FnOnce() -> Result<()>) -> Result<()> {
        let mut state = self.state.lock();
        send()?;
        state.queued += len;
        if state.queued > state.high_water && !state.producer_paused {
            if let Some(producer) = &state.producer {
                log::trace!("Outbound queue at {} bytes, pausing producer", state.queued);
                producer.pause_producing();
                state.producer_paused = true;
            }
        }
        Ok(())
    }

    fn drained(&self, len: usize) {
        let mut state = self.state.lock();
        state.queued = state.queued.saturating_sub(len);
        if state.queued == 0 && state.producer_paused {
            state.producer_paused = false;
            if let Some(producer) = &state.producer {
                log::trace!("Outbound queue drained, resuming producer");
                producer.resume_producing();
            }
        }
    }

    fn register(&self, producer: Box<dyn PushProducer>) {
        let mut state = self.state.lock();
        if state.stopped {
            producer.stop_producing();
            return;
        }
        if let Some(previous) = state.producer.replace(producer) {
            previous.stop_producing();
        }
        state.producer_paused = false;
    }

    fn set_high_water(&self, size: usize) {
        self.state.lock().high_water = size;
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.stopped = true;
        if let Some(producer) = state.producer.take() {
            producer.stop_producing();
        }
    }
}

/// Handle to a connection driven by the reactor.
///
/// Every operation posts to the driver task and returns immediately.
#[derive(Clone)]
pub struct StreamHandle {
    commands: mpsc::UnboundedSender<Command>,
    outbound: Arc<Outbound>,
    peer: PeerAddr,
    local: PeerAddr,
}

impl StreamHandle {
    fn command(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("peer", &self.peer)
            .field("local", &self.local)
            .finish()
    }
}

impl Transport for StreamHandle {
    fn write(&self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let data = Bytes::copy_from_slice(data);
        self.outbound
            .queue(data.len(), || self.command(Command::Write(data)))
    }

    fn pause_producing(&self) {
        if self.command(Command::Pause).is_err() {
            log::trace!("Pause on closed transport");
        }
    }

    fn resume_producing(&self) {
        if self.command(Command::Resume).is_err() {
            log::trace!("Resume on closed transport");
        }
    }

    fn register_producer(&self, producer: Box<dyn PushProducer>, _streaming: bool) -> Result<()> {
        self.outbound.register(producer);
        Ok(())
    }

    fn set_buffer_size(&self, size: usize) -> Result<()> {
        self.outbound.set_high_water(size);
        Ok(())
    }

    fn peer_addr(&self) -> Result<PeerAddr> {
        Ok(self.peer.clone())
    }

    fn local_addr(&self) -> Result<PeerAddr> {
        Ok(self.local.clone())
    }

    fn lose_connection(&self) -> Result<()> {
        self.command(Command::LoseConnection)
    }
}

/// Driver-side ends of a connection.
///
/// Dropping it refuses further commands and stops the registered producer,
/// including when the reactor shuts down with the driver mid-flight.
struct Link {
    commands: mpsc::UnboundedReceiver<Command>,
    outbound: Arc<Outbound>,
}

impl Drop for Link {
    fn drop(&mut self) {
        self.commands.close();
        self.outbound.stop();
    }
}

enum Step {
    Command(Option<Command>),
    Read(io::Result<usize>),
    Wrote(io::Result<usize>),
    Idle,
}

/// Owns one connection on the reactor thread until it ends.
async fn drive<S, P>(established: Established<S>, mut protocol: P, config: ReactorConfig)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    P: Protocol<StreamHandle>,
{
    let Established { stream, peer, local } = established;
    let (commands_tx, commands) = mpsc::unbounded_channel();
    let outbound = Arc::new(Outbound::new(config.default_buffer_size));
    let mut link = Link {
        commands,
        outbound: Arc::clone(&outbound),
    };
    protocol.connection_made(StreamHandle {
        commands: commands_tx,
        outbound: Arc::clone(&outbound),
        peer: peer.clone(),
        local,
    });

    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut inbound = BytesMut::with_capacity(config.read_chunk_size);
    let mut pending = BytesMut::new();
    let mut paused = false;
    let mut closing = false;
    let mut handles_alive = true;

    let reason = loop {
        if closing && pending.is_empty() {
            break Error::ConnectionDone;
        }
        let step = tokio::select! {
            command = link.commands.recv(), if handles_alive => Step::Command(command),
            read = reader.read_buf(&mut inbound), if !paused && !closing => Step::Read(read),
            wrote = writer.write(&pending), if !pending.is_empty() => Step::Wrote(wrote),
            else => Step::Idle,
        };
        match step {
            Step::Command(Some(Command::Write(data))) => pending.extend_from_slice(&data),
            Step::Command(Some(Command::Pause)) => paused = true,
            Step::Command(Some(Command::Resume)) => paused = false,
            Step::Command(Some(Command::LoseConnection)) => closing = true,
            Step::Command(None) => {
                log::debug!("All handles to {} dropped, closing", peer);
                handles_alive = false;
                closing = true;
            }
            Step::Read(Ok(0)) => break Error::ConnectionDone,
            Step::Read(Ok(n)) => {
                log::trace!("Read {} bytes from {}", n, peer);
                let chunk = inbound.split().freeze();
                inbound.reserve(config.read_chunk_size);
                protocol.data_received(chunk);
            }
            Step::Read(Err(e)) => break Error::ConnectionLost(e),
            Step::Wrote(Ok(0)) => break Error::ConnectionLost(io::ErrorKind::WriteZero.into()),
            Step::Wrote(Ok(n)) => {
                pending.advance(n);
                outbound.drained(n);
            }
            Step::Wrote(Err(e)) => break Error::ConnectionLost(e),
            Step::Idle => break Error::ConnectionDone,
        }
    };
    link.commands.close();

    if reason.is_clean_close() && !pending.is_empty() {
        if let Err(e) = writer.write_all(&pending).await {
            log::debug!("Dropping {} unsent bytes to {}: {}", pending.len(), peer, e);
        }
    }
    if let Err(e) = writer.shutdown().await {
        log::trace!("Shutdown of {} failed: {}", peer, e);
    }
    outbound.stop();
    log::debug!("Connection to {} ended: {}", peer, reason);
    protocol.connection_lost(reason);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{GateProducer, WriteGate};
    use crate::protocol::{Adapter, Delivery};
    use crate::{exchange, error::ErrorKind};
    use std::io::{Read, Write};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_outbound_pauses_over_high_water() {
        let gate = Arc::new(WriteGate::new());
        let outbound = Outbound::new(4);
        outbound.register(Box::new(GateProducer::new(Arc::clone(&gate))));

        outbound.queue(3, || Ok(())).unwrap();
        assert!(gate.is_ready());
        outbound.queue(3, || Ok(())).unwrap();
        assert!(!gate.is_ready());

        outbound.drained(2);
        assert!(!gate.is_ready());
        outbound.drained(4);
        assert!(gate.is_ready());
    }

    #[test]
    fn test_outbound_failed_send_is_not_counted() {
        let gate = Arc::new(WriteGate::new());
        let outbound = Outbound::new(1);
        outbound.register(Box::new(GateProducer::new(Arc::clone(&gate))));
        let err = outbound.queue(10, || Err(Error::Closed)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        assert!(gate.is_ready());
    }

    #[test]
    fn test_outbound_stop_releases_producer() {
        let gate = Arc::new(WriteGate::new());
        let outbound = Outbound::new(0);
        outbound.register(Box::new(GateProducer::new(Arc::clone(&gate))));
        outbound.queue(1, || Ok(())).unwrap();
        assert!(!gate.is_ready());
        outbound.stop();
        assert!(gate.is_ready());

        let late = Arc::new(WriteGate::new());
        late.clear();
        outbound.register(Box::new(GateProducer::new(Arc::clone(&late))));
        assert!(late.is_ready());
    }

    #[test]
    fn test_tcp_round_trip_through_driver() {
        init_logger();
        let reactor = Reactor::start(ReactorConfig::default()).unwrap();
        let peer = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = peer.local_addr().unwrap().port();

        let (tx, mut rx) = exchange::channel::<Delivery<StreamHandle>>();
        reactor.connect_tcp("127.0.0.1", port, Adapter::new(tx));

        let (mut server, _) = peer.accept().unwrap();
        let handle = match rx.wait().unwrap() {
            Delivery::Connected(handle) => handle,
            other => panic!("unexpected delivery: {other:?}"),
        };
        assert_eq!(handle.peer_addr().unwrap(), PeerAddr::Tcp(server.local_addr().unwrap()));

        handle.write(b"ping").unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        server.write_all(b"pong").unwrap();
        drop(server);

        let mut received = Vec::new();
        loop {
            match rx.wait() {
                Ok(Delivery::Data(chunk)) => received.extend_from_slice(&chunk),
                Ok(Delivery::Connected(_)) => panic!("second handle"),
                Err(e) => {
                    assert!(e.is_clean_close(), "unexpected error: {e}");
                    break;
                }
            }
        }
        assert_eq!(received, b"pong");
        assert!(handle.write(b"late").is_err());
        reactor.shutdown();
    }

    #[test]
    fn test_connect_failure_reported() {
        init_logger();
        let reactor = Reactor::start(ReactorConfig::default()).unwrap();
        let port = {
            let spare = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            spare.local_addr().unwrap().port()
        };
        let (tx, mut rx) = exchange::channel::<Delivery<StreamHandle>>();
        reactor.connect_tcp("127.0.0.1", port, Adapter::new(tx));
        assert_eq!(rx.wait().unwrap_err().kind(), ErrorKind::ConnectFailed);
    }

    #[test]
    fn test_paused_driver_stops_reading() {
        init_logger();
        let reactor = Reactor::start(ReactorConfig::default()).unwrap();
        let peer = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = peer.local_addr().unwrap().port();

        let (tx, mut rx) = exchange::channel::<Delivery<StreamHandle>>();
        reactor.connect_tcp("127.0.0.1", port, Adapter::new(tx));
        let (mut server, _) = peer.accept().unwrap();
        let handle = match rx.wait().unwrap() {
            Delivery::Connected(handle) => handle,
            other => panic!("unexpected delivery: {other:?}"),
        };

        handle.pause_producing();
        // Round trip through the driver so the pause is applied before data is sent.
        handle.write(b"x").unwrap();
        let mut one = [0u8; 1];
        server.read_exact(&mut one).unwrap();

        server.write_all(b"held").unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert!(rx.try_wait().is_none());

        handle.resume_producing();
        match rx.wait().unwrap() {
            Delivery::Data(chunk) => assert_eq!(&chunk[..], b"held"),
            other => panic!("unexpected delivery: {other:?}"),
        }
    }

    #[cfg(unix)]
    fn unused_adapter(_peer: &PeerAddr) -> Adapter<StreamHandle> {
        let (tx, _rx) = exchange::channel::<Delivery<StreamHandle>>();
        Adapter::new(tx)
    }

    #[cfg(unix)]
    #[test]
    fn test_listen_unix_refuses_regular_file() {
        init_logger();
        let path = std::env::temp_dir().join(format!("xbridge-regular-{}.txt", std::process::id()));
        std::fs::write(&path, b"important data").unwrap();
        let reactor = Reactor::start(ReactorConfig::default()).unwrap();

        let err = reactor.listen_unix(&path, unused_adapter).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
        assert_eq!(std::fs::read(&path).unwrap(), b"important data");
        std::fs::remove_file(&path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_listen_unix_replaces_stale_socket() {
        init_logger();
        let path = std::env::temp_dir().join(format!("xbridge-stale-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&path);
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        let reactor = Reactor::start(ReactorConfig::default()).unwrap();
        let listening = reactor.listen_unix(&path, unused_adapter).unwrap();
        assert_eq!(listening.local_addr(), &PeerAddr::Unix(Some(path.clone())));
        std::os::unix::net::UnixStream::connect(&path).unwrap();

        listening.stop();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_listener_stop() {
        init_logger();
        let reactor = Reactor::start(ReactorConfig::default()).unwrap();
        let listening = reactor
            .listen_tcp("127.0.0.1:0".parse().unwrap(), |_peer: &PeerAddr| {
                let (tx, _rx) = exchange::channel::<Delivery<StreamHandle>>();
                Adapter::new(tx)
            })
            .unwrap();
        assert!(matches!(listening.local_addr(), PeerAddr::Tcp(addr) if addr.port() != 0));
        listening.stop();
    }
}
