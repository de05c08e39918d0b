use log::*;
use std::net::SocketAddr;
#[cfg(unix)]
use std::path::PathBuf;
use std::time::Instant;
use xbridge::{BridgeConfig, BufferedTransport, Listening, Reactor, SpawnFactory};

/// Length prefix carried in front of every message.
const HEADER_LEN: usize = 8;

#[allow(dead_code)]
#[derive(Debug)]
pub enum ServerTarget {
    #[cfg(unix)]
    Unix(PathBuf),
    Tcp(SocketAddr),
}

pub struct TransServer {
    target: ServerTarget,
    config: BridgeConfig,
}

impl TransServer {
    pub fn new(target: ServerTarget, config: BridgeConfig) -> Self {
        Self { target, config }
    }

    pub fn run(&self, reactor: &Reactor) -> std::io::Result<Listening> {
        let factory = SpawnFactory::new(Self::handle_connection, self.config.clone());
        match &self.target {
            #[cfg(unix)]
            ServerTarget::Unix(path) => factory.serve_unix(reactor, path),
            ServerTarget::Tcp(addr) => factory.serve_tcp(reactor, *addr),
        }
    }

    /// Runs on its own thread for each accepted connection.
    fn handle_connection(conn: BufferedTransport) {
        let peer = conn
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        info!("[{}] New connection", peer);
        if let Err(e) = Self::handle_message(conn) {
            error!("[{}] Connection error: {}", peer, e);
        }
        info!("[{}] Connection handler finished", peer);
    }

    /// Echoes length-prefixed messages back until the client closes.
    fn handle_message(mut conn: BufferedTransport) -> xbridge::Result<()> {
        loop {
            let start = Instant::now();
            let header = conn.read(Some(HEADER_LEN))?;
            if header.len() < HEADER_LEN {
                if !header.is_empty() {
                    warn!("Dropping {} bytes of a partial header", header.len());
                }
                info!("Client closed the connection");
                return Ok(());
            }
            let mut len = [0u8; HEADER_LEN];
            len.copy_from_slice(&header);
            let expected = u64::from_be_bytes(len) as usize;

            let message = conn.read(Some(expected))?;
            let elapsed = start.elapsed();
            let speed = (message.len() as f64 / 1024.0) / elapsed.as_secs_f64();
            info!("=== Receive Complete ===");
            info!("Total received: {} KB", message.len() / 1024);
            info!("Time: {:.2} seconds", elapsed.as_secs_f64());
            info!("Speed: {:.2} KB/s", speed);
            if message.len() < expected {
                warn!("Message truncated: {} of {} bytes", message.len(), expected);
                return Ok(());
            }

            let start = Instant::now();
            conn.write(&header)?;
            conn.write(&message)?;
            let elapsed = start.elapsed();
            let speed = (message.len() as f64 / 1024.0) / elapsed.as_secs_f64();
            info!("=== Echo Complete ===");
            info!("Total sent: {} KB", message.len() / 1024);
            info!("Time: {:.2} seconds", elapsed.as_secs_f64());
            info!("Speed: {:.2} KB/s", speed);
        }
    }
}
