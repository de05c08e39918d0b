use log::*;
#[cfg(unix)]
use std::path::PathBuf;
use std::time::Instant;
use xbridge::{BridgeConfig, BufferedTransport, ClientCreator, Reactor};

/// Length prefix carried in front of every message.
const HEADER_LEN: usize = 8;

#[allow(dead_code)]
#[derive(Debug)]
pub enum ClientTarget {
    #[cfg(unix)]
    Unix(PathBuf),
    Tcp { host: String, port: u16 },
}

pub struct TransClient<'r> {
    target: ClientTarget,
    creator: ClientCreator<'r>,
}

impl<'r> TransClient<'r> {
    pub fn new(reactor: &'r Reactor, target: ClientTarget, config: BridgeConfig) -> Self {
        Self {
            target,
            creator: ClientCreator::new(reactor, config),
        }
    }

    fn connect(&self) -> xbridge::Result<BufferedTransport> {
        info!("Connecting to target: {:?}", self.target);
        let conn: BufferedTransport = match &self.target {
            #[cfg(unix)]
            ClientTarget::Unix(path) => self.creator.connect_unix(path)?,
            ClientTarget::Tcp { host, port } => self.creator.connect_tcp(host, *port)?,
        };
        info!("Connected to {}", conn.peer_addr()?);
        Ok(conn)
    }

    /// Sends one length-prefixed message and returns the echoed payload.
    pub fn send_message(&self, message: &[u8]) -> xbridge::Result<Vec<u8>> {
        let mut conn = self.connect()?;

        let start = Instant::now();
        conn.write(&(message.len() as u64).to_be_bytes())?;
        conn.write(message)?;
        let elapsed = start.elapsed();
        let speed = (message.len() as f64 / 1024.0) / elapsed.as_secs_f64();
        info!("=== Send Complete ===");
        info!("Total sent: {} KB", message.len() / 1024);
        info!("Time: {:.2} seconds", elapsed.as_secs_f64());
        info!("Speed: {:.2} KB/s", speed);

        let start = Instant::now();
        let header = conn.read(Some(HEADER_LEN))?;
        if header.len() < HEADER_LEN {
            warn!("Server closed before sending a reply header");
            return Ok(Vec::new());
        }
        let mut len = [0u8; HEADER_LEN];
        len.copy_from_slice(&header);
        let expected = u64::from_be_bytes(len) as usize;
        let reply = conn.read(Some(expected))?;
        if reply.len() < expected {
            warn!("Reply truncated: {} of {} bytes", reply.len(), expected);
        }
        let elapsed = start.elapsed();
        let speed = (reply.len() as f64 / 1024.0) / elapsed.as_secs_f64();
        info!("=== Receive Complete ===");
        info!("Total received: {} KB", reply.len() / 1024);
        info!("Time: {:.2} seconds", elapsed.as_secs_f64());
        info!("Speed: {:.2} KB/s", speed);

        conn.lose_connection()?;
        Ok(reply.to_vec())
    }
}
