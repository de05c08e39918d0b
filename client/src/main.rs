mod trans_client;

use log::{error, info};
use trans_client::{ClientTarget, TransClient};
use xbridge::{BridgeConfig, Reactor, ReactorConfig};

const DATA_SIZE: usize = 10 * 1024 * 1024; // 10 MB
const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
const DEFAULT_SERVER_PORT: u16 = 1234;
const TRANSPORT_BUFFER_SIZE: usize = 256 * 1024;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let reactor = match Reactor::start(ReactorConfig::default()) {
        Ok(reactor) => reactor,
        Err(e) => {
            error!("Failed to start reactor: {}", e);
            std::process::exit(1);
        }
    };

    // method 1  unix
    // let target = ClientTarget::Unix("/tmp/xbridge.sock".into());

    // method 2  tcp
    let target = ClientTarget::Tcp {
        host: DEFAULT_SERVER_HOST.to_string(),
        port: DEFAULT_SERVER_PORT,
    };

    let client = TransClient::new(
        &reactor,
        target,
        BridgeConfig::default().with_buffer_size(TRANSPORT_BUFFER_SIZE),
    );

    info!("Sending {} MB of data...", DATA_SIZE / 1024 / 1024);
    let data = vec![0xAB; DATA_SIZE];
    match client.send_message(&data) {
        Ok(reply) if reply == data => info!("Echo of {} bytes verified", reply.len()),
        Ok(reply) => {
            error!("Echo mismatch: sent {} bytes, got {} back", data.len(), reply.len());
            std::process::exit(1);
        }
        Err(e) => {
            error!("Exchange failed: {}", e);
            std::process::exit(1);
        }
    }

    reactor.shutdown();
}
