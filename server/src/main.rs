mod trans_server;

use log::{error, info};
use trans_server::{ServerTarget, TransServer};
use xbridge::{BridgeConfig, Reactor, ReactorConfig};

const LISTEN_ADDR: &str = "0.0.0.0:1234";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();

    let reactor = match Reactor::start(ReactorConfig::default()) {
        Ok(reactor) => reactor,
        Err(e) => {
            error!("Failed to start reactor: {}", e);
            std::process::exit(1);
        }
    };

    // method 1 unix
    // let target = ServerTarget::Unix("/tmp/xbridge.sock".into());

    // method 2 tcp
    let addr = match LISTEN_ADDR.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid listen address {}: {}", LISTEN_ADDR, e);
            std::process::exit(1);
        }
    };
    let server = TransServer::new(ServerTarget::Tcp(addr), BridgeConfig::default());

    match server.run(&reactor) {
        Ok(listening) => info!("Server listening on {}", listening.local_addr()),
        Err(e) => {
            error!("Failed to listen: {}", e);
            std::process::exit(1);
        }
    }

    // Connections are served from their own threads.
    loop {
        std::thread::park();
    }
}
