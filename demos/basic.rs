//! Minimal node: loads config, binds the bundled overlays, waits for Ctrl-C.
//!
//! ```text
//! cargo run --example basic -- peerwire.toml
//! ```

use peerwire::config::NetworkConfig;
use peerwire::protocol::gossip::{self, Gossip};
use peerwire::protocol::kademlia::Kademlia;
use peerwire::service::NodeBuilder;
use peerwire::PeerId;
use peerwire::utils::logging::init_logging;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match std::env::args().nth(1) {
        Some(path) => NetworkConfig::from_file(path),
        None => NetworkConfig::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging);

    if let Err(e) = config.validate_strict() {
        error!(error = %e, "Invalid configuration");
        return ExitCode::FAILURE;
    }

    let events = gossip::Events {
        on_gossip_received: Some(Arc::new(|sender: &PeerId, data: &[u8]| {
            info!(sender = %sender, len = data.len(), "Gossip received");
            Ok(())
        })),
    };

    // A registration error means the overlays disagree about the wire; never
    // start serving traffic in that state.
    let node = match NodeBuilder::new(config.clone())
        .bind(Kademlia::new())
        .bind(Gossip::new().with_events(events))
        .build()
    {
        Ok(node) => node,
        Err(e) => {
            error!(error = %e, shape = ?e.shape(), "Fatal registration error");
            return ExitCode::FAILURE;
        }
    };

    match node.codec().registry().shapes() {
        Ok(shapes) => {
            for (shape, opcode) in shapes {
                info!(shape, opcode = %format!("{opcode:#010x}"), "Registered shape");
            }
        }
        Err(e) => error!(error = %e, "Failed to read registry"),
    }

    info!(id = %node.id(), address = %config.node.bind_address, "Node ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
    }

    node.metrics().log_metrics();
    info!("Shutting down");
    ExitCode::SUCCESS
}
