//! # PoV-Chain Node
//!
//! Entry point for the consensus core.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, `POV_CONFIG` file, environment)
//! 2. Install the tracing subscriber
//! 3. Build genesis and the shared chain state
//! 4. Start the block processor, the peer syncer and the event router
//! 5. Run until Ctrl+C, then shut down gracefully

use anyhow::{Context, Result};
use node_runtime::container::load_config;
use node_runtime::logging::init_logging;
use node_runtime::PovNode;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    info!("===========================================");
    info!("  PoV-Chain Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let mut node = PovNode::new(config)?;
    node.start()?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    node.shutdown().await;
    Ok(())
}
