//! # Node Container
//!
//! Owns the shared infrastructure (bus, trie database, chain, ledger) and the
//! running subsystems.
//!
//! ## Startup Order
//!
//! 1. Validate configuration and build the genesis block
//! 2. Create the bus, trie database, chain store and ledger
//! 3. Subscribe the event router (before anything can publish)
//! 4. Spawn the block processor, then the peer syncer, then the router

pub mod config;

pub use config::{
    load_config, load_config_with, read_config_file, ConfigError, LoggingConfig, NodeConfig,
    VerifierConfig, CONFIG_PATH_ENV, LOG_LEVEL_ENV, MIN_SYNC_PEERS_ENV,
};

use crate::adapters::{
    BusMessenger, ChainVerifier, InMemoryChain, InMemoryLedger, ProcessorBlockSink,
};
use crate::genesis::GenesisBuilder;
use crate::wiring::{inbound_filter, EventRouter};
use anyhow::{bail, Context, Result};
use pov_01_state_trie::InMemoryTrieDb;
use pov_02_block_processor::{BlockProcessor, BlockProcessorHandle, ProcessorDependencies};
use pov_03_peer_sync::{PeerSyncer, SyncDependencies};
use shared_bus::InMemoryEventBus;
use shared_types::{ChainReader, PovBlock, SyncState};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub type NodeVerifier = ChainVerifier<InMemoryChain, InMemoryLedger, InMemoryTrieDb>;
pub type NodeSyncer = PeerSyncer<InMemoryChain, BusMessenger, ProcessorBlockSink>;

/// Handles created by [`PovNode::start`].
struct Running {
    processor: BlockProcessorHandle,
    syncer: Arc<NodeSyncer>,
    tasks: Vec<JoinHandle<()>>,
}

/// One node: shared state plus the processor, syncer and router tasks.
pub struct PovNode {
    config: NodeConfig,
    bus: Arc<InMemoryEventBus>,
    tries: Arc<InMemoryTrieDb>,
    chain: Arc<InMemoryChain>,
    ledger: Arc<InMemoryLedger>,
    shutdown_tx: watch::Sender<bool>,
    running: Option<Running>,
}

impl PovNode {
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let genesis = GenesisBuilder::new(config.genesis.clone())
            .build()
            .context("Failed to build genesis block")?;
        info!(
            hash = %hex::encode(genesis.hash()),
            timestamp = genesis.header.timestamp,
            "Genesis block built"
        );

        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        let tries = Arc::new(InMemoryTrieDb::new());
        let chain = Arc::new(InMemoryChain::new(genesis, Arc::clone(&tries)));
        let ledger = Arc::new(InMemoryLedger::new(bus.clone()));
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            bus,
            tries,
            chain,
            ledger,
            shutdown_tx,
            running: None,
        })
    }

    /// Spawn the subsystems. Fails if the node is already running.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            bail!("Node already started");
        }

        let subscription = self.bus.subscribe(inbound_filter());

        let verifier: Arc<NodeVerifier> = Arc::new(ChainVerifier::new(
            Arc::clone(&self.chain),
            Arc::clone(&self.ledger),
            Arc::clone(&self.tries),
            self.config.verifier.clone(),
        ));
        let processor = BlockProcessor::new(ProcessorDependencies {
            chain: Arc::clone(&self.chain),
            verifier,
            config: self.config.processor.clone(),
        });
        let (processor_handle, processor_task) = processor.spawn(self.shutdown_tx.subscribe());

        let syncer: Arc<NodeSyncer> = Arc::new(PeerSyncer::new(SyncDependencies {
            chain: Arc::clone(&self.chain),
            messenger: Arc::new(BusMessenger::new(self.bus.clone())),
            sink: Arc::new(ProcessorBlockSink::new(processor_handle.clone())),
            config: self.config.sync.clone(),
        }));
        let (sync_handle, mut tasks) = Arc::clone(&syncer).spawn(self.shutdown_tx.subscribe());

        let router = EventRouter::new(Arc::new(processor_handle.clone()), sync_handle);
        tasks.push(router.spawn(subscription, self.shutdown_tx.subscribe()));
        tasks.push(processor_task);

        info!(
            height = self.chain.height(),
            min_sync_peers = self.config.sync.min_sync_peers,
            "Node started"
        );
        self.running = Some(Running {
            processor: processor_handle,
            syncer,
            tasks,
        });
        Ok(())
    }

    /// Signal every task to stop and wait for them.
    pub async fn shutdown(&mut self) {
        self.shutdown_tx.send_replace(true);
        if let Some(running) = self.running.take() {
            for task in running.tasks {
                if let Err(e) = task.await {
                    warn!("Task ended abnormally: {}", e);
                }
            }
        }
        info!("Node stopped");
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn chain(&self) -> &Arc<InMemoryChain> {
        &self.chain
    }

    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    pub fn genesis(&self) -> PovBlock {
        self.chain.genesis_block()
    }

    /// `None` until [`start`](Self::start).
    pub fn processor(&self) -> Option<&BlockProcessorHandle> {
        self.running.as_ref().map(|r| &r.processor)
    }

    pub fn syncer(&self) -> Option<&Arc<NodeSyncer>> {
        self.running.as_ref().map(|r| &r.syncer)
    }

    pub fn sync_state(&self) -> SyncState {
        self.syncer()
            .map(|syncer| syncer.state())
            .unwrap_or(SyncState::NotStarted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{account_transaction, BlockFactory};
    use pov_02_block_processor::BlockProcessorApi;
    use shared_bus::{BlockchainEvent, EventPublisher};
    use shared_types::BlockOrigin;
    use std::time::Duration;

    async fn wait_for_height(node: &PovNode, height: u64) {
        for _ in 0..200 {
            if node.chain().height() >= height {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "chain stuck at {} waiting for {}",
            node.chain().height(),
            height
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = NodeConfig::for_testing();
        config.bus_capacity = 0;
        assert!(PovNode::new(config).is_err());
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let mut node = PovNode::new(NodeConfig::for_testing()).unwrap();
        assert_eq!(node.sync_state(), SyncState::NotStarted);
        node.start().unwrap();
        assert!(node.start().is_err());
        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_mined_block_extends_chain() {
        let mut node = PovNode::new(NodeConfig::for_testing()).unwrap();
        node.start().unwrap();

        let block = BlockFactory::new().next_block(&node.genesis(), &[]).unwrap();
        node.processor()
            .unwrap()
            .submit_mined(block.clone())
            .await
            .unwrap();

        assert_eq!(node.chain().height(), 1);
        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_bus_block_waits_for_ledger_commit() {
        let mut node = PovNode::new(NodeConfig::for_testing()).unwrap();
        node.start().unwrap();

        let tx = account_transaction(3, 4, 1_000);
        let block = BlockFactory::new()
            .next_block(&node.genesis(), &[tx.clone()])
            .unwrap();
        node.bus()
            .publish(BlockchainEvent::BlockReceived {
                block,
                origin: BlockOrigin::RemoteBroadcast,
                peer_id: None,
            })
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(node.chain().height(), 0);

        node.ledger().commit_transaction(tx).await;
        wait_for_height(&node, 1).await;
        node.shutdown().await;
    }
}
