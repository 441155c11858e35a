//! # Test Fixtures
//!
//! Builders for valid chains and an in-memory stand-in for the peer
//! transport, shared by the unit tests and the `pov-tests` suite.

use pov_01_state_trie::{InMemoryTrieDb, StateApplier, StateError};
use shared_bus::{BlockchainEvent, EventFilter, EventPublisher, EventTopic, InMemoryEventBus};
use shared_types::{
    merkle_root, Hash, PeerId, PovBlock, PovHeader, StateBlock, U256, CHAIN_TOKEN, ZERO_ADDRESS,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

/// Builds blocks that pass `ChainVerifier`: linked headers, correct merkle
/// and state roots, and the easiest proof-of-work target.
///
/// The factory keeps its own trie database, so blocks can be built ahead of
/// the node that will verify them.
pub struct BlockFactory {
    applier: StateApplier<InMemoryTrieDb>,
}

impl BlockFactory {
    pub fn new() -> Self {
        Self {
            applier: StateApplier::new(Arc::new(InMemoryTrieDb::new())),
        }
    }

    pub fn next_block(&self, parent: &PovBlock, txs: &[StateBlock]) -> Result<PovBlock, StateError> {
        self.next_block_with_nonce(parent, txs, 0)
    }

    /// Same as [`next_block`](Self::next_block); distinct nonces give
    /// distinct sibling blocks.
    pub fn next_block_with_nonce(
        &self,
        parent: &PovBlock,
        txs: &[StateBlock],
        nonce: u64,
    ) -> Result<PovBlock, StateError> {
        let trie = self.applier.apply_transactions(&parent.state_hash(), txs)?;
        let state_hash = self.applier.commit(&trie)?;
        let tx_hashes: Vec<Hash> = txs.iter().map(StateBlock::hash).collect();

        let header = PovHeader {
            version: parent.header.version,
            previous: parent.hash(),
            height: parent.height() + 1,
            timestamp: parent.header.timestamp + 1,
            merkle_root: merkle_root(&tx_hashes),
            state_hash,
            target: U256::MAX,
            nonce,
            coinbase: ZERO_ADDRESS,
        };
        Ok(PovBlock::new(header, tx_hashes))
    }

    /// `count` empty blocks on top of `parent`, lowest first.
    pub fn chain_from(&self, parent: &PovBlock, count: usize) -> Result<Vec<PovBlock>, StateError> {
        let mut blocks: Vec<PovBlock> = Vec::with_capacity(count);
        for _ in 0..count {
            let tip = blocks.last().unwrap_or(parent);
            let block = self.next_block(tip, &[])?;
            blocks.push(block);
        }
        Ok(blocks)
    }
}

impl Default for BlockFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Chain-token state block for account `[account; 20]` delegating to
/// `[representative; 20]`.
pub fn account_transaction(account: u8, representative: u8, balance: u64) -> StateBlock {
    StateBlock {
        token: CHAIN_TOKEN,
        address: [account; 20],
        representative: [representative; 20],
        balance: U256::from(balance),
        timestamp: u64::from(account),
        ..StateBlock::default()
    }
}

/// Forward `from_bus`'s outbound peer traffic addressed to `to` (and every
/// broadcast) into `to_bus` as messages received from `from`.
pub fn spawn_link(
    from: PeerId,
    from_bus: &InMemoryEventBus,
    to: PeerId,
    to_bus: Arc<InMemoryEventBus>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let mut outbound = from_bus.subscribe(EventFilter::topics(vec![EventTopic::Outbound]));

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = shutdown.changed() => break,
                event = outbound.recv() => event,
            };
            let message = match event {
                Some(BlockchainEvent::SendToPeer { peer_id, message }) if peer_id == to => message,
                Some(BlockchainEvent::Broadcast { message }) => message,
                Some(_) => continue,
                None => break,
            };
            trace!(from = %from, to = %to, kind = message.kind(), "Link delivering");
            to_bus
                .publish(BlockchainEvent::PeerMessageReceived {
                    peer_id: from.clone(),
                    message,
                })
                .await;
        }
    })
}

/// Announce a stream between two nodes on both buses.
pub async fn connect_peers(
    a: &PeerId,
    a_bus: &InMemoryEventBus,
    b: &PeerId,
    b_bus: &InMemoryEventBus,
) {
    a_bus
        .publish(BlockchainEvent::PeerConnected { peer_id: b.clone() })
        .await;
    b_bus
        .publish(BlockchainEvent::PeerConnected { peer_id: a.clone() })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::{GenesisBuilder, GenesisConfig};

    #[test]
    fn test_chain_from_links_blocks() {
        let genesis = GenesisBuilder::new(GenesisConfig::default()).build().unwrap();
        let blocks = BlockFactory::new().chain_from(&genesis, 3).unwrap();

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].previous(), genesis.hash());
        assert_eq!(blocks[2].previous(), blocks[1].hash());
        assert_eq!(blocks[2].height(), 3);
        assert_eq!(blocks[2].state_hash(), genesis.state_hash());
    }

    #[test]
    fn test_factories_agree() {
        let genesis = GenesisBuilder::new(GenesisConfig::default()).build().unwrap();
        let tx = account_transaction(1, 2, 10);
        let a = BlockFactory::new().next_block(&genesis, &[tx.clone()]).unwrap();
        let b = BlockFactory::new().next_block(&genesis, &[tx]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.state_hash(), genesis.state_hash());
    }

    #[tokio::test]
    async fn test_link_delivers_addressed_messages() {
        let (_tx, shutdown) = watch::channel(false);
        let a_bus = Arc::new(InMemoryEventBus::new());
        let b_bus = Arc::new(InMemoryEventBus::new());
        let mut inbound = b_bus.subscribe(EventFilter::topics(vec![EventTopic::Network]));
        let link = spawn_link(
            PeerId::new("a"),
            &a_bus,
            PeerId::new("b"),
            Arc::clone(&b_bus),
            shutdown,
        );

        let status = shared_types::PeerMessage::Status(shared_types::PovStatus {
            current_height: 1,
            current_td: U256::one(),
            current_hash: [1u8; 32],
            genesis_hash: [0u8; 32],
        });
        a_bus
            .publish(BlockchainEvent::SendToPeer {
                peer_id: PeerId::new("c"),
                message: status.clone(),
            })
            .await;
        a_bus
            .publish(BlockchainEvent::SendToPeer {
                peer_id: PeerId::new("b"),
                message: status.clone(),
            })
            .await;

        match inbound.recv().await {
            Some(BlockchainEvent::PeerMessageReceived { peer_id, message }) => {
                assert_eq!(peer_id, PeerId::new("a"));
                assert_eq!(message, status);
            }
            other => panic!("unexpected event {:?}", other),
        }
        link.abort();
    }
}
