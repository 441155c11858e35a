//! # Peer Sync Flows
//!
//! Two complete nodes whose buses are joined by an in-memory link:
//!
//! ```text
//! local node ──SendToPeer/Broadcast──→ link ──PeerMessageReceived──→ remote node
//!            ←──PeerMessageReceived── link ←──SendToPeer/Broadcast──
//! ```
//!
//! Runs on paused time, so the syncer's multi-second timers elapse
//! instantly once every task is idle.

#[cfg(test)]
mod tests {
    use node_runtime::testing::{connect_peers, spawn_link, BlockFactory};
    use node_runtime::{NodeConfig, PovNode};
    use pov_02_block_processor::BlockProcessorApi;
    use shared_types::{ChainReader, PeerId, PovBlock, SyncState};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::task::JoinHandle;

    fn config() -> NodeConfig {
        let mut config = NodeConfig::for_testing();
        // Long enough that syncing never starts before the link is up.
        config.sync.wait_enough_peers_secs = 30;
        config
    }

    async fn node_with_blocks(config: NodeConfig, blocks: &[PovBlock]) -> PovNode {
        let mut node = PovNode::new(config).unwrap();
        node.start().unwrap();
        let processor = node.processor().unwrap().clone();
        for block in blocks {
            processor.submit_mined(block.clone()).await.unwrap();
        }
        node
    }

    fn link(a: &PovNode, b: &PovNode, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let a_id = PeerId::new("node-a");
        let b_id = PeerId::new("node-b");
        vec![
            spawn_link(
                a_id.clone(),
                a.bus(),
                b_id.clone(),
                Arc::clone(b.bus()),
                shutdown.clone(),
            ),
            spawn_link(b_id, b.bus(), a_id, Arc::clone(a.bus()), shutdown),
        ]
    }

    async fn connect(a: &PovNode, b: &PovNode) {
        connect_peers(
            &PeerId::new("node-a"),
            a.bus(),
            &PeerId::new("node-b"),
            b.bus(),
        )
        .await;
    }

    async fn wait_for_state(node: &PovNode, state: SyncState, max_secs: u64) -> bool {
        for _ in 0..max_secs * 10 {
            if node.sync_state() == state {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        node.sync_state() == state
    }

    #[tokio::test(start_paused = true)]
    async fn test_lagging_node_catches_up() {
        let genesis = PovNode::new(config()).unwrap().genesis();
        let blocks = BlockFactory::new().chain_from(&genesis, 150).unwrap();

        let mut local = node_with_blocks(config(), &blocks[..100]).await;
        let mut remote = node_with_blocks(config(), &blocks).await;
        assert_eq!(local.chain().height(), 100);
        assert_eq!(remote.chain().height(), 150);

        let (link_tx, link_rx) = watch::channel(false);
        let links = link(&local, &remote, link_rx);
        connect(&local, &remote).await;

        assert!(wait_for_state(&local, SyncState::Done, 120).await);
        assert_eq!(local.chain().height(), 150);
        assert_eq!(local.chain().latest_block().unwrap(), blocks[149]);

        // The heavier side has nothing to pull and finishes too.
        assert!(wait_for_state(&remote, SyncState::Done, 10).await);
        assert_eq!(remote.chain().height(), 150);

        link_tx.send_replace(true);
        for handle in links {
            handle.await.unwrap();
        }
        local.shutdown().await;
        remote.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_peers_finishes_after_wait() {
        let mut node = node_with_blocks(config(), &[]).await;
        assert_eq!(node.sync_state(), SyncState::NotStarted);

        assert!(wait_for_state(&node, SyncState::Done, 60).await);
        assert_eq!(node.chain().height(), 0);
        node.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreign_genesis_peer_never_synced_from() {
        let mut foreign_config = config();
        foreign_config.genesis.timestamp += 1;
        let foreign_genesis = PovNode::new(foreign_config.clone()).unwrap().genesis();
        let foreign_blocks = BlockFactory::new().chain_from(&foreign_genesis, 5).unwrap();

        let mut local = node_with_blocks(config(), &[]).await;
        let mut foreign = node_with_blocks(foreign_config, &foreign_blocks).await;
        assert_ne!(local.genesis().hash(), foreign.genesis().hash());

        let (link_tx, link_rx) = watch::channel(false);
        let links = link(&local, &foreign, link_rx);
        connect(&local, &foreign).await;

        // Connected but never a usable sync peer: the lost-peer timer fails
        // the sync.
        assert!(wait_for_state(&local, SyncState::Err, 900).await);
        assert_eq!(local.chain().height(), 0);

        link_tx.send_replace(true);
        for handle in links {
            handle.await.unwrap();
        }
        local.shutdown().await;
        foreign.shutdown().await;
    }
}
