//! # Block Admission Flows
//!
//! Blocks enter a running node through the bus or the processor handle and
//! are verified against the real chain, ledger and trie database:
//!
//! 1. **Orphan cascade**: descendants buffered before their ancestor are
//!    connected as soon as it lands.
//! 2. **Pending transactions**: a block waits until every referenced ledger
//!    transaction is committed.
//! 3. **Fork choice**: a heavier branch replaces the canonical one.
//! 4. **Rejection**: a block with a wrong state hash never joins the chain.

#[cfg(test)]
mod tests {
    use crate::integration::wait_for_height;
    use node_runtime::testing::{account_transaction, BlockFactory};
    use node_runtime::{NodeConfig, PovNode};
    use pov_02_block_processor::{BlockProcessorApi, ProcessorError};
    use shared_bus::{BlockchainEvent, EventPublisher};
    use shared_types::{BlockOrigin, ChainReader, PovBlock};
    use std::time::Duration;

    const STEP: Duration = Duration::from_millis(10);

    fn started_node() -> PovNode {
        let mut node = PovNode::new(NodeConfig::for_testing()).unwrap();
        node.start().unwrap();
        node
    }

    async fn gossip(node: &PovNode, block: PovBlock) {
        node.bus()
            .publish(BlockchainEvent::BlockReceived {
                block,
                origin: BlockOrigin::RemoteBroadcast,
                peer_id: None,
            })
            .await;
    }

    #[tokio::test]
    async fn test_orphans_cascade_after_ancestor_arrives() {
        let mut node = started_node();
        let blocks = BlockFactory::new().chain_from(&node.genesis(), 4).unwrap();
        let processor = node.processor().unwrap().clone();

        // Highest first: each is an orphan until block 1 lands.
        for block in blocks.iter().skip(1).rev() {
            processor.submit_mined(block.clone()).await.unwrap();
        }
        assert_eq!(node.chain().height(), 0);

        processor.submit_mined(blocks[0].clone()).await.unwrap();
        assert!(wait_for_height(&node, 4, 200, STEP).await);
        assert_eq!(node.chain().latest_block().unwrap(), blocks[3]);

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_block_waits_for_every_transaction() {
        let mut node = started_node();
        let factory = BlockFactory::new();
        let first = account_transaction(1, 9, 100);
        let second = account_transaction(2, 9, 250);
        let block = factory
            .next_block(&node.genesis(), &[first.clone(), second.clone()])
            .unwrap();
        let child = factory.next_block(&block, &[]).unwrap();

        gossip(&node, block.clone()).await;
        gossip(&node, child.clone()).await;

        node.ledger().commit_transaction(first).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(node.chain().height(), 0);

        node.ledger().commit_transaction(second).await;
        assert!(wait_for_height(&node, 2, 200, STEP).await);
        assert_eq!(node.chain().block_by_height(1).unwrap(), block);
        assert_eq!(node.chain().block_by_height(2).unwrap(), child);

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_transactions_committed_first_need_no_wait() {
        let mut node = started_node();
        let tx = account_transaction(5, 6, 42);
        node.ledger().commit_transaction(tx.clone()).await;

        let block = BlockFactory::new().next_block(&node.genesis(), &[tx]).unwrap();
        node.processor()
            .unwrap()
            .submit_mined(block.clone())
            .await
            .unwrap();

        assert_eq!(node.chain().latest_block().unwrap(), block);
        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_heavier_fork_becomes_canonical() {
        let mut node = started_node();
        let factory = BlockFactory::new();
        let genesis = node.genesis();
        let processor = node.processor().unwrap().clone();

        let main = factory.chain_from(&genesis, 2).unwrap();
        for block in &main {
            processor.submit_mined(block.clone()).await.unwrap();
        }
        assert_eq!(node.chain().height(), 2);

        let fork_1 = factory.next_block_with_nonce(&genesis, &[], 1).unwrap();
        let fork_2 = factory.next_block_with_nonce(&fork_1, &[], 1).unwrap();
        let fork_3 = factory.next_block_with_nonce(&fork_2, &[], 1).unwrap();
        for block in [&fork_1, &fork_2] {
            processor.submit_mined(block.clone()).await.unwrap();
        }
        // Equal weight keeps the incumbent.
        assert_eq!(node.chain().block_by_height(2).unwrap(), main[1]);

        processor.submit_mined(fork_3.clone()).await.unwrap();
        assert_eq!(node.chain().height(), 3);
        assert_eq!(node.chain().block_by_height(1).unwrap(), fork_1);
        assert_eq!(node.chain().latest_block().unwrap(), fork_3);
        assert!(node.chain().block_by_hash(&main[1].hash()).is_some());

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_wrong_state_hash_rejected() {
        let mut node = started_node();
        let mut block = BlockFactory::new().next_block(&node.genesis(), &[]).unwrap();
        block.header.state_hash = [7u8; 32];

        let result = node.processor().unwrap().submit_mined(block).await;
        assert!(matches!(
            result,
            Err(ProcessorError::VerificationFailed { .. })
        ));
        assert_eq!(node.chain().height(), 0);

        node.shutdown().await;
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_refused() {
        let mut node = started_node();
        let processor = node.processor().unwrap().clone();
        let block = BlockFactory::new().next_block(&node.genesis(), &[]).unwrap();
        node.shutdown().await;

        assert!(matches!(
            processor.submit_mined(block).await,
            Err(ProcessorError::ShuttingDown)
        ));
    }
}
