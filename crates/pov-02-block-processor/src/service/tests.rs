use super::*;
use parking_lot::RwLock;
use pov_01_state_trie::StateTrie;
use shared_types::{ChainError, ChainReader, PovHeader, U256};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

// Mock implementations for testing
struct MockChain {
    genesis: PovBlock,
    blocks: RwLock<HashMap<Hash, PovBlock>>,
    inserted: RwLock<Vec<Hash>>,
}

impl MockChain {
    fn new(genesis: PovBlock) -> Self {
        let mut blocks = HashMap::new();
        blocks.insert(genesis.hash(), genesis.clone());
        Self {
            genesis,
            blocks: RwLock::new(blocks),
            inserted: RwLock::new(Vec::new()),
        }
    }

    fn contains(&self, block: &PovBlock) -> bool {
        self.blocks.read().contains_key(&block.hash())
    }

    fn inserted(&self) -> Vec<Hash> {
        self.inserted.read().clone()
    }
}

impl ChainReader for MockChain {
    fn has_block(&self, hash: &Hash, _height: u64) -> bool {
        self.blocks.read().contains_key(hash)
    }

    fn block_by_hash(&self, hash: &Hash) -> Option<PovBlock> {
        self.blocks.read().get(hash).cloned()
    }

    fn block_by_height(&self, height: u64) -> Result<PovBlock, ChainError> {
        self.blocks
            .read()
            .values()
            .find(|b| b.height() == height)
            .cloned()
            .ok_or(ChainError::BlockNotFound { height })
    }

    fn genesis_block(&self) -> PovBlock {
        self.genesis.clone()
    }

    fn latest_block(&self) -> Result<PovBlock, ChainError> {
        self.blocks
            .read()
            .values()
            .max_by_key(|b| b.height())
            .cloned()
            .ok_or(ChainError::EmptyChain)
    }

    fn total_difficulty(&self, hash: &Hash) -> Option<U256> {
        self.block_by_hash(hash).map(|b| U256::from(b.height() + 1))
    }

    fn locate_best_block(&self, locators: &[Hash]) -> Option<PovBlock> {
        locators.iter().find_map(|h| self.block_by_hash(h))
    }

    fn block_locator(&self, _from: Option<Hash>) -> Vec<Hash> {
        vec![self.genesis.hash()]
    }
}

impl ChainStore for MockChain {
    fn insert_block(&self, block: &PovBlock, _state_trie: StateTrie) -> Result<(), ChainError> {
        self.blocks.write().insert(block.hash(), block.clone());
        self.inserted.write().push(block.hash());
        Ok(())
    }
}

struct MockVerifier {
    chain: Arc<MockChain>,
    ledger: RwLock<HashSet<Hash>>,
    rejected: RwLock<HashSet<Hash>>,
    faulty: RwLock<HashSet<Hash>>,
}

impl MockVerifier {
    fn new(chain: Arc<MockChain>) -> Self {
        Self {
            chain,
            ledger: RwLock::new(HashSet::new()),
            rejected: RwLock::new(HashSet::new()),
            faulty: RwLock::new(HashSet::new()),
        }
    }

    fn commit(&self, tx_hash: Hash) {
        self.ledger.write().insert(tx_hash);
    }
}

impl BlockVerifier for MockVerifier {
    fn verify_full(&self, block: &PovBlock) -> Option<VerifyOutcome> {
        let hash = block.hash();
        if self.faulty.read().contains(&hash) {
            return None;
        }
        if self.rejected.read().contains(&hash) {
            return Some(VerifyOutcome::Rejected {
                reason: "bad proof of work".into(),
            });
        }
        if self.chain.block_by_hash(&block.previous()).is_none() {
            return Some(VerifyOutcome::MissingParent);
        }
        let ledger = self.ledger.read();
        let missing: HashSet<Hash> = block
            .tx_hashes
            .iter()
            .filter(|tx| !ledger.contains(*tx))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Some(VerifyOutcome::MissingTransactions { missing });
        }
        Some(VerifyOutcome::Accepted {
            state_trie: StateTrie::new(),
        })
    }
}

fn genesis() -> PovBlock {
    PovBlock::new(PovHeader::default(), vec![])
}

fn child(parent: &PovBlock, nonce: u64, txs: Vec<Hash>) -> PovBlock {
    let header = PovHeader {
        previous: parent.hash(),
        height: parent.height() + 1,
        timestamp: parent.header.timestamp + 1,
        nonce,
        ..PovHeader::default()
    };
    PovBlock::new(header, txs)
}

fn descendants(parent: &PovBlock, count: usize) -> Vec<PovBlock> {
    let mut blocks = Vec::with_capacity(count);
    let mut tip = parent.clone();
    for _ in 0..count {
        tip = child(&tip, 0, vec![]);
        blocks.push(tip.clone());
    }
    blocks
}

struct Harness {
    genesis: PovBlock,
    chain: Arc<MockChain>,
    verifier: Arc<MockVerifier>,
    handle: BlockProcessorHandle,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

fn start(config: ProcessorConfig) -> Harness {
    let genesis = genesis();
    let chain = Arc::new(MockChain::new(genesis.clone()));
    let verifier = Arc::new(MockVerifier::new(Arc::clone(&chain)));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let processor = BlockProcessor::new(ProcessorDependencies {
        chain: Arc::clone(&chain),
        verifier: Arc::clone(&verifier),
        config,
    });
    let (handle, task) = processor.spawn(shutdown_rx);
    Harness {
        genesis,
        chain,
        verifier,
        handle,
        shutdown_tx,
        task,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached");
}

#[tokio::test]
async fn test_mined_block_is_accepted() {
    let h = start(ProcessorConfig::for_testing());
    let block = child(&h.genesis, 0, vec![]);

    h.handle.submit_mined(block.clone()).await.unwrap();

    assert!(h.chain.contains(&block));
    assert_eq!(h.chain.inserted(), vec![block.hash()]);
}

#[tokio::test]
async fn test_resubmitting_accepted_block_is_noop() {
    let h = start(ProcessorConfig::for_testing());
    let block = child(&h.genesis, 0, vec![]);

    h.handle.submit_mined(block.clone()).await.unwrap();
    h.handle.submit_mined(block.clone()).await.unwrap();
    h.handle
        .submit(block.clone(), BlockOrigin::RemoteBroadcast)
        .await
        .unwrap();
    h.handle.submit_mined(block).await.unwrap();

    assert_eq!(h.chain.inserted().len(), 1);
}

#[tokio::test]
async fn test_orphans_cascade_in_ascending_order() {
    let h = start(ProcessorConfig::for_testing());
    let blocks = descendants(&h.genesis, 5);

    for block in blocks.iter().skip(1).rev() {
        h.handle
            .submit(block.clone(), BlockOrigin::RemoteSyncFetch)
            .await
            .unwrap();
    }
    // Orphans are buffered, not accepted.
    h.handle.submit_mined(blocks[4].clone()).await.unwrap();
    assert!(h.chain.inserted().is_empty());

    h.handle.submit_mined(blocks[0].clone()).await.unwrap();
    wait_until(|| h.chain.inserted().len() == 5).await;

    let expected: Vec<Hash> = blocks.iter().map(PovBlock::hash).collect();
    assert_eq!(h.chain.inserted(), expected);
}

#[tokio::test]
async fn test_cascade_releases_every_branch() {
    let h = start(ProcessorConfig::for_testing());
    let parent = child(&h.genesis, 0, vec![]);
    let left = child(&parent, 1, vec![]);
    let right = child(&parent, 2, vec![]);
    let grandchild = child(&left, 0, vec![]);

    for block in [&grandchild, &left, &right] {
        h.handle
            .submit(block.clone(), BlockOrigin::RemoteBroadcast)
            .await
            .unwrap();
    }
    h.handle.submit_mined(parent.clone()).await.unwrap();

    wait_until(|| h.chain.inserted().len() == 4).await;
    let inserted = h.chain.inserted();
    assert_eq!(inserted[0], parent.hash());
    assert_eq!(inserted[3], grandchild.hash());
}

#[tokio::test]
async fn test_pending_block_waits_for_all_transactions() {
    let h = start(ProcessorConfig::for_testing());
    let (t1, t2) = ([0x11; 32], [0x22; 32]);
    let block = child(&h.genesis, 0, vec![t1, t2]);

    h.handle.submit_mined(block.clone()).await.unwrap();
    assert!(!h.chain.contains(&block));

    h.verifier.commit(t1);
    h.handle.notify_transaction_available(t1).await.unwrap();
    // A round-trip through the loop guarantees the notification was handled.
    h.handle.submit_mined(h.genesis.clone()).await.unwrap();
    assert!(!h.chain.contains(&block));

    h.verifier.commit(t2);
    h.handle.notify_transaction_available(t2).await.unwrap();
    wait_until(|| h.chain.contains(&block)).await;
}

#[tokio::test]
async fn test_competing_blocks_waiting_on_same_transaction() {
    let h = start(ProcessorConfig::for_testing());
    let tx = [0x33; 32];
    let first = child(&h.genesis, 1, vec![tx]);
    let second = child(&h.genesis, 2, vec![tx]);

    h.handle.submit_mined(first.clone()).await.unwrap();
    h.handle.submit_mined(second.clone()).await.unwrap();

    h.verifier.commit(tx);
    h.handle.notify_transaction_available(tx).await.unwrap();

    wait_until(|| h.chain.contains(&first) && h.chain.contains(&second)).await;
}

#[tokio::test]
async fn test_rejected_block_reports_error() {
    let h = start(ProcessorConfig::for_testing());
    let block = child(&h.genesis, 0, vec![]);
    h.verifier.rejected.write().insert(block.hash());

    let err = h.handle.submit_mined(block.clone()).await.unwrap_err();

    assert!(matches!(err, ProcessorError::VerificationFailed { hash, .. } if hash == block.hash()));
    assert!(!h.chain.contains(&block));
}

#[tokio::test]
async fn test_missing_outcome_is_fault() {
    let h = start(ProcessorConfig::for_testing());
    let block = child(&h.genesis, 0, vec![]);
    h.verifier.faulty.write().insert(block.hash());

    let err = h.handle.submit_mined(block.clone()).await.unwrap_err();
    assert_eq!(err, ProcessorError::VerifierFault { hash: block.hash() });
}

#[tokio::test]
async fn test_orphan_capacity_evicts_oldest() {
    let config = ProcessorConfig {
        max_orphan_blocks: 3,
        ..ProcessorConfig::for_testing()
    };
    let h = start(config);

    let parents: Vec<PovBlock> = (0..4).map(|i| child(&h.genesis, i, vec![])).collect();
    let orphans: Vec<PovBlock> = parents.iter().map(|p| child(p, 0, vec![])).collect();

    for orphan in &orphans {
        h.handle.submit_mined(orphan.clone()).await.unwrap();
        // Distinct arrival instants give a strict eviction order.
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    for parent in &parents {
        h.handle.submit_mined(parent.clone()).await.unwrap();
    }

    wait_until(|| h.chain.inserted().len() == 7).await;
    assert!(!h.chain.contains(&orphans[0]));
    for orphan in &orphans[1..] {
        assert!(h.chain.contains(orphan));
    }
}

#[tokio::test(start_paused = true)]
async fn test_expired_orphan_is_not_released() {
    let h = start(ProcessorConfig::for_testing());
    let parent = child(&h.genesis, 0, vec![]);
    let stale = child(&parent, 0, vec![]);
    let other_parent = child(&h.genesis, 9, vec![]);
    let fresh = child(&other_parent, 0, vec![]);

    h.handle.submit_mined(stale.clone()).await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;
    // Inserting another orphan sweeps the expired one.
    h.handle.submit_mined(fresh.clone()).await.unwrap();

    h.handle.submit_mined(parent.clone()).await.unwrap();
    h.handle.submit_mined(other_parent.clone()).await.unwrap();
    wait_until(|| h.chain.contains(&fresh)).await;

    assert!(h.chain.contains(&parent));
    assert!(!h.chain.contains(&stale));
}

#[tokio::test]
async fn test_shutdown_refuses_new_blocks() {
    let h = start(ProcessorConfig::for_testing());
    h.shutdown_tx.send(true).unwrap();
    h.task.await.unwrap();

    let block = child(&h.genesis, 0, vec![]);
    let err = h.handle.submit_mined(block.clone()).await.unwrap_err();
    assert_eq!(err, ProcessorError::ShuttingDown);
    assert_eq!(
        h.handle
            .submit(block, BlockOrigin::RemoteBroadcast)
            .await
            .unwrap_err(),
        ProcessorError::ShuttingDown
    );
}
