//! # Block Verifier Adapter
//!
//! Full verification of a candidate block against the local chain, the
//! ledger and the parent state.
//!
//! ## Check Order
//!
//! 1. Parent present (else `MissingParent`)
//! 2. Header: height linkage, timestamp window, merkle root, proof of work
//! 3. Every referenced transaction committed (else `MissingTransactions`)
//! 4. Applying the transactions to the parent state yields `state_hash`

use crate::adapters::LedgerReader;
use crate::container::VerifierConfig;
use pov_01_state_trie::{StateApplier, StateError, TrieDatabase};
use pov_02_block_processor::{BlockVerifier, VerifyOutcome};
use shared_types::{merkle_root, short_hash, ChainReader, Hash, PovBlock, U256};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;

/// Verifier over the chain store, the ledger and the trie database.
pub struct ChainVerifier<C, L, D>
where
    C: ChainReader,
    L: LedgerReader,
    D: TrieDatabase,
{
    chain: Arc<C>,
    ledger: Arc<L>,
    applier: StateApplier<D>,
    config: VerifierConfig,
}

impl<C, L, D> ChainVerifier<C, L, D>
where
    C: ChainReader,
    L: LedgerReader,
    D: TrieDatabase,
{
    pub fn new(chain: Arc<C>, ledger: Arc<L>, tries: Arc<D>, config: VerifierConfig) -> Self {
        Self {
            chain,
            ledger,
            applier: StateApplier::new(tries),
            config,
        }
    }

    fn check_header(&self, block: &PovBlock, parent: &PovBlock) -> Result<(), String> {
        let header = &block.header;

        if header.height != parent.height() + 1 {
            return Err(format!(
                "height {} does not follow parent height {}",
                header.height,
                parent.height()
            ));
        }

        if header.timestamp < parent.header.timestamp {
            return Err(format!(
                "timestamp {} is before parent timestamp {}",
                header.timestamp, parent.header.timestamp
            ));
        }
        let latest_allowed = unix_now().saturating_add(self.config.max_future_secs);
        if header.timestamp > latest_allowed {
            return Err(format!(
                "timestamp {} is too far in the future",
                header.timestamp
            ));
        }

        let unique: HashSet<&Hash> = block.tx_hashes.iter().collect();
        if unique.len() != block.tx_hashes.len() {
            return Err("duplicate transaction hash".to_string());
        }

        let expected_root = merkle_root(&block.tx_hashes);
        if header.merkle_root != expected_root {
            return Err(format!(
                "merkle root {} does not match transactions ({})",
                short_hash(&header.merkle_root),
                short_hash(&expected_root)
            ));
        }

        if U256::from_big_endian(&block.hash()) > header.target {
            return Err("proof of work does not meet target".to_string());
        }

        Ok(())
    }
}

impl<C, L, D> BlockVerifier for ChainVerifier<C, L, D>
where
    C: ChainReader,
    L: LedgerReader,
    D: TrieDatabase,
{
    fn verify_full(&self, block: &PovBlock) -> Option<VerifyOutcome> {
        let Some(parent) = self.chain.block_by_hash(&block.previous()) else {
            return Some(VerifyOutcome::MissingParent);
        };

        if let Err(reason) = self.check_header(block, &parent) {
            return Some(VerifyOutcome::Rejected { reason });
        }

        let mut txs = Vec::with_capacity(block.tx_hashes.len());
        let mut missing = HashSet::new();
        for tx_hash in &block.tx_hashes {
            match self.ledger.transaction(tx_hash) {
                Some(tx) => txs.push(tx),
                None => {
                    missing.insert(*tx_hash);
                }
            }
        }
        if !missing.is_empty() {
            return Some(VerifyOutcome::MissingTransactions { missing });
        }

        match self.applier.apply_transactions(&parent.state_hash(), &txs) {
            Ok(state_trie) => {
                let computed = state_trie.root_hash();
                if computed == block.state_hash() {
                    Some(VerifyOutcome::Accepted { state_trie })
                } else {
                    Some(VerifyOutcome::Rejected {
                        reason: format!(
                            "state hash {} does not match computed {}",
                            short_hash(&block.state_hash()),
                            short_hash(&computed)
                        ),
                    })
                }
            }
            Err(e @ (StateError::UnknownStateRoot { .. } | StateError::LockPoisoned)) => {
                error!(
                    block = %short_hash(&block.hash()),
                    "[pov-01] Parent state unavailable: {}",
                    e
                );
                None
            }
            Err(e) => Some(VerifyOutcome::Rejected {
                reason: e.to_string(),
            }),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
