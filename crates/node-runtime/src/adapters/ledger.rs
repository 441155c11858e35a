//! # Ledger Adapter
//!
//! Committed ledger transactions the verifier resolves block transaction
//! hashes against. Every commit is announced on the bus so pending blocks
//! waiting for it get another chance.

use parking_lot::RwLock;
use shared_bus::{BlockchainEvent, EventPublisher};
use shared_types::{short_hash, Hash, StateBlock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Read access to committed ledger transactions.
pub trait LedgerReader: Send + Sync {
    fn transaction(&self, tx_hash: &Hash) -> Option<StateBlock>;

    fn has_transaction(&self, tx_hash: &Hash) -> bool {
        self.transaction(tx_hash).is_some()
    }
}

/// In-memory ledger that publishes `TransactionCommitted` on every commit.
pub struct InMemoryLedger {
    transactions: RwLock<HashMap<Hash, StateBlock>>,
    bus: Arc<dyn EventPublisher>,
}

impl InMemoryLedger {
    pub fn new(bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            transactions: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Store `tx` and announce it. Returns the transaction hash.
    pub async fn commit_transaction(&self, tx: StateBlock) -> Hash {
        let tx_hash = tx.hash();
        let is_new = self.transactions.write().insert(tx_hash, tx).is_none();

        if is_new {
            debug!(tx = %short_hash(&tx_hash), "Transaction committed");
            self.bus
                .publish(BlockchainEvent::TransactionCommitted { tx_hash })
                .await;
        }
        tx_hash
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }
}

impl LedgerReader for InMemoryLedger {
    fn transaction(&self, tx_hash: &Hash) -> Option<StateBlock> {
        self.transactions.read().get(tx_hash).cloned()
    }
}
