//! Inbound ports (API that the processor exposes)

use crate::domain::ProcessorResult;
use async_trait::async_trait;
use shared_types::{BlockOrigin, Hash, PovBlock};

/// Block admission API.
#[async_trait]
pub trait BlockProcessorApi: Send + Sync {
    /// Queue a block without waiting for the outcome.
    async fn submit(&self, block: PovBlock, origin: BlockOrigin) -> ProcessorResult<()>;

    /// Queue a locally mined block and wait until it is accepted, buffered
    /// or refused.
    async fn submit_mined(&self, block: PovBlock) -> ProcessorResult<()>;

    /// A ledger transaction became available; wakes pending blocks.
    async fn notify_transaction_available(&self, tx_hash: Hash) -> ProcessorResult<()>;
}
