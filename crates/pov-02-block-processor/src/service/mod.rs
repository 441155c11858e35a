//! Block Processor Service - the admission loop
//!
//! The processor state (pools, re-submission queue) is moved into a single
//! tokio task. Callers talk to it through a cloneable
//! [`BlockProcessorHandle`] backed by a bounded channel.

use crate::config::ProcessorConfig;
use crate::domain::{
    BlockSource, OrphanPool, PendingPool, ProcessorError, ProcessorResult, VerifyOutcome,
};
use crate::ports::{BlockProcessorApi, BlockVerifier, ChainStore};
use async_trait::async_trait;
use shared_types::{short_hash, BlockOrigin, Hash, PovBlock};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Work items accepted by the admission loop.
#[derive(Debug)]
pub enum ProcessorCommand {
    Block(BlockSource),
    TransactionAvailable(Hash),
}

/// Dependencies for BlockProcessor
pub struct ProcessorDependencies<C, V> {
    pub chain: Arc<C>,
    pub verifier: Arc<V>,
    pub config: ProcessorConfig,
}

/// Owner of all admission state. Consumed by [`BlockProcessor::spawn`].
pub struct BlockProcessor<C, V>
where
    C: ChainStore,
    V: BlockVerifier,
{
    chain: Arc<C>,
    verifier: Arc<V>,
    config: ProcessorConfig,
    orphans: OrphanPool,
    pending: PendingPool,
    /// Blocks released by cascade or by transaction arrival. Drained before
    /// the next channel message; the loop never sends into its own channel.
    resubmit: VecDeque<BlockSource>,
}

impl<C, V> BlockProcessor<C, V>
where
    C: ChainStore + 'static,
    V: BlockVerifier + 'static,
{
    pub fn new(deps: ProcessorDependencies<C, V>) -> Self {
        let orphans = OrphanPool::new(deps.config.max_orphan_blocks, deps.config.orphan_ttl());
        let pending = PendingPool::new(deps.config.max_pending_blocks, deps.config.pending_ttl());
        Self {
            chain: deps.chain,
            verifier: deps.verifier,
            config: deps.config,
            orphans,
            pending,
            resubmit: VecDeque::new(),
        }
    }

    /// Start the admission loop. It runs until `shutdown` flips to `true`.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> (BlockProcessorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let handle = BlockProcessorHandle {
            tx,
            shutdown: shutdown.clone(),
        };
        let task = tokio::spawn(self.run(rx, shutdown));
        (handle, task)
    }

    async fn run(
        mut self,
        mut rx: mpsc::Receiver<ProcessorCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            "[pov-02] Block processor started (orphans<={}, pending<={})",
            self.config.max_orphan_blocks, self.config.max_pending_blocks
        );

        'main: loop {
            while let Some(source) = self.resubmit.pop_front() {
                if *shutdown.borrow() {
                    self.resubmit.push_front(source);
                    break 'main;
                }
                self.handle_source(source, Instant::now());
            }

            tokio::select! {
                biased;
                _ = shutdown_signal(&mut shutdown) => break,
                command = rx.recv() => match command {
                    Some(ProcessorCommand::Block(source)) => {
                        self.handle_source(source, Instant::now());
                    }
                    Some(ProcessorCommand::TransactionAvailable(tx_hash)) => {
                        self.handle_transaction_available(&tx_hash);
                    }
                    None => break,
                },
            }
        }

        rx.close();
        let mut refused = 0usize;
        while let Ok(command) = rx.try_recv() {
            if let ProcessorCommand::Block(mut source) = command {
                if let Some(reply) = source.take_reply() {
                    let _ = reply.send(Err(ProcessorError::ShuttingDown));
                    refused += 1;
                }
            }
        }
        for mut source in self.resubmit.drain(..) {
            if let Some(reply) = source.take_reply() {
                let _ = reply.send(Err(ProcessorError::ShuttingDown));
                refused += 1;
            }
        }
        info!(refused, "[pov-02] Exiting block processor loop");
    }

    fn handle_source(&mut self, mut source: BlockSource, now: Instant) {
        let reply = source.take_reply();
        let result = self.process_block(source, now);

        if let Err(e) = &result {
            if reply.is_none() {
                error!("[pov-02] {}", e);
            }
        }
        if let Some(reply) = reply {
            // Receiver may have given up already.
            let _ = reply.send(result);
        }
    }

    fn handle_transaction_available(&mut self, tx_hash: &Hash) {
        let ready = self.pending.transaction_available(tx_hash);
        if !ready.is_empty() {
            debug!(
                tx = %short_hash(tx_hash),
                blocks = ready.len(),
                "[pov-02] Transaction available, resubmitting pending blocks"
            );
        }
        self.resubmit.extend(ready);
    }

    fn process_block(&mut self, source: BlockSource, now: Instant) -> ProcessorResult<()> {
        let hash = source.hash();
        let height = source.block.height();

        if self.orphans.contains(&hash) {
            debug!(height, hash = %short_hash(&hash), "[pov-02] Duplicate orphan block");
            return Ok(());
        }
        if self.chain.has_block(&hash, height) {
            debug!(height, hash = %short_hash(&hash), "[pov-02] Block already in chain");
            return Ok(());
        }
        if self.chain.block_by_hash(&source.block.previous()).is_none() {
            self.add_orphan(source, now);
            return Ok(());
        }

        let Some(outcome) = self.verifier.verify_full(&source.block) else {
            return Err(ProcessorError::VerifierFault { hash });
        };

        debug!(
            height,
            hash = %short_hash(&hash),
            outcome = outcome.label(),
            origin = ?source.origin,
            "[pov-02] Block verified"
        );

        match outcome {
            VerifyOutcome::Accepted { state_trie } => {
                self.chain.insert_block(&source.block, state_trie)?;
                info!(
                    "[pov-02] Accepted block #{} {} ({:?})",
                    height,
                    short_hash(&hash),
                    source.origin
                );
                self.release_orphans(hash);
                Ok(())
            }
            VerifyOutcome::MissingParent => {
                self.add_orphan(source, now);
                Ok(())
            }
            VerifyOutcome::MissingTransactions { missing } => {
                if missing.is_empty() {
                    return Err(ProcessorError::VerifierFault { hash });
                }
                debug!(
                    height,
                    hash = %short_hash(&hash),
                    missing = missing.len(),
                    "[pov-02] Block waiting for transactions"
                );
                for evicted in self.pending.insert(source, missing, now) {
                    warn!(hash = %short_hash(&evicted), "[pov-02] Pending block dropped");
                }
                Ok(())
            }
            VerifyOutcome::Rejected { reason } => {
                Err(ProcessorError::VerificationFailed { hash, reason })
            }
        }
    }

    fn add_orphan(&mut self, source: BlockSource, now: Instant) {
        let hash = source.hash();
        let height = source.block.height();
        let parent = source.block.previous();

        for evicted in self.orphans.insert(source, now) {
            debug!(hash = %short_hash(&evicted), "[pov-02] Orphan block dropped");
        }
        debug!(
            height,
            hash = %short_hash(&hash),
            parent = %short_hash(&parent),
            orphans = self.orphans.len(),
            "[pov-02] Block buffered as orphan"
        );
    }

    /// Breadth-first walk over the parent index: every descendant of
    /// `accepted` leaves the orphan pool and is queued for admission in
    /// ascending height.
    fn release_orphans(&mut self, accepted: Hash) {
        let mut frontier = VecDeque::from([accepted]);
        let mut released = 0usize;

        while let Some(parent) = frontier.pop_front() {
            for child in self.orphans.take_children(&parent) {
                frontier.push_back(child.hash());
                self.resubmit.push_back(child);
                released += 1;
            }
        }

        if released > 0 {
            debug!(
                released,
                parent = %short_hash(&accepted),
                "[pov-02] Orphans released for admission"
            );
        }
    }
}

/// Resolves once the shutdown flag is set or its sender is gone.
async fn shutdown_signal(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Cloneable sender side of the admission loop.
#[derive(Clone)]
pub struct BlockProcessorHandle {
    tx: mpsc::Sender<ProcessorCommand>,
    shutdown: watch::Receiver<bool>,
}

impl BlockProcessorHandle {
    async fn send(&self, command: ProcessorCommand) -> ProcessorResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ProcessorError::ShuttingDown)
    }
}

#[async_trait]
impl BlockProcessorApi for BlockProcessorHandle {
    async fn submit(&self, block: PovBlock, origin: BlockOrigin) -> ProcessorResult<()> {
        self.send(ProcessorCommand::Block(BlockSource::new(block, origin)))
            .await
    }

    async fn submit_mined(&self, block: PovBlock) -> ProcessorResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(ProcessorCommand::Block(BlockSource::with_reply(
            block,
            BlockOrigin::LocalMined,
            reply_tx,
        )))
        .await?;

        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            biased;
            reply = reply_rx => reply.unwrap_or(Err(ProcessorError::ShuttingDown)),
            _ = shutdown_signal(&mut shutdown) => Err(ProcessorError::ShuttingDown),
        }
    }

    async fn notify_transaction_available(&self, tx_hash: Hash) -> ProcessorResult<()> {
        self.send(ProcessorCommand::TransactionAvailable(tx_hash))
            .await
    }
}

#[cfg(test)]
mod tests;
