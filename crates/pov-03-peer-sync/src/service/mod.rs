//! Peer Syncer Service
//!
//! Two tasks share one `Arc<PeerSyncer>`: the message loop (inbound peer
//! messages, status broadcast) and the sync loop (state machine tickers).
//! Progress lives behind a `parking_lot::Mutex` that is never held across
//! an `.await`; outbound sends happen after the guard is dropped.

mod bulk_pull;

use crate::config::SyncConfig;
use crate::domain::{PeerTable, SyncError, SyncPeer, SyncProgress, SyncResult};
use crate::ports::{BlockSink, PeerMessenger, SyncMessage};
use parking_lot::Mutex;
use shared_types::{
    short_hash, BlockOrigin, BulkPullRequest, BulkPullResponse, ChainReader, Hash, PeerId,
    PeerMessage, PovStatus, PullReason, PullStart, SyncState, ZERO_HASH,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, sleep, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Dependencies for PeerSyncer
pub struct SyncDependencies<C, M, B> {
    pub chain: Arc<C>,
    pub messenger: Arc<M>,
    pub sink: Arc<B>,
    pub config: SyncConfig,
}

/// Drives the local chain towards the heaviest known peer.
pub struct PeerSyncer<C, M, B>
where
    C: ChainReader,
    M: PeerMessenger,
    B: BlockSink,
{
    chain: Arc<C>,
    messenger: Arc<M>,
    sink: Arc<B>,
    config: SyncConfig,
    peers: PeerTable,
    progress: Mutex<SyncProgress>,
}

/// Sender side of the syncer's message loop.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncMessage>,
}

impl SyncHandle {
    /// Queue a message; `false` once the syncer has stopped.
    pub async fn deliver(&self, message: SyncMessage) -> bool {
        self.tx.send(message).await.is_ok()
    }
}

impl<C, M, B> PeerSyncer<C, M, B>
where
    C: ChainReader + 'static,
    M: PeerMessenger + 'static,
    B: BlockSink + 'static,
{
    pub fn new(deps: SyncDependencies<C, M, B>) -> Self {
        Self {
            chain: deps.chain,
            messenger: deps.messenger,
            sink: deps.sink,
            config: deps.config,
            peers: PeerTable::new(),
            progress: Mutex::new(SyncProgress::new(Instant::now())),
        }
    }

    pub fn state(&self) -> SyncState {
        self.progress.lock().state
    }

    /// Snapshot of the current bookkeeping.
    pub fn progress(&self) -> SyncProgress {
        self.progress.lock().clone()
    }

    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Start the message loop and the sync loop.
    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> (SyncHandle, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(self.config.message_channel_capacity.max(1));
        let message_task = tokio::spawn(Arc::clone(&self).message_loop(rx, shutdown.clone()));
        let sync_task = tokio::spawn(self.sync_loop(shutdown));
        (SyncHandle { tx }, vec![message_task, sync_task])
    }

    async fn message_loop(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<SyncMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let period = self.config.check_peer_status_interval();
        let mut check_peers = interval_at(Instant::now() + period, period);
        check_peers.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_signal(&mut shutdown) => break,
                _ = check_peers.tick() => self.check_all_peers().await,
                message = rx.recv() => match message {
                    Some(message) => self.process_message(message).await,
                    None => break,
                },
            }
        }
        info!("[pov-03] Exiting sync message loop");
    }

    async fn sync_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let deadline = Instant::now() + self.config.wait_enough_peers();
        loop {
            let count = self.peers.count();
            if count >= self.config.min_sync_peers {
                info!("[pov-03] {} peers connected, starting sync", count);
                break;
            }
            if Instant::now() >= deadline {
                info!("[pov-03] Peer wait timed out with {} peers, starting sync", count);
                break;
            }
            tokio::select! {
                _ = shutdown_signal(&mut shutdown) => return,
                _ = sleep(Duration::from_secs(1)) => {}
            }
        }

        let mut check_sync = interval(self.config.check_sync_interval());
        check_sync.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let chain_period = self.config.check_chain_interval();
        let mut check_chain = interval_at(Instant::now() + chain_period, chain_period);
        check_chain.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_signal(&mut shutdown) => break,
                _ = check_sync.tick() => self.check_sync_peer().await,
                _ = check_chain.tick() => self.check_chain().await,
            }
            if self.state().is_terminal() {
                break;
            }
        }
        info!(state = %self.state(), "[pov-03] Exiting sync loop");
    }

    // === MESSAGE HANDLING ===

    pub async fn process_message(&self, message: SyncMessage) {
        match message {
            SyncMessage::StreamAdded { peer_id } => self.on_stream_added(peer_id).await,
            SyncMessage::StreamRemoved { peer_id } => {
                if self.peers.remove(&peer_id).is_some() {
                    info!("[pov-03] Peer {} removed", peer_id);
                }
            }
            SyncMessage::Status { peer_id, status } => self.on_status(&peer_id, &status),
            SyncMessage::BulkPullRequest { peer_id, request } => {
                self.on_bulk_pull_request(&peer_id, &request).await
            }
            SyncMessage::BulkPullResponse { peer_id, response } => {
                self.on_bulk_pull_response(&peer_id, response).await
            }
        }
    }

    async fn on_stream_added(&self, peer_id: PeerId) {
        if !self.peers.add(peer_id.clone(), Instant::now()) {
            return;
        }
        info!("[pov-03] Peer {} added", peer_id);

        match self.local_status() {
            Ok(status) => {
                self.messenger
                    .send_to_peer(&peer_id, PeerMessage::Status(status))
                    .await
            }
            Err(e) => warn!("[pov-03] Cannot build local status: {}", e),
        }
    }

    fn on_status(&self, peer_id: &PeerId, status: &PovStatus) {
        let genesis = self.chain.genesis_block().hash();
        if status.genesis_hash != genesis {
            warn!(
                peer = %peer_id,
                theirs = %short_hash(&status.genesis_hash),
                ours = %short_hash(&genesis),
                "[pov-03] Ignoring status with different genesis"
            );
            return;
        }

        if self.peers.apply_status(
            peer_id,
            status.current_height,
            status.current_td,
            Instant::now(),
        ) {
            debug!(
                peer = %peer_id,
                height = status.current_height,
                td = %status.current_td,
                "[pov-03] Peer status updated"
            );
        } else {
            debug!(peer = %peer_id, "[pov-03] Status from unknown peer ignored");
        }
    }

    async fn on_bulk_pull_request(&self, peer_id: &PeerId, request: &BulkPullRequest) {
        let Some(response) = self.build_bulk_pull_response(request) else {
            return;
        };
        debug!(
            peer = %peer_id,
            reason = ?response.reason,
            count = response.count,
            "[pov-03] Serving bulk pull"
        );
        self.messenger
            .send_to_peer(peer_id, PeerMessage::BulkPullResponse(response))
            .await;
    }

    async fn on_bulk_pull_response(&self, peer_id: &PeerId, response: BulkPullResponse) {
        if response.blocks.is_empty() {
            return;
        }
        if response.reason == PullReason::Sync {
            let progress = self.progress.lock();
            if progress.state != SyncState::Syncing {
                debug!(peer = %peer_id, "[pov-03] Sync response outside of syncing ignored");
                return;
            }
            if progress.sync_peer.as_ref() != Some(peer_id) {
                debug!(peer = %peer_id, "[pov-03] Sync response from non-sync peer ignored");
                return;
            }
        }

        let reason = response.reason;
        let mut last_height = 0;
        let count = response.blocks.len();
        for block in response.blocks {
            last_height = block.height();
            if let Err(e) = self
                .sink
                .submit_block(block, BlockOrigin::RemoteSyncFetch)
                .await
            {
                warn!("[pov-03] {}", SyncError::Sink(e));
                return;
            }
        }
        debug!(
            peer = %peer_id,
            count,
            last_height,
            "[pov-03] Forwarded pulled blocks"
        );

        if reason == PullReason::Sync {
            let next = {
                let mut progress = self.progress.lock();
                self.next_sync_request(&mut progress, false, last_height, Instant::now())
            };
            self.send_request(next).await;
        }
    }

    /// Status advertised to peers.
    pub fn local_status(&self) -> SyncResult<PovStatus> {
        let genesis = self.chain.genesis_block();
        let latest = self.chain.latest_block()?;
        let hash = latest.hash();
        let td = self
            .chain
            .total_difficulty(&hash)
            .ok_or(SyncError::MissingTotalDifficulty { hash })?;
        Ok(PovStatus {
            current_height: latest.height(),
            current_td: td,
            current_hash: hash,
            genesis_hash: genesis.hash(),
        })
    }

    // === PERIODIC CHECKS ===

    /// Broadcast our status and demote silent peers.
    pub async fn check_all_peers(&self) {
        if self.peers.count() == 0 {
            return;
        }

        match self.local_status() {
            Ok(status) => self.messenger.broadcast(PeerMessage::Status(status)).await,
            Err(e) => warn!("[pov-03] Cannot build local status: {}", e),
        }

        for peer_id in self
            .peers
            .mark_stale(Instant::now(), self.config.peer_dead_timeout())
        {
            info!("[pov-03] Peer {} may be dead", peer_id);
        }
    }

    /// Start syncing, pick the sync peer, and watch for losing every peer.
    pub async fn check_sync_peer(&self) {
        let latest = match self.chain.latest_block() {
            Ok(latest) => latest,
            Err(e) => {
                error!("[pov-03] Failed to read latest block: {}", e);
                self.fail().await;
                return;
            }
        };

        let now = Instant::now();
        let best = self.peers.best_peer();
        let mut transitions = Vec::new();
        let request = {
            let mut progress = self.progress.lock();
            match progress.state {
                SyncState::NotStarted => {
                    progress.current_height = latest.height();
                    progress.from_height = latest.height() + 1;
                    progress.last_progress_at = now;
                    transitions.extend(progress.transition(SyncState::Syncing));
                }
                SyncState::Syncing => {}
                SyncState::Done | SyncState::Err => return,
            }

            match best {
                Some(best) => {
                    progress.sync_peer_lost_at = None;
                    self.sync_with_peer(&mut progress, &best, now)
                }
                None => {
                    match progress.sync_peer_lost_at {
                        None => {
                            warn!("[pov-03] No good peer to sync with");
                            progress.sync_peer_lost_at = Some(now);
                        }
                        Some(lost_at) => {
                            if now.saturating_duration_since(lost_at)
                                >= self.config.peer_lost_timeout()
                            {
                                error!("[pov-03] Sync peer lost for too long");
                                transitions.extend(progress.transition(SyncState::Err));
                            }
                        }
                    }
                    None
                }
            }
        };

        self.announce(transitions).await;
        self.send_request(request).await;
    }

    /// Track local progress: finish at the target height, fail on a stall.
    pub async fn check_chain(&self) {
        if self.state() != SyncState::Syncing {
            return;
        }
        let latest = match self.chain.latest_block() {
            Ok(latest) => latest,
            Err(e) => {
                error!("[pov-03] Failed to read latest block: {}", e);
                self.fail().await;
                return;
            }
        };

        let now = Instant::now();
        let height = latest.height();
        let no_peers = self.peers.count() == 0;
        let transition = {
            let mut progress = self.progress.lock();
            if progress.state != SyncState::Syncing {
                return;
            }
            // A target only exists once a sync peer was chosen. Peers still
            // waiting for their first status keep the sync open.
            let has_target = progress.sync_peer.is_some() || no_peers;
            if has_target && height >= progress.to_height {
                info!(
                    "[pov-03] Sync done: local height {} reached target {}",
                    height, progress.to_height
                );
                progress.current_height = height;
                progress.transition(SyncState::Done)
            } else if height != progress.current_height {
                progress.current_height = height;
                progress.last_progress_at = now;
                None
            } else if now.saturating_duration_since(progress.last_progress_at)
                >= self.config.chain_stall_timeout()
            {
                error!(
                    "[pov-03] Local chain stuck at height {} (target {})",
                    height, progress.to_height
                );
                progress.transition(SyncState::Err)
            } else {
                None
            }
        };

        self.announce(transition.into_iter().collect()).await;
    }

    // === REQUESTS ===

    fn sync_with_peer(
        &self,
        progress: &mut SyncProgress,
        best: &SyncPeer,
        now: Instant,
    ) -> Option<(PeerId, BulkPullRequest)> {
        let same_peer = progress.sync_peer.as_ref() == Some(&best.peer_id);
        if same_peer {
            if let Some(last) = progress.last_request_at {
                if now.saturating_duration_since(last) < self.config.request_cooldown() {
                    return None;
                }
            }
        } else {
            info!(
                "[pov-03] Syncing with peer {} (height {}, td {})",
                best.peer_id, best.height, best.total_difficulty
            );
        }

        progress.sync_peer = Some(best.peer_id.clone());
        progress.to_height = best.height;
        let current = progress.current_height;
        self.next_sync_request(progress, true, current, now)
    }

    /// Next pipelined request towards `to_height`, or `None` when nothing is
    /// left to ask for.
    fn next_sync_request(
        &self,
        progress: &mut SyncProgress,
        use_locator: bool,
        last_height: u64,
        now: Instant,
    ) -> Option<(PeerId, BulkPullRequest)> {
        if progress.state != SyncState::Syncing
            || last_height >= progress.to_height
            || progress.current_height >= progress.to_height
        {
            return None;
        }
        let peer_id = progress.sync_peer.clone()?;

        let start = if use_locator {
            PullStart::Locators(self.chain.block_locator(None))
        } else {
            PullStart::Height(last_height + 1)
        };
        progress.sync_height = last_height + 1;
        progress.last_request_at = Some(now);

        Some((
            peer_id,
            BulkPullRequest {
                start,
                count: self.config.max_blocks_per_request,
                reason: PullReason::Sync,
            },
        ))
    }

    async fn send_request(&self, request: Option<(PeerId, BulkPullRequest)>) {
        if let Some((peer_id, request)) = request {
            debug!(peer = %peer_id, start = ?request.start, "[pov-03] Requesting blocks");
            self.messenger
                .send_to_peer(&peer_id, PeerMessage::BulkPullRequest(request))
                .await;
        }
    }

    /// Ask the best peer for `count` blocks starting at `start_height`.
    pub async fn request_blocks_by_height(&self, start_height: u64, count: u32) -> bool {
        if count == 0 {
            return false;
        }
        let Some(best) = self.peers.best_peer() else {
            return false;
        };
        let request = BulkPullRequest {
            start: PullStart::Height(start_height),
            count,
            reason: PullReason::Fetch,
        };
        self.send_request(Some((best.peer_id, request))).await;
        true
    }

    /// Ask for `count` blocks starting at (and including) `start_hash`, from
    /// the two heaviest peers or from a TD-spread sample. Returns the number
    /// of peers asked.
    pub async fn request_blocks_by_hash(&self, start_hash: Hash, count: u32, use_best: bool) -> usize {
        if start_hash == ZERO_HASH || count == 0 {
            return 0;
        }
        let peers = if use_best {
            self.peers.best_peers(2)
        } else {
            self.peers.locator_peers()
        };
        for peer in &peers {
            let request = BulkPullRequest {
                start: PullStart::Hash(start_hash),
                count,
                reason: PullReason::Fetch,
            };
            self.send_request(Some((peer.peer_id.clone(), request))).await;
        }
        peers.len()
    }

    async fn fail(&self) {
        let transition = self.progress.lock().transition(SyncState::Err);
        self.announce(transition.into_iter().collect()).await;
    }

    async fn announce(&self, transitions: Vec<SyncState>) {
        for state in transitions {
            info!("[pov-03] Sync state -> {}", state);
            self.messenger.publish_sync_state(state).await;
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
