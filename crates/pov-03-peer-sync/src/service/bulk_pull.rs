//! Serving bulk-pull requests from the local canonical chain.

use super::PeerSyncer;
use crate::ports::{BlockSink, PeerMessenger};
use shared_types::{short_hash, BulkPullRequest, BulkPullResponse, ChainReader, PullStart};
use tracing::debug;

impl<C, M, B> PeerSyncer<C, M, B>
where
    C: ChainReader + 'static,
    M: PeerMessenger + 'static,
    B: BlockSink + 'static,
{
    /// Canonical blocks answering `request`, or `None` when there is
    /// nothing to send.
    ///
    /// Locator requests resume after the best common block; hash requests
    /// include the named block itself. The response stops early at the
    /// local tip or once the encoded size reaches `max_response_bytes`.
    pub fn build_bulk_pull_response(&self, request: &BulkPullRequest) -> Option<BulkPullResponse> {
        if request.count == 0 {
            return None;
        }

        let mut blocks = Vec::new();
        let mut remaining = request.count;
        let start_height = match &request.start {
            PullStart::Locators(locators) => {
                let Some(anchor) = self.chain.locate_best_block(locators) else {
                    debug!(
                        locators = locators.len(),
                        "[pov-03] No common block for locators"
                    );
                    return None;
                };
                anchor.height() + 1
            }
            PullStart::Hash(hash) => {
                let Some(anchor) = self.chain.block_by_hash(hash) else {
                    debug!(hash = %short_hash(hash), "[pov-03] Requested block not found");
                    return None;
                };
                let next = anchor.height() + 1;
                blocks.push(anchor);
                remaining -= 1;
                next
            }
            PullStart::Height(height) => *height,
        };

        let max_bytes = self.config.max_response_bytes;
        let mut total_bytes = blocks
            .iter()
            .map(|b| b.serialized_size())
            .fold(0usize, usize::saturating_add);
        let mut height = start_height;
        while remaining > 0 && total_bytes < max_bytes {
            let Ok(block) = self.chain.block_by_height(height) else {
                break;
            };
            total_bytes = total_bytes.saturating_add(block.serialized_size());
            blocks.push(block);
            remaining -= 1;
            height += 1;
        }

        if blocks.is_empty() {
            return None;
        }
        Some(BulkPullResponse {
            reason: request.reason,
            count: blocks.len() as u32,
            blocks,
        })
    }
}
