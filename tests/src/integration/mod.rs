//! Cross-subsystem flows.

mod block_admission;
mod peer_sync;

use node_runtime::PovNode;
use std::time::Duration;

/// Poll `node` until its canonical height reaches `height`.
///
/// Returns `false` after `attempts` polls `step` apart.
pub async fn wait_for_height(node: &PovNode, height: u64, attempts: usize, step: Duration) -> bool {
    for _ in 0..attempts {
        if node.chain().height() >= height {
            return true;
        }
        tokio::time::sleep(step).await;
    }
    node.chain().height() >= height
}
