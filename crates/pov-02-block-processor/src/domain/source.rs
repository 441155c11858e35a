use super::ProcessorError;
use shared_types::{BlockOrigin, Hash, PovBlock};
use tokio::sync::oneshot;

/// Reply channel for a locally mined block.
pub type BlockReply = oneshot::Sender<Result<(), ProcessorError>>;

/// One admission request.
#[derive(Debug)]
pub struct BlockSource {
    pub block: PovBlock,
    pub origin: BlockOrigin,
    reply: Option<BlockReply>,
}

impl BlockSource {
    pub fn new(block: PovBlock, origin: BlockOrigin) -> Self {
        Self {
            block,
            origin,
            reply: None,
        }
    }

    pub fn with_reply(block: PovBlock, origin: BlockOrigin, reply: BlockReply) -> Self {
        Self {
            block,
            origin,
            reply: Some(reply),
        }
    }

    pub fn hash(&self) -> Hash {
        self.block.hash()
    }

    pub fn has_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Detach the reply channel; later calls return `None`.
    pub fn take_reply(&mut self) -> Option<BlockReply> {
        self.reply.take()
    }
}
