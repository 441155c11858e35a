//! Error types for the Block Processor subsystem

use shared_types::{ChainError, Hash};

/// Block admission errors returned to `submit_mined` callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessorError {
    #[error("Block {} failed verification: {reason}", shared_types::short_hash(hash))]
    VerificationFailed { hash: Hash, reason: String },

    #[error("Verifier returned no usable outcome for block {}", shared_types::short_hash(hash))]
    VerifierFault { hash: Hash },

    #[error("Chain store rejected block: {0}")]
    Chain(#[from] ChainError),

    #[error("Block processor is shutting down")]
    ShuttingDown,
}

pub type ProcessorResult<T> = Result<T, ProcessorError>;
