use pov_01_state_trie::StateTrie;
use shared_types::Hash;
use std::collections::HashSet;

/// Result of a full verification attempt.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    /// Valid; `state_trie` is the post-block state to commit with it.
    Accepted { state_trie: StateTrie },
    /// Parent not (yet) in the chain.
    MissingParent,
    /// Structurally valid but these ledger transactions are not committed.
    MissingTransactions { missing: HashSet<Hash> },
    /// Permanently invalid.
    Rejected { reason: String },
}

impl VerifyOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::MissingParent => "missing-parent",
            Self::MissingTransactions { .. } => "missing-transactions",
            Self::Rejected { .. } => "rejected",
        }
    }
}
