//! # State Applier
//!
//! Deterministic transform from a parent state root plus an ordered list of
//! ledger transactions to a candidate state trie.

use crate::domain::{AccountState, RepresentativeState, StateError, StateTrie, EMPTY_TRIE_ROOT};
use crate::ports::TrieDatabase;
use shared_types::{short_hash, Hash, StateBlock, ZERO_ADDRESS, ZERO_HASH};
use std::sync::Arc;
use tracing::{debug, trace};

/// Applies block transactions on top of stored tries.
pub struct StateApplier<D: TrieDatabase> {
    db: Arc<D>,
}

impl<D: TrieDatabase> Clone for StateApplier<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl<D: TrieDatabase> StateApplier<D> {
    pub fn new(db: Arc<D>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<D> {
        &self.db
    }

    /// Load the trie for `root`. The zero hash and the empty root both denote
    /// the genesis (empty) state.
    pub fn load_trie(&self, root: &Hash) -> Result<StateTrie, StateError> {
        if *root == ZERO_HASH || *root == EMPTY_TRIE_ROOT {
            return Ok(StateTrie::new());
        }
        self.db
            .get_trie(root)?
            .ok_or(StateError::UnknownStateRoot { root: *root })
    }

    /// Clone the parent trie and fold `txs` over it in order.
    ///
    /// The first failing transaction aborts the whole block; the stored parent
    /// trie is never modified.
    pub fn apply_transactions(
        &self,
        previous_root: &Hash,
        txs: &[StateBlock],
    ) -> Result<StateTrie, StateError> {
        let mut trie = self.load_trie(previous_root)?;

        for tx in txs {
            apply_transaction(&mut trie, tx)?;
        }

        debug!(
            "[pov-01] Applied {} transactions on {} -> {}",
            txs.len(),
            short_hash(previous_root),
            short_hash(&trie.root_hash())
        );
        Ok(trie)
    }

    /// Persist a trie so later blocks can build on it.
    pub fn commit(&self, trie: &StateTrie) -> Result<Hash, StateError> {
        self.db.put_trie(trie)
    }
}

/// Apply one ledger transaction: rewrite the sender's account, then move
/// representative weight for chain-token transactions.
pub fn apply_transaction(trie: &mut StateTrie, tx: &StateBlock) -> Result<(), StateError> {
    let tx_hash = tx.hash();
    let old_account = trie.get_account_state(&tx.address)?;

    let mut new_account = old_account.clone().unwrap_or_default();
    new_account.apply_block(tx, tx_hash);
    trie.set_account_state(&tx.address, &new_account)?;

    if tx.is_chain_token() {
        update_representatives(trie, tx, old_account.as_ref())?;
    }

    trace!(tx = %short_hash(&tx_hash), "[pov-01] Transaction applied");
    Ok(())
}

fn update_representatives(
    trie: &mut StateTrie,
    tx: &StateBlock,
    old_account: Option<&AccountState>,
) -> Result<(), StateError> {
    // Accounts are re-read from the trie at every step so an account that
    // represents itself sees its own freshly written state.
    if let Some(old) = old_account {
        if let Some(previous) = old.chain_token_state() {
            let rep = previous.representative;
            if rep != ZERO_ADDRESS {
                let mut rep_account = trie
                    .get_account_state(&rep)?
                    .ok_or(StateError::MissingRepresentativeState { address: rep })?;
                let current = rep_account
                    .rep_state
                    .as_ref()
                    .ok_or(StateError::MissingRepresentativeState { address: rep })?;
                let reduced =
                    current.checked_sub(&RepresentativeState::contribution_of(old), &rep)?;
                rep_account.rep_state = Some(reduced);
                trie.set_account_state(&rep, &rep_account)?;
            }
        }
    }

    let rep = tx.representative;
    if rep != ZERO_ADDRESS {
        let mut rep_account = trie.get_account_state(&rep)?.unwrap_or_default();
        let current = rep_account.rep_state.take().unwrap_or_default();
        let increased =
            current.checked_add(&RepresentativeState::contribution_from_block(tx), &rep)?;
        rep_account.rep_state = Some(increased);
        trie.set_account_state(&rep, &rep_account)?;
    }

    Ok(())
}
