use super::{AccountState, StateError, EMPTY_TRIE_ROOT};
use sha3::{Digest, Keccak256};
use shared_types::{Address, Hash};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Versioned key-value trie holding account states.
///
/// Entries live behind an `Arc`, so `clone()` is O(1) and the first write to
/// a clone copies the map. A trie loaded from the database can therefore be
/// mutated freely without touching the stored version.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateTrie {
    entries: Arc<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl StateTrie {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_value(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn set_value(&mut self, key: &[u8], value: Vec<u8>) {
        Arc::make_mut(&mut self.entries).insert(key.to_vec(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether both tries still share one underlying map.
    pub fn shares_storage_with(&self, other: &StateTrie) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Keccak-256 over the entries in key order.
    pub fn root_hash(&self) -> Hash {
        if self.entries.is_empty() {
            return EMPTY_TRIE_ROOT;
        }

        let mut hasher = Keccak256::new();
        for (key, value) in self.entries.iter() {
            hasher.update((key.len() as u32).to_be_bytes());
            hasher.update(key);
            hasher.update((value.len() as u32).to_be_bytes());
            hasher.update(value);
        }
        hasher.finalize().into()
    }

    pub fn get_account_state(&self, address: &Address) -> Result<Option<AccountState>, StateError> {
        match self.get_value(address) {
            Some(bytes) if !bytes.is_empty() => AccountState::deserialize(bytes).map(Some),
            _ => Ok(None),
        }
    }

    pub fn set_account_state(
        &mut self,
        address: &Address,
        state: &AccountState,
    ) -> Result<(), StateError> {
        let bytes = state.serialize()?;
        self.set_value(address, bytes);
        Ok(())
    }
}
