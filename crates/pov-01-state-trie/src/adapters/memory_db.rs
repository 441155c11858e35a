use crate::domain::{StateError, StateTrie, EMPTY_TRIE_ROOT};
use crate::ports::TrieDatabase;
use shared_types::Hash;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory implementation of TrieDatabase.
///
/// Stored tries share their entry maps with the caller's copy, so keeping
/// every version costs one map per distinct state.
pub struct InMemoryTrieDb {
    tries: RwLock<HashMap<Hash, StateTrie>>,
}

impl InMemoryTrieDb {
    pub fn new() -> Self {
        let mut tries = HashMap::new();
        tries.insert(EMPTY_TRIE_ROOT, StateTrie::new());
        Self {
            tries: RwLock::new(tries),
        }
    }

    pub fn len(&self) -> usize {
        self.tries.read().map(|tries| tries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryTrieDb {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieDatabase for InMemoryTrieDb {
    fn get_trie(&self, root: &Hash) -> Result<Option<StateTrie>, StateError> {
        let tries = self.tries.read().map_err(|_| StateError::LockPoisoned)?;
        Ok(tries.get(root).cloned())
    }

    fn put_trie(&self, trie: &StateTrie) -> Result<Hash, StateError> {
        let root = trie.root_hash();
        let mut tries = self.tries.write().map_err(|_| StateError::LockPoisoned)?;
        tries.entry(root).or_insert_with(|| trie.clone());
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_root_always_present() {
        let db = InMemoryTrieDb::new();
        let trie = db.get_trie(&EMPTY_TRIE_ROOT).unwrap().unwrap();
        assert!(trie.is_empty());
    }

    #[test]
    fn test_put_then_get() {
        let db = InMemoryTrieDb::new();
        let mut trie = StateTrie::new();
        trie.set_value(b"key", vec![1, 2, 3]);

        let root = db.put_trie(&trie).unwrap();
        assert_eq!(root, trie.root_hash());
        assert_eq!(db.get_trie(&root).unwrap(), Some(trie));
        assert_eq!(db.len(), 2);

        // Idempotent
        db.put_trie(&db.get_trie(&root).unwrap().unwrap()).unwrap();
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn test_unknown_root() {
        let db = InMemoryTrieDb::new();
        assert!(db.get_trie(&[1u8; 32]).unwrap().is_none());
    }
}
