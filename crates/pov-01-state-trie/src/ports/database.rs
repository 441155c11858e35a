use crate::domain::{StateError, StateTrie};
use shared_types::Hash;

/// Trie database abstraction.
///
/// Tries are stored whole and addressed by their root hash. Storing the
/// same root twice is a no-op.
pub trait TrieDatabase: Send + Sync {
    fn get_trie(&self, root: &Hash) -> Result<Option<StateTrie>, StateError>;
    fn put_trie(&self, trie: &StateTrie) -> Result<Hash, StateError>;
}
