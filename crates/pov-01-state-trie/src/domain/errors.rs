use shared_types::{Address, Hash};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Unknown state root {}", hex::encode(root))]
    UnknownStateRoot { root: Hash },

    #[error("Representative {} has no representative state", hex::encode(address))]
    MissingRepresentativeState { address: Address },

    #[error("Representative {} weight underflow in {field}", hex::encode(address))]
    BalanceUnderflow { address: Address, field: &'static str },

    #[error("Representative {} weight overflow in {field}", hex::encode(address))]
    BalanceOverflow { address: Address, field: &'static str },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Trie database lock poisoned")]
    LockPoisoned,
}
