use super::errors::StateError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Balance, Hash, StateBlock, CHAIN_TOKEN};

/// Root hash of a trie with no entries.
///
/// Value: keccak256(RLP("")) = 0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421
pub const EMPTY_TRIE_ROOT: Hash = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
];

/// Per-token bookkeeping inside an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub token: Hash,
    pub representative: Address,
    pub balance: Balance,
}

/// Weight delegated to a representative, or the weight one account
/// contributes to it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentativeState {
    pub balance: Balance,
    pub vote: Balance,
    pub network: Balance,
    pub storage: Balance,
    pub oracle: Balance,
    pub total: Balance,
}

impl RepresentativeState {
    /// Weight carried by an account's chain-token shortcuts.
    #[must_use]
    pub fn contribution_of(account: &AccountState) -> Self {
        Self {
            balance: account.balance,
            vote: account.vote,
            network: account.network,
            storage: account.storage,
            oracle: account.oracle,
            total: account.total_balance(),
        }
    }

    /// Weight carried by a chain-token state block.
    #[must_use]
    pub fn contribution_from_block(block: &StateBlock) -> Self {
        Self {
            balance: block.balance,
            vote: block.vote,
            network: block.network,
            storage: block.storage,
            oracle: block.oracle,
            total: block.total_balance(),
        }
    }

    pub fn checked_add(&self, other: &Self, rep: &Address) -> Result<Self, StateError> {
        let add = |a: Balance, b: Balance, field: &'static str| {
            a.checked_add(b).ok_or(StateError::BalanceOverflow {
                address: *rep,
                field,
            })
        };
        Ok(Self {
            balance: add(self.balance, other.balance, "balance")?,
            vote: add(self.vote, other.vote, "vote")?,
            network: add(self.network, other.network, "network")?,
            storage: add(self.storage, other.storage, "storage")?,
            oracle: add(self.oracle, other.oracle, "oracle")?,
            total: add(self.total, other.total, "total")?,
        })
    }

    pub fn checked_sub(&self, other: &Self, rep: &Address) -> Result<Self, StateError> {
        let sub = |a: Balance, b: Balance, field: &'static str| {
            a.checked_sub(b).ok_or(StateError::BalanceUnderflow {
                address: *rep,
                field,
            })
        };
        Ok(Self {
            balance: sub(self.balance, other.balance, "balance")?,
            vote: sub(self.vote, other.vote, "vote")?,
            network: sub(self.network, other.network, "network")?,
            storage: sub(self.storage, other.storage, "storage")?,
            oracle: sub(self.oracle, other.oracle, "oracle")?,
            total: sub(self.total, other.total, "total")?,
        })
    }
}

/// Account snapshot stored in the state trie under the address bytes.
///
/// The `balance`..`oracle` fields mirror the chain-token totals so the
/// representative update does not need to search `token_states`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Hash of the last state block applied to this account.
    pub hash: Hash,
    pub balance: Balance,
    pub vote: Balance,
    pub network: Balance,
    pub storage: Balance,
    pub oracle: Balance,
    pub token_states: Vec<TokenState>,
    /// Present once any account has delegated to this address.
    pub rep_state: Option<RepresentativeState>,
}

impl AccountState {
    #[must_use]
    pub fn token_state(&self, token: &Hash) -> Option<&TokenState> {
        self.token_states.iter().find(|ts| ts.token == *token)
    }

    #[must_use]
    pub fn chain_token_state(&self) -> Option<&TokenState> {
        self.token_state(&CHAIN_TOKEN)
    }

    #[must_use]
    pub fn total_balance(&self) -> Balance {
        self.balance
            .saturating_add(self.vote)
            .saturating_add(self.network)
            .saturating_add(self.storage)
            .saturating_add(self.oracle)
    }

    /// Record `block` as the account's latest state for its token.
    pub fn apply_block(&mut self, block: &StateBlock, block_hash: Hash) {
        self.hash = block_hash;

        if block.is_chain_token() {
            self.balance = block.balance;
            self.vote = block.vote;
            self.network = block.network;
            self.storage = block.storage;
            self.oracle = block.oracle;
        }

        match self
            .token_states
            .iter_mut()
            .find(|ts| ts.token == block.token)
        {
            Some(existing) => {
                existing.representative = block.representative;
                existing.balance = block.balance;
            }
            None => self.token_states.push(TokenState {
                token: block.token,
                representative: block.representative,
                balance: block.balance,
            }),
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, StateError> {
        bincode::serialize(self).map_err(|e| StateError::SerializationError(e.to_string()))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, StateError> {
        bincode::deserialize(bytes).map_err(|e| StateError::SerializationError(e.to_string()))
    }
}
