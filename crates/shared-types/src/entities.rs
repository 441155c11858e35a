//! # Core Domain Entities
//!
//! Defines the chain entities exchanged between the subsystems.
//!
//! ## Clusters
//!
//! - **Ledger**: `StateBlock` (an account-chain transaction)
//! - **Chain**: `PovHeader`, `PovBlock`, `BlockOrigin`
//! - **Networking**: `PeerId`, `SyncState`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};
use std::fmt;

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

/// A 32-byte hash (SHA-256 for blocks and transactions, Keccak-256 for tries).
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 20-byte account address.
pub type Address = [u8; 20];

/// Token amounts and cumulative difficulty are 256-bit unsigned.
pub type Balance = U256;

/// The all-zero hash. Used as "no parent" and "no state".
pub const ZERO_HASH: Hash = [0u8; 32];

/// The all-zero address. An account naming it has no representative.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Token id of the native chain token. Only its balances carry
/// representative weight.
pub const CHAIN_TOKEN: Hash = [
    0xa7, 0xe8, 0xfa, 0x30, 0xc0, 0x63, 0xe9, 0x6a, 0x48, 0x9a, 0x47, 0xde, 0x43, 0xce, 0xc1, 0x4f,
    0x2d, 0x57, 0x12, 0x4f, 0x0c, 0x1a, 0xa1, 0x9c, 0x8e, 0x0c, 0x6b, 0xbb, 0xc3, 0x9c, 0x9b, 0x33,
];

/// Render the first bytes of a hash for log lines.
#[must_use]
pub fn short_hash(hash: &Hash) -> String {
    hex::encode(&hash[..6])
}

/// Unique identifier of a connected peer (transport-assigned).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER A: THE LEDGER
// =============================================================================

/// A committed account-chain transaction.
///
/// Each state block carries the sender's complete post-transaction balances
/// for one token, plus the representative the account delegates to.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBlock {
    /// Token this block moves.
    pub token: Hash,
    /// Account the block belongs to.
    pub address: Address,
    /// Delegated representative (`ZERO_ADDRESS` for none).
    pub representative: Address,
    pub balance: Balance,
    pub vote: Balance,
    pub network: Balance,
    pub storage: Balance,
    pub oracle: Balance,
    /// Previous block of the same account/token chain.
    pub previous: Hash,
    /// Send-block hash for receives, destination for sends.
    pub link: Hash,
    pub timestamp: u64,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl StateBlock {
    /// Compute the transaction hash. The signature is not covered.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.token);
        hasher.update(self.address);
        hasher.update(self.representative);
        for amount in [
            &self.balance,
            &self.vote,
            &self.network,
            &self.storage,
            &self.oracle,
        ] {
            let mut bytes = [0u8; 32];
            amount.to_big_endian(&mut bytes);
            hasher.update(bytes);
        }
        hasher.update(self.previous);
        hasher.update(self.link);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.finalize().into()
    }

    /// Sum of every balance category held by the account after this block.
    #[must_use]
    pub fn total_balance(&self) -> Balance {
        self.balance
            .saturating_add(self.vote)
            .saturating_add(self.network)
            .saturating_add(self.storage)
            .saturating_add(self.oracle)
    }

    /// Whether this block moves the native chain token.
    #[must_use]
    pub fn is_chain_token(&self) -> bool {
        self.token == CHAIN_TOKEN
    }
}

impl Default for StateBlock {
    fn default() -> Self {
        Self {
            token: CHAIN_TOKEN,
            address: ZERO_ADDRESS,
            representative: ZERO_ADDRESS,
            balance: Balance::zero(),
            vote: Balance::zero(),
            network: Balance::zero(),
            storage: Balance::zero(),
            oracle: Balance::zero(),
            previous: ZERO_HASH,
            link: ZERO_HASH,
            timestamp: 0,
            signature: [0u8; 64],
        }
    }
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Header of a proof-of-work block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PovHeader {
    /// Protocol version for this block.
    pub version: u32,
    /// Hash of the parent block (creates the chain linkage).
    pub previous: Hash,
    /// Block height in the chain.
    pub height: u64,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Merkle root of the transaction hashes.
    pub merkle_root: Hash,
    /// Root of the account-state trie after applying this block.
    pub state_hash: Hash,
    /// Proof-of-work target; a valid block hash is numerically `<= target`.
    pub target: U256,
    pub nonce: u64,
    /// Miner reward address.
    pub coinbase: Address,
}

impl PovHeader {
    /// Compute the block hash over every header field.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.previous);
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.merkle_root);
        hasher.update(self.state_hash);
        let mut target = [0u8; 32];
        self.target.to_big_endian(&mut target);
        hasher.update(target);
        hasher.update(self.nonce.to_le_bytes());
        hasher.update(self.coinbase);
        hasher.finalize().into()
    }

    /// Expected number of hashes to meet the target: `2^256 / (target + 1)`.
    #[must_use]
    pub fn work(&self) -> U256 {
        match self.target.checked_add(U256::one()) {
            Some(divisor) => (!self.target / divisor) + U256::one(),
            None => U256::one(),
        }
    }
}

impl Default for PovHeader {
    fn default() -> Self {
        Self {
            version: 1,
            previous: ZERO_HASH,
            height: 0,
            timestamp: 0,
            merkle_root: ZERO_HASH,
            state_hash: ZERO_HASH,
            target: U256::MAX,
            nonce: 0,
            coinbase: ZERO_ADDRESS,
        }
    }
}

/// A proof-of-work block: header plus the ordered transaction hashes it
/// commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PovBlock {
    pub header: PovHeader,
    /// Ledger transactions in proposer order.
    pub tx_hashes: Vec<Hash>,
}

impl PovBlock {
    #[must_use]
    pub fn new(header: PovHeader, tx_hashes: Vec<Hash>) -> Self {
        Self { header, tx_hashes }
    }

    #[must_use]
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    #[must_use]
    pub fn height(&self) -> u64 {
        self.header.height
    }

    #[must_use]
    pub fn previous(&self) -> Hash {
        self.header.previous
    }

    #[must_use]
    pub fn state_hash(&self) -> Hash {
        self.header.state_hash
    }

    /// Serialized size in bytes, used to bound bulk-pull responses.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        bincode::serialized_size(self)
            .map(|size| size as usize)
            .unwrap_or(usize::MAX)
    }
}

/// Binary SHA-256 merkle root over transaction hashes. An odd node is paired
/// with itself; an empty list yields `ZERO_HASH`.
#[must_use]
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return ZERO_HASH;
    }
    let mut level: Vec<Hash> = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                let mut hasher = Sha256::new();
                hasher.update(pair[0]);
                hasher.update(right);
                hasher.finalize().into()
            })
            .collect();
    }
    level[0]
}

/// Where a block entered the node from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockOrigin {
    /// Produced by the local miner.
    LocalMined,
    /// Gossiped by a peer.
    RemoteBroadcast,
    /// Pulled from a peer by the syncer.
    RemoteSyncFetch,
}

// =============================================================================
// CLUSTER C: NETWORKING
// =============================================================================

/// Node-level synchronization progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SyncState {
    #[default]
    NotStarted,
    Syncing,
    Done,
    Err,
}

impl SyncState {
    /// `Done` and `Err` end the sync loop.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Err)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "NotStarted",
            Self::Syncing => "Syncing",
            Self::Done => "Done",
            Self::Err => "Err",
        };
        f.write_str(name)
    }
}
