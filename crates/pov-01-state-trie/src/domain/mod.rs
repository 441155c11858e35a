pub mod entities;
pub mod errors;
pub mod trie;

pub use entities::*;
pub use errors::*;
pub use trie::*;
