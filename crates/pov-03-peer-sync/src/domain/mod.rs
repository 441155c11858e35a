pub mod errors;
pub mod peer;
pub mod peer_table;
pub mod progress;

pub use errors::*;
pub use peer::*;
pub use peer_table::*;
pub use progress::*;
