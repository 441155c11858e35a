pub mod error;
pub mod orphan;
pub mod outcome;
pub mod pending;
pub mod source;

pub use error::*;
pub use orphan::*;
pub use outcome::*;
pub use pending::*;
pub use source::*;
