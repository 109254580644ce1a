mod address;
mod hash;
mod key;

pub mod error;

pub use address::*;
pub use error::CryptoError;
pub use hash::*;
pub use key::*;
