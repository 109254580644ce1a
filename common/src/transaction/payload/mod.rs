mod assert;
mod asset;
mod balance;
mod transfer;

pub use assert::*;
pub use asset::*;
pub use balance::*;
pub use transfer::*;
