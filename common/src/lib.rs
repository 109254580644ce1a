pub mod account;
pub mod asset;
pub mod block;
pub mod config;
pub mod crypto;
pub mod network;
pub mod object;
pub mod parameters;
pub mod time;
pub mod transaction;
