pub mod blockchain;
pub mod dedup;
pub mod error;
pub mod evaluator;
pub mod hard_fork;
pub mod state;
pub mod storage;
