mod block;
mod header;

pub use block::*;
pub use header::*;
