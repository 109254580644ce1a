mod block_index;

pub use block_index::{BlockStore, IndexEntry, INDEX_ENTRY_SIZE};
