// Block store
//
// Two flat files in one directory. `blocks` is an append only log of
// serialized blocks. `index` holds one fixed size record per block number,
// at offset `INDEX_ENTRY_SIZE * num`:
//
//   block_id [u8; 20] | offset u64 LE | size u32 LE
//
// A record with size 0 is a tombstone. Its id and offset are left as they
// were, and the log bytes are never reclaimed by this store.

use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};
use meridian_common::block::{Block, BlockId, BLOCK_ID_SIZE};

use crate::{
    config::{BLOCK_INDEX_FILE_NAME, BLOCK_LOG_FILE_NAME},
    core::error::BlockchainError,
};

pub const INDEX_ENTRY_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub block_id: BlockId,
    // Position of the block in the log
    pub offset: u64,
    // Serialized size, 0 once removed
    pub size: u32,
}

impl IndexEntry {
    pub fn is_tombstone(&self) -> bool {
        self.size == 0
    }

    pub fn to_bytes(&self) -> [u8; INDEX_ENTRY_SIZE] {
        let mut bytes = [0u8; INDEX_ENTRY_SIZE];
        bytes[..BLOCK_ID_SIZE].copy_from_slice(self.block_id.as_bytes());
        bytes[20..28].copy_from_slice(&self.offset.to_le_bytes());
        bytes[28..32].copy_from_slice(&self.size.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; INDEX_ENTRY_SIZE]) -> Self {
        let mut id = [0u8; BLOCK_ID_SIZE];
        id.copy_from_slice(&bytes[..BLOCK_ID_SIZE]);
        let mut offset = [0u8; 8];
        offset.copy_from_slice(&bytes[20..28]);
        let mut size = [0u8; 4];
        size.copy_from_slice(&bytes[28..32]);
        Self {
            block_id: BlockId::new(id),
            offset: u64::from_le_bytes(offset),
            size: u32::from_le_bytes(size),
        }
    }
}

#[inline]
fn index_position(num: u32) -> u64 {
    INDEX_ENTRY_SIZE as u64 * num as u64
}

struct Files {
    index: File,
    blocks: File,
}

/// Blocks addressed by number, with O(1) lookup and append
pub struct BlockStore {
    dir: PathBuf,
    files: Option<Files>,
}

impl BlockStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, BlockchainError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let open = |name: &str| {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(dir.join(name))
        };
        let files = Files {
            index: open(BLOCK_INDEX_FILE_NAME)?,
            blocks: open(BLOCK_LOG_FILE_NAME)?,
        };
        let index_len = files.index.metadata()?.len();
        if index_len % INDEX_ENTRY_SIZE as u64 != 0 {
            warn!(
                "block index in {} has a partial trailing record ({} bytes)",
                dir.display(),
                index_len
            );
        }
        debug!("opened block store in {}", dir.display());

        Ok(Self {
            dir,
            files: Some(files),
        })
    }

    pub fn is_open(&self) -> bool {
        self.files.is_some()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn close(&mut self) -> Result<(), BlockchainError> {
        if let Some(mut files) = self.files.take() {
            files.index.flush()?;
            files.blocks.flush()?;
            debug!("closed block store in {}", self.dir.display());
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), BlockchainError> {
        let files = self.files_mut()?;
        files.blocks.sync_data()?;
        files.index.sync_data()?;
        Ok(())
    }

    fn files_mut(&mut self) -> Result<&mut Files, BlockchainError> {
        self.files.as_mut().ok_or(BlockchainError::BlockStoreClosed)
    }

    fn index_len(&mut self) -> Result<u64, BlockchainError> {
        Ok(self.files_mut()?.index.metadata()?.len())
    }

    /// Append `block` to the log and point the record of its number at it
    pub fn store(&mut self, id: &BlockId, block: &Block) -> Result<IndexEntry, BlockchainError> {
        let bytes = block.to_bytes()?;
        let size = u32::try_from(bytes.len())
            .map_err(|_| BlockchainError::Serialization("block too large".to_string()))?;

        let files = self.files_mut()?;
        let offset = files.blocks.seek(SeekFrom::End(0))?;
        files.blocks.write_all(&bytes)?;

        let entry = IndexEntry {
            block_id: *id,
            offset,
            size,
        };
        files.index.seek(SeekFrom::Start(index_position(id.num())))?;
        files.index.write_all(&entry.to_bytes())?;

        if log::log_enabled!(log::Level::Trace) {
            trace!("stored block {} at offset {} ({} bytes)", id, offset, size);
        }
        Ok(entry)
    }

    /// Record of block number `num`, `None` past the end of the index
    pub fn read_entry(&mut self, num: u32) -> Result<Option<IndexEntry>, BlockchainError> {
        let position = index_position(num);
        if self.index_len()? < position + INDEX_ENTRY_SIZE as u64 {
            return Ok(None);
        }
        let files = self.files_mut()?;
        files.index.seek(SeekFrom::Start(position))?;
        let mut bytes = [0u8; INDEX_ENTRY_SIZE];
        files.index.read_exact(&mut bytes)?;
        Ok(Some(IndexEntry::from_bytes(&bytes)))
    }

    /// Tombstone the record of `id`. A record holding another id is left
    /// untouched.
    pub fn remove(&mut self, id: &BlockId) -> Result<(), BlockchainError> {
        let Some(mut entry) = self.read_entry(id.num())? else {
            return Err(BlockchainError::BlockNotFound(*id));
        };
        if entry.block_id != *id {
            trace!("block {} was already replaced in the index", id);
            return Ok(());
        }

        entry.size = 0;
        let files = self.files_mut()?;
        files.index.seek(SeekFrom::Start(index_position(id.num())))?;
        files.index.write_all(&entry.to_bytes())?;
        debug!("removed block {} from the index", id);
        Ok(())
    }

    pub fn contains(&mut self, id: &BlockId) -> Result<bool, BlockchainError> {
        if *id == BlockId::zero() {
            return Ok(false);
        }
        Ok(self
            .read_entry(id.num())?
            .is_some_and(|entry| entry.block_id == *id && !entry.is_tombstone()))
    }

    pub fn fetch_block_id(&mut self, num: u32) -> Result<BlockId, BlockchainError> {
        match self.read_entry(num)? {
            Some(entry) if entry.block_id != BlockId::zero() => Ok(entry.block_id),
            _ => Err(BlockchainError::BlockNotFound(BlockId::from_digest(num, &[]))),
        }
    }

    fn read_block(&mut self, entry: &IndexEntry) -> Result<Block, BlockchainError> {
        let files = self.files_mut()?;
        files.blocks.seek(SeekFrom::Start(entry.offset))?;
        let mut bytes = vec![0u8; entry.size as usize];
        files.blocks.read_exact(&mut bytes)?;
        let block = Block::from_bytes(&bytes)?;

        let id = block.id()?;
        if id != entry.block_id {
            return Err(BlockchainError::CorruptedIndex(format!(
                "record of block {} points to block {}",
                entry.block_id, id
            )));
        }
        Ok(block)
    }

    pub fn fetch_optional(&mut self, id: &BlockId) -> Result<Option<Block>, BlockchainError> {
        match self.read_entry(id.num())? {
            Some(entry) if entry.block_id == *id && !entry.is_tombstone() => {
                self.read_block(&entry).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn fetch_by_number(&mut self, num: u32) -> Result<Option<Block>, BlockchainError> {
        match self.read_entry(num)? {
            Some(entry) if !entry.is_tombstone() => self.read_block(&entry).map(Some),
            _ => Ok(None),
        }
    }

    // Highest record that was not removed
    fn last_entry(&mut self) -> Result<Option<IndexEntry>, BlockchainError> {
        let count = self.index_len()? / INDEX_ENTRY_SIZE as u64;
        for num in (0..count).rev() {
            let Ok(num) = u32::try_from(num) else {
                continue;
            };
            if let Some(entry) = self.read_entry(num)? {
                if !entry.is_tombstone() {
                    return Ok(Some(entry));
                }
            }
        }
        Ok(None)
    }

    pub fn last(&mut self) -> Result<Option<Block>, BlockchainError> {
        match self.last_entry()? {
            Some(entry) => self.read_block(&entry).map(Some),
            None => Ok(None),
        }
    }

    pub fn last_id(&mut self) -> Result<Option<BlockId>, BlockchainError> {
        Ok(self.last_entry()?.map(|entry| entry.block_id))
    }
}

impl Drop for BlockStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("error while closing block store: {}", e);
        }
    }
}
