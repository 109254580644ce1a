// Block identifiers and headers
//
// A block id is a 20 bytes digest of the header whose first four bytes are
// overwritten with the big endian block number, so the number can be read
// back from the id alone.

use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    crypto::{CryptoError, Hash},
    object::AccountId,
    time::TimestampSeconds,
};

pub const BLOCK_ID_SIZE: usize = 20;

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, std::hash::Hash)]
pub struct BlockId([u8; BLOCK_ID_SIZE]);

impl BlockId {
    pub const fn new(bytes: [u8; BLOCK_ID_SIZE]) -> Self {
        Self(bytes)
    }

    pub const fn zero() -> Self {
        Self([0u8; BLOCK_ID_SIZE])
    }

    // Build an id carrying `num` in its prefix, the rest taken from `digest`
    pub fn from_digest(num: u32, digest: &[u8]) -> Self {
        let mut bytes = [0u8; BLOCK_ID_SIZE];
        let len = digest.len().min(BLOCK_ID_SIZE);
        bytes[..len].copy_from_slice(&digest[..len]);
        bytes[..4].copy_from_slice(&num.to_be_bytes());
        Self(bytes)
    }

    /// Block number encoded in the id
    pub fn num(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_ID_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for BlockId {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        let bytes: [u8; BLOCK_ID_SIZE] =
            bytes
                .try_into()
                .map_err(|v: Vec<u8>| CryptoError::InvalidLength {
                    len: v.len(),
                    expected: BLOCK_ID_SIZE,
                })?;
        Ok(Self(bytes))
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockId({})", self.to_hex())
    }
}

impl Serialize for BlockId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'a> Deserialize<'a> for BlockId {
    fn deserialize<D: serde::Deserializer<'a>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let hex = String::deserialize(deserializer)?;
            BlockId::from_str(&hex).map_err(serde::de::Error::custom)
        } else {
            Ok(Self(<[u8; BLOCK_ID_SIZE]>::deserialize(deserializer)?))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    // Id of the parent block, zero for the first block
    pub previous: BlockId,
    pub timestamp: TimestampSeconds,
    // Witness that produced the block
    pub witness: AccountId,
    pub transaction_merkle_root: Hash,
}

impl BlockHeader {
    pub fn num(&self) -> u32 {
        self.previous.num() + 1
    }

    pub fn id(&self) -> Result<BlockId, bincode::Error> {
        let bytes = bincode::serialize(self)?;
        let digest = Ripemd160::digest(Sha256::digest(&bytes));
        Ok(BlockId::from_digest(self.num(), &digest))
    }
}
