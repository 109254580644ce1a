use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::{BlockHeader, BlockId};
use crate::{
    crypto::{hash, Hash, Hashable},
    transaction::Transaction,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    header: BlockHeader,
    transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    pub fn get_header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get_txs_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn id(&self) -> Result<BlockId, bincode::Error> {
        self.header.id()
    }

    // Merkle root of the transactions ids, odd leaves are paired with themselves
    pub fn compute_merkle_root(transactions: &[Transaction]) -> Result<Hash, bincode::Error> {
        if transactions.is_empty() {
            return Ok(Hash::zero());
        }

        let mut layer = transactions
            .iter()
            .map(|tx| tx.hash())
            .collect::<Result<Vec<_>, _>>()?;

        while layer.len() > 1 {
            layer = layer
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).unwrap_or(&pair[0]);
                    let mut bytes = [0u8; 64];
                    bytes[..32].copy_from_slice(pair[0].as_bytes());
                    bytes[32..].copy_from_slice(right.as_bytes());
                    hash(&bytes)
                })
                .collect();
        }
        Ok(layer[0])
    }

    pub fn split(self) -> (BlockHeader, Vec<Transaction>) {
        (self.header, self.transactions)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

impl Deref for Block {
    type Target = BlockHeader;

    fn deref(&self) -> &Self::Target {
        &self.header
    }
}
