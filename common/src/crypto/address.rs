// Owner addresses
//
// A balance owner is a 20 bytes digest. Current keys hash their compressed
// encoding into it; balances imported from legacy chains were recorded
// against a PTS style address, which is hashed once more to land in the
// same 20 bytes space.

use std::fmt::{Debug, Display, Formatter};

use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use super::{CryptoError, PublicKey};
use crate::config::ADDRESS_PREFIX;

pub const ADDRESS_SIZE: usize = 20;
pub const PTS_ADDRESS_SIZE: usize = 25;

// Version bytes of the two legacy networks whose balances were imported
pub const PTS_VERSION_PTS: u8 = 56;
pub const PTS_VERSION_BTC: u8 = 0;

fn ripemd160(data: &[u8]) -> [u8; ADDRESS_SIZE] {
    let mut out = [0u8; ADDRESS_SIZE];
    out.copy_from_slice(&Ripemd160::digest(data));
    out
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(key: &PublicKey) -> Self {
        Self(ripemd160(&Sha512::digest(key.as_bytes())))
    }

    pub fn from_pts(address: &PtsAddress) -> Self {
        Self(ripemd160(&Sha512::digest(address.as_bytes())))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Every address a key may own a balance under: its current address
    /// followed by the four legacy encodings (uncompressed/compressed, for
    /// both legacy network versions).
    ///
    /// An unparsable key cannot be re-encoded uncompressed; those two
    /// candidates are skipped and the compressed ones are still produced.
    pub fn owner_candidates(key: &PublicKey) -> Vec<Address> {
        let mut candidates = Vec::with_capacity(5);
        candidates.push(Address::from_public_key(key));
        for version in [PTS_VERSION_PTS, PTS_VERSION_BTC] {
            for compressed in [false, true] {
                match PtsAddress::from_public_key(key, compressed, version) {
                    Ok(pts) => candidates.push(Address::from_pts(&pts)),
                    Err(e) => log::trace!("skipping legacy encoding for {}: {}", key, e),
                }
            }
        }
        candidates
    }
}

impl From<&PublicKey> for Address {
    fn from(key: &PublicKey) -> Self {
        Address::from_public_key(key)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", ADDRESS_PREFIX, hex::encode(self.0))
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// Legacy address: version byte, RIPEMD-160 of the SHA-256 of the key,
/// then the first four bytes of a double SHA-256 over the previous 21 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PtsAddress([u8; PTS_ADDRESS_SIZE]);

impl PtsAddress {
    pub fn from_public_key(
        key: &PublicKey,
        compressed: bool,
        version: u8,
    ) -> Result<Self, CryptoError> {
        let digest = if compressed {
            Sha256::digest(key.as_bytes())
        } else {
            Sha256::digest(key.to_uncompressed()?)
        };

        let mut data = [0u8; PTS_ADDRESS_SIZE];
        data[0] = version;
        data[1..21].copy_from_slice(&ripemd160(&digest));
        let check = Sha256::digest(Sha256::digest(&data[..21]));
        data[21..].copy_from_slice(&check[..4]);
        Ok(Self(data))
    }

    pub fn from_bytes(bytes: [u8; PTS_ADDRESS_SIZE]) -> Result<Self, CryptoError> {
        let address = Self(bytes);
        if !address.is_valid() {
            return Err(CryptoError::InvalidChecksum);
        }
        Ok(address)
    }

    pub fn version(&self) -> u8 {
        self.0[0]
    }

    pub fn is_valid(&self) -> bool {
        let check = Sha256::digest(Sha256::digest(&self.0[..21]));
        check[..4] == self.0[21..]
    }

    pub fn as_bytes(&self) -> &[u8; PTS_ADDRESS_SIZE] {
        &self.0
    }
}

impl Debug for PtsAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PtsAddress({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> PublicKey {
        let secret = libsecp256k1::SecretKey::parse(&[7u8; 32]).unwrap();
        let public = libsecp256k1::PublicKey::from_secret_key(&secret);
        PublicKey::new(public.serialize_compressed())
    }

    #[test]
    fn test_pts_checksum_is_valid() {
        let key = test_key();
        for version in [PTS_VERSION_PTS, PTS_VERSION_BTC] {
            for compressed in [false, true] {
                let pts = PtsAddress::from_public_key(&key, compressed, version).unwrap();
                assert!(pts.is_valid());
                assert_eq!(pts.version(), version);
            }
        }
    }

    #[test]
    fn test_pts_from_bytes_rejects_bad_checksum() {
        let pts = PtsAddress::from_public_key(&test_key(), true, PTS_VERSION_PTS).unwrap();
        let mut bytes = *pts.as_bytes();
        bytes[24] ^= 0xff;
        assert_eq!(PtsAddress::from_bytes(bytes), Err(CryptoError::InvalidChecksum));
    }

    #[test]
    fn test_owner_candidates_are_distinct() {
        let candidates = Address::owner_candidates(&test_key());
        assert_eq!(candidates.len(), 5);
        for (i, a) in candidates.iter().enumerate() {
            for b in candidates.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_invalid_point_keeps_compressed_candidates() {
        // 0x02 prefix followed by an x coordinate above the field prime
        let key = PublicKey::new([0xff; 33]);
        assert!(key.to_uncompressed().is_err());
        assert_eq!(Address::owner_candidates(&key).len(), 3);
    }
}
