use std::fmt::{Debug, Display, Formatter};

use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};

use super::CryptoError;

pub const PUBLIC_KEY_SIZE: usize = 33;
pub const UNCOMPRESSED_PUBLIC_KEY_SIZE: usize = 65;

/// Compressed secp256k1 public key as carried by operations.
///
/// Signature checks happen upstream; this type is only used to derive
/// owner addresses, so parsing is deferred until an uncompressed form is
/// actually needed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    pub const fn new(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; PUBLIC_KEY_SIZE] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                len: bytes.len(),
                expected: PUBLIC_KEY_SIZE,
            })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Re-encode the key as a 65 bytes uncompressed SEC1 point
    pub fn to_uncompressed(&self) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_SIZE], CryptoError> {
        let point = libsecp256k1::PublicKey::parse_compressed(&self.0)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(point.serialize())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        let bytes = hex::decode(hex).map_err(SerdeError::custom)?;
        PublicKey::from_slice(&bytes).map_err(SerdeError::custom)
    }
}
