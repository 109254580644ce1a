use thiserror::Error;

/// Errors that can occur during cryptographic operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid hexadecimal string format
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    /// Key or hash has invalid length
    #[error("Invalid length: {len} bytes, expected: {expected} bytes")]
    InvalidLength { len: usize, expected: usize },

    /// Bytes do not encode a point on secp256k1
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid checksum in a legacy address
    #[error("Invalid checksum")]
    InvalidChecksum,
}
