//! Hash algorithm enum.
//!
//! This module names the digests a trie can be configured with.

use crate::hash;
use mpt_config::HASH_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hash algorithms available for node addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum HashAlgorithm {
    /// The Keccak256 hash algorithm
    #[default]
    Keccak256 = 0x00,

    /// The FIPS-202 SHA3-256 hash algorithm
    Sha3_256 = 0x01,

    /// The SHA256 hash algorithm
    Sha256 = 0x02,

    /// The BLAKE3 hash algorithm
    Blake3 = 0x03,
}

impl HashAlgorithm {
    /// All supported algorithms.
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Keccak256,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Sha256,
        HashAlgorithm::Blake3,
    ];

    /// Returns the size of the hash in bytes.
    pub fn size(&self) -> usize {
        HASH_SIZE
    }

    /// Returns the name of the hash algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Keccak256 => "KECCAK256",
            HashAlgorithm::Sha3_256 => "SHA3-256",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Blake3 => "BLAKE3",
        }
    }

    /// Hashes `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Keccak256 => hash::keccak256(data).to_vec(),
            HashAlgorithm::Sha3_256 => hash::sha3_256(data).to_vec(),
            HashAlgorithm::Sha256 => hash::sha256(data).to_vec(),
            HashAlgorithm::Blake3 => hash::blake3(data).to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error type for hash algorithm parsing.
#[derive(Debug, thiserror::Error)]
#[error("Unknown hash algorithm: {0}")]
pub struct UnknownHashAlgorithm(String);

impl FromStr for HashAlgorithm {
    type Err = UnknownHashAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('_', "-").as_str() {
            "KECCAK256" | "KECCAK-256" => Ok(HashAlgorithm::Keccak256),
            "SHA3-256" | "SHA3" => Ok(HashAlgorithm::Sha3_256),
            "SHA256" | "SHA-256" => Ok(HashAlgorithm::Sha256),
            "BLAKE3" => Ok(HashAlgorithm::Blake3),
            _ => Err(UnknownHashAlgorithm(s.to_string())),
        }
    }
}
