//! Hash functions for trie node addressing.
//!
//! Every function here returns a 32-byte digest.

use mpt_config::HASH_SIZE;
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data.
pub fn sha256(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes Keccak-256 hash of the input data.
/// This is the pre-standard variant used by Ethereum state tries.
pub fn keccak256(data: &[u8]) -> [u8; HASH_SIZE] {
    use sha3::Keccak256;
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes FIPS-202 SHA3-256 hash of the input data.
pub fn sha3_256(data: &[u8]) -> [u8; HASH_SIZE] {
    use sha3::Sha3_256;
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes BLAKE3 hash of the input data.
pub fn blake3(data: &[u8]) -> [u8; HASH_SIZE] {
    *::blake3::hash(data).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_digests() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex::encode(sha3_256(b"")),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
        assert_eq!(
            hex::encode(blake3(b"")),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_keccak_of_empty_rlp_string() {
        // Canonical empty trie root
        assert_eq!(
            hex::encode(keccak256(&[0x80])),
            "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
        );
    }

    #[test]
    fn test_keccak_differs_from_sha3() {
        assert_ne!(keccak256(b"abc"), sha3_256(b"abc"));
    }
}
