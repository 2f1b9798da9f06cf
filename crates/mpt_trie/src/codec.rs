//! Key and value codecs mapping application types to trie bytes.

use crate::{MptError, MptResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Converts values of `T` to and from the raw bytes stored in the trie.
/// Encoding failures surface as [`MptError::Codec`] before the trie changes.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> MptResult<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> MptResult<T>;
}

/// Pass-through codec for raw byte keys and values.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl Codec<Vec<u8>> for IdentityCodec {
    fn encode(&self, value: &Vec<u8>) -> MptResult<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> MptResult<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// UTF-8 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec<String> for StringCodec {
    fn encode(&self, value: &String) -> MptResult<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> MptResult<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| MptError::Codec(e.to_string()))
    }
}

/// Big-endian integers without leading zero bytes. Zero encodes as the
/// empty string, which the trie treats as "no value".
#[derive(Debug, Clone, Copy, Default)]
pub struct U64Codec;

impl Codec<u64> for U64Codec {
    fn encode(&self, value: &u64) -> MptResult<Vec<u8>> {
        let bytes = value.to_be_bytes();
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Ok(bytes[start..].to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> MptResult<u64> {
        if bytes.len() > 8 {
            return Err(MptError::Codec(format!(
                "{} bytes do not fit in a u64",
                bytes.len()
            )));
        }
        if bytes.first() == Some(&0) {
            return Err(MptError::Codec("non-minimal integer encoding".to_string()));
        }
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }
}

/// Any serde type, encoded with `bincode`.
pub struct BincodeCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BincodeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BincodeCodec")
    }
}

impl<T: Serialize + DeserializeOwned> Codec<T> for BincodeCodec<T> {
    fn encode(&self, value: &T) -> MptResult<Vec<u8>> {
        bincode::serialize(value).map_err(|e| MptError::Codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> MptResult<T> {
        bincode::deserialize(bytes).map_err(|e| MptError::Codec(e.to_string()))
    }
}

type EncodeFn<T> = Arc<dyn Fn(&T) -> MptResult<Vec<u8>> + Send + Sync>;
type DecodeFn<T> = Arc<dyn Fn(&[u8]) -> MptResult<T> + Send + Sync>;

/// Codec assembled from a pair of closures.
pub struct FnCodec<T> {
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

impl<T> FnCodec<T> {
    pub fn new<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> MptResult<Vec<u8>> + Send + Sync + 'static,
        D: Fn(&[u8]) -> MptResult<T> + Send + Sync + 'static,
    {
        Self {
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }
}

impl<T> Clone for FnCodec<T> {
    fn clone(&self) -> Self {
        Self {
            encode: Arc::clone(&self.encode),
            decode: Arc::clone(&self.decode),
        }
    }
}

impl<T> fmt::Debug for FnCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCodec")
    }
}

impl<T> Codec<T> for FnCodec<T> {
    fn encode(&self, value: &T) -> MptResult<Vec<u8>> {
        (self.encode)(value)
    }

    fn decode(&self, bytes: &[u8]) -> MptResult<T> {
        (self.decode)(bytes)
    }
}
