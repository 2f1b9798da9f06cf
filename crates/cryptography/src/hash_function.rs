use crate::hash_algorithm::HashAlgorithm;
use std::fmt;
use std::sync::Arc;

type DigestFn = dyn Fn(&[u8]) -> Vec<u8> + Send + Sync;

/// A pluggable `bytes -> bytes` hash function with a fixed output length.
///
/// The output length is measured once at construction by hashing the empty
/// input. Cloning is cheap and shares the underlying function.
#[derive(Clone)]
pub struct HashFunction {
    name: Arc<str>,
    digest: Arc<DigestFn>,
    output_size: usize,
}

impl HashFunction {
    /// Wraps an arbitrary digest function.
    pub fn new<F>(name: impl Into<String>, digest: F) -> Self
    where
        F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static,
    {
        let output_size = digest(&[]).len();
        Self {
            name: Arc::from(name.into()),
            digest: Arc::new(digest),
            output_size,
        }
    }

    /// Hashes `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        (self.digest)(data)
    }

    /// Length in bytes of every digest this function produces.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<HashAlgorithm> for HashFunction {
    fn from(algorithm: HashAlgorithm) -> Self {
        HashFunction::new(algorithm.name(), move |data| algorithm.digest(data))
    }
}

impl Default for HashFunction {
    fn default() -> Self {
        HashAlgorithm::Keccak256.into()
    }
}

impl fmt::Debug for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashFunction")
            .field("name", &self.name)
            .field("output_size", &self.output_size)
            .finish()
    }
}
