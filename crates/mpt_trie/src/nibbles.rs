//! Nibble paths and hex-prefix packing.

use crate::{MptError, MptResult};
use bytes::Bytes;
use std::fmt;

const FLAG_TERMINAL: u8 = 0x2;
const FLAG_ODD: u8 = 0x1;

/// An immutable sequence of 4-bit nibbles.
///
/// Each nibble occupies one byte of the backing buffer, so [`NibblePath::shift`]
/// is a cheap view and never copies.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NibblePath {
    nibbles: Bytes,
}

impl NibblePath {
    /// The zero-length path; identity for [`NibblePath::concat`].
    pub const EMPTY: NibblePath = NibblePath {
        nibbles: Bytes::new(),
    };

    /// A one-nibble path. Only the low four bits of `nibble` are kept.
    pub fn single(nibble: u8) -> Self {
        Self {
            nibbles: Bytes::copy_from_slice(&[nibble & 0x0f]),
        }
    }

    /// Builds a path from raw nibble values, rejecting anything above 15.
    pub fn from_nibbles(nibbles: impl Into<Vec<u8>>) -> MptResult<Self> {
        let nibbles = nibbles.into();
        if let Some(bad) = nibbles.iter().find(|n| **n > 0x0f) {
            return Err(MptError::InvalidKey(format!("nibble out of range: {}", bad)));
        }
        Ok(Self {
            nibbles: Bytes::from(nibbles),
        })
    }

    /// Splits every byte into its high and low nibble.
    pub fn from_normal(bytes: &[u8]) -> Self {
        let mut nibbles = Vec::with_capacity(bytes.len() * 2);
        for byte in bytes {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0f);
        }
        Self {
            nibbles: Bytes::from(nibbles),
        }
    }

    /// Joins nibble pairs back into bytes. Defined only on even-length paths.
    pub fn to_normal(&self) -> MptResult<Vec<u8>> {
        if self.nibbles.len() % 2 != 0 {
            return Err(MptError::InvalidKey(format!(
                "odd nibble path cannot be converted to bytes: {}",
                self
            )));
        }
        Ok(self
            .nibbles
            .chunks_exact(2)
            .map(|pair| (pair[0] << 4) | pair[1])
            .collect())
    }

    /// Hex-prefix encodes this path; `terminal` marks a leaf key.
    pub fn to_packed(&self, terminal: bool) -> Vec<u8> {
        let odd = self.nibbles.len() % 2 == 1;
        let mut flag = if terminal { FLAG_TERMINAL } else { 0 };
        if odd {
            flag |= FLAG_ODD;
        }

        let mut packed = Vec::with_capacity(self.nibbles.len() / 2 + 1);
        let rest = if odd {
            packed.push((flag << 4) | self.nibbles[0]);
            &self.nibbles[1..]
        } else {
            packed.push(flag << 4);
            &self.nibbles[..]
        };
        packed.extend(rest.chunks_exact(2).map(|pair| (pair[0] << 4) | pair[1]));
        packed
    }

    /// Decodes a hex-prefix encoded path, returning it with its terminal flag.
    pub fn from_packed(packed: &[u8]) -> MptResult<(Self, bool)> {
        let first = *packed
            .first()
            .ok_or_else(|| MptError::InvalidFormat("empty hex-prefix key".to_string()))?;
        let flag = first >> 4;
        if flag > (FLAG_TERMINAL | FLAG_ODD) {
            return Err(MptError::InvalidFormat(format!(
                "invalid hex-prefix flag: {:#x}",
                flag
            )));
        }
        let odd = flag & FLAG_ODD != 0;
        if !odd && first & 0x0f != 0 {
            return Err(MptError::InvalidFormat(
                "non-zero padding nibble in even hex-prefix key".to_string(),
            ));
        }

        let mut nibbles = Vec::with_capacity(packed.len() * 2);
        if odd {
            nibbles.push(first & 0x0f);
        }
        for byte in &packed[1..] {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0f);
        }
        Ok((
            Self {
                nibbles: Bytes::from(nibbles),
            },
            flag & FLAG_TERMINAL != 0,
        ))
    }

    /// Reads the terminal flag of a hex-prefix encoded key.
    pub fn is_terminal(packed: &[u8]) -> bool {
        packed
            .first()
            .map_or(false, |first| (first >> 4) & FLAG_TERMINAL != 0)
    }

    pub fn len(&self) -> usize {
        self.nibbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nibbles.is_empty()
    }

    /// Returns the nibble at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn get(&self, index: usize) -> u8 {
        self.nibbles[index]
    }

    /// Drops the first `n` nibbles. Shifting past the end yields an empty path.
    pub fn shift(&self, n: usize) -> Self {
        let start = n.min(self.nibbles.len());
        Self {
            nibbles: self.nibbles.slice(start..),
        }
    }

    pub fn concat(&self, other: &NibblePath) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut nibbles = Vec::with_capacity(self.len() + other.len());
        nibbles.extend_from_slice(&self.nibbles);
        nibbles.extend_from_slice(&other.nibbles);
        Self {
            nibbles: Bytes::from(nibbles),
        }
    }

    /// Longest shared prefix of both paths.
    pub fn common_prefix(&self, other: &NibblePath) -> Self {
        let shared = self
            .nibbles
            .iter()
            .zip(other.nibbles.iter())
            .take_while(|(a, b)| a == b)
            .count();
        Self {
            nibbles: self.nibbles.slice(..shared),
        }
    }

    /// Returns the remainder after `prefix` if this path starts with it.
    pub fn match_and_shift(&self, prefix: &NibblePath) -> Option<NibblePath> {
        if self.nibbles.starts_with(&prefix.nibbles) {
            Some(self.shift(prefix.len()))
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.nibbles
    }
}

impl fmt::Display for NibblePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for nibble in self.nibbles.iter() {
            write!(f, "{:x}", nibble)?;
        }
        Ok(())
    }
}

impl fmt::Debug for NibblePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NibblePath({})", self)
    }
}
