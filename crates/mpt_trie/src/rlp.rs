//! Length-prefixed node encoding on top of `alloy-rlp` headers.

use crate::{MptError, MptResult};
use alloy_rlp::{Header, EMPTY_STRING_CODE};

/// Encoding of the empty byte string, used for absent branch slots.
pub(crate) const NULL_ITEM: [u8; 1] = [EMPTY_STRING_CODE];

/// One element of a decoded list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Item<'a> {
    /// String payload without its header
    Bytes(&'a [u8]),
    /// Nested list including its header
    List(&'a [u8]),
}

impl<'a> Item<'a> {
    pub(crate) fn bytes(self) -> MptResult<&'a [u8]> {
        match self {
            Item::Bytes(payload) => Ok(payload),
            Item::List(_) => Err(MptError::InvalidFormat(
                "expected byte string, found list".to_string(),
            )),
        }
    }
}

pub(crate) fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() == 1 && bytes[0] < EMPTY_STRING_CODE {
        return vec![bytes[0]];
    }
    let mut out = Vec::with_capacity(bytes.len() + 9);
    Header {
        list: false,
        payload_length: bytes.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(bytes);
    out
}

/// Wraps already-encoded items in a list header.
pub(crate) fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_length = items.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Splits a list encoding into its top-level items. The whole buffer must be
/// consumed by the list.
pub(crate) fn decode_list(encoded: &[u8]) -> MptResult<Vec<Item<'_>>> {
    let mut rest = encoded;
    let header = Header::decode(&mut rest)?;
    if !header.list {
        return Err(MptError::InvalidFormat("expected list encoding".to_string()));
    }
    if rest.len() != header.payload_length {
        return Err(MptError::InvalidFormat(format!(
            "list payload is {} bytes, header declares {}",
            rest.len(),
            header.payload_length
        )));
    }

    let mut items = Vec::new();
    let mut payload = rest;
    while !payload.is_empty() {
        let start = payload;
        let item = Header::decode(&mut payload)?;
        if item.payload_length > payload.len() {
            return Err(MptError::InvalidFormat("truncated list item".to_string()));
        }
        let header_length = start.len() - payload.len();
        if item.list {
            items.push(Item::List(&start[..header_length + item.payload_length]));
        } else {
            // Single bytes below 0x80 are their own encoding and carry no header
            items.push(Item::Bytes(&payload[..item.payload_length]));
        }
        payload = &payload[item.payload_length..];
    }
    Ok(items)
}
