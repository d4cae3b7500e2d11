//! Decoded RLP values.

use super::arena::{Arena, NodeId, SlotKind};
use crate::error::{DecodeError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bytes,
    Array,
}

/// A node of a decoded tree.
///
/// Borrows both the decoder's arena and the input buffer, so a tree cannot
/// outlive the next call to [`Decoder::decode`](super::Decoder::decode).
/// Use [`Value::to_owned_value`] to keep a copy.
#[derive(Clone, Copy)]
pub struct Value<'a> {
    arena: &'a Arena,
    input: &'a [u8],
    id: NodeId,
}

impl<'a> Value<'a> {
    pub(crate) fn new(arena: &'a Arena, input: &'a [u8], id: NodeId) -> Self {
        Self { arena, input, id }
    }

    pub fn kind(&self) -> ValueKind {
        match self.arena.slot(self.id).kind {
            SlotKind::Bytes => ValueKind::Bytes,
            SlotKind::Array => ValueKind::Array,
        }
    }

    pub fn is_bytes(&self) -> bool {
        self.kind() == ValueKind::Bytes
    }

    pub fn is_array(&self) -> bool {
        self.kind() == ValueKind::Array
    }

    /// The payload of a bytes value, borrowed from the input buffer.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        let slot = self.arena.slot(self.id);
        match slot.kind {
            SlotKind::Bytes => Some(&self.input[slot.start..slot.start + slot.len]),
            SlotKind::Array => None,
        }
    }

    /// Like [`Value::as_bytes`] but fails with `UnexpectedKind` on arrays.
    pub fn bytes(&self) -> Result<&'a [u8]> {
        self.as_bytes().ok_or(DecodeError::UnexpectedKind {
            expected: ValueKind::Bytes,
        })
    }

    /// Payload length for bytes, child count for arrays.
    pub fn len(&self) -> usize {
        let slot = self.arena.slot(self.id);
        match slot.kind {
            SlotKind::Bytes => slot.len,
            SlotKind::Array => slot.children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `index`th child of an array. `None` for bytes or out of range.
    pub fn get(&self, index: usize) -> Option<Value<'a>> {
        let slot = self.arena.slot(self.id);
        if slot.kind != SlotKind::Array {
            return None;
        }
        slot.children
            .get(index)
            .map(|&child| Value::new(self.arena, self.input, child))
    }

    /// Children in encoding order. Empty for bytes values.
    pub fn iter(&self) -> Children<'a> {
        let slot = self.arena.slot(self.id);
        let children: &'a [NodeId] = match slot.kind {
            SlotKind::Array => &slot.children,
            SlotKind::Bytes => &[],
        };
        Children {
            arena: self.arena,
            input: self.input,
            ids: children.iter(),
        }
    }

    /// Children of an array value, failing with `ListLength` unless there are
    /// exactly `N` of them.
    pub fn fields<const N: usize>(&self) -> Result<[Value<'a>; N]> {
        if !self.is_array() {
            return Err(DecodeError::UnexpectedKind {
                expected: ValueKind::Array,
            });
        }
        if self.len() != N {
            return Err(DecodeError::ListLength {
                expected: N,
                got: self.len(),
            });
        }
        let mut iter = self.iter();
        Ok(std::array::from_fn(|_| iter.next().unwrap_or(*self)))
    }

    /// Interpret the payload as a big-endian unsigned integer.
    pub fn as_u64(&self) -> Result<u64> {
        let bytes = self.bytes()?;
        if bytes.len() > 8 {
            return Err(DecodeError::IntegerOverflow { len: bytes.len() });
        }
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    /// Copy the payload into a fixed-size array; the length must match exactly.
    pub fn as_fixed<const N: usize>(&self) -> Result<[u8; N]> {
        let bytes = self.bytes()?;
        bytes.try_into().map_err(|_| DecodeError::InvalidLength {
            expected: N,
            got: bytes.len(),
        })
    }

    /// Deep copy of this subtree, independent of the decoder.
    pub fn to_owned_value(&self) -> OwnedValue {
        match self.as_bytes() {
            Some(bytes) => OwnedValue::Bytes(bytes.to_vec()),
            None => OwnedValue::Array(self.iter().map(|v| v.to_owned_value()).collect()),
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.as_bytes() {
            Some(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            None => f.debug_list().entries(self.iter()).finish(),
        }
    }
}

impl PartialEq<OwnedValue> for Value<'_> {
    fn eq(&self, other: &OwnedValue) -> bool {
        match (self.as_bytes(), other) {
            (Some(bytes), OwnedValue::Bytes(expected)) => bytes == expected.as_slice(),
            (None, OwnedValue::Array(expected)) => {
                self.len() == expected.len() && self.iter().zip(expected).all(|(a, b)| a == *b)
            }
            _ => false,
        }
    }
}

impl<'a> IntoIterator for Value<'a> {
    type Item = Value<'a>;
    type IntoIter = Children<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the children of an array value.
pub struct Children<'a> {
    arena: &'a Arena,
    input: &'a [u8],
    ids: std::slice::Iter<'a, NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = Value<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ids
            .next()
            .map(|&id| Value::new(self.arena, self.input, id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

/// An RLP tree that owns its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedValue {
    Bytes(Vec<u8>),
    Array(Vec<OwnedValue>),
}

impl OwnedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            OwnedValue::Bytes(_) => ValueKind::Bytes,
            OwnedValue::Array(_) => ValueKind::Array,
        }
    }
}

impl From<&[u8]> for OwnedValue {
    fn from(bytes: &[u8]) -> Self {
        OwnedValue::Bytes(bytes.to_vec())
    }
}

impl From<&str> for OwnedValue {
    fn from(s: &str) -> Self {
        OwnedValue::Bytes(s.as_bytes().to_vec())
    }
}
