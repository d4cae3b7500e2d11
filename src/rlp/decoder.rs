//! Recursive-descent RLP decoder.
//!
//! | leading byte  | meaning                                              |
//! |---------------|------------------------------------------------------|
//! | `0x00..=0x7f` | the byte itself                                      |
//! | `0x80..=0xb7` | string of `b - 0x80` bytes                           |
//! | `0xb8..=0xbf` | string, size in the next `b - 0xb7` bytes            |
//! | `0xc0..=0xf7` | list whose items occupy `b - 0xc0` bytes             |
//! | `0xf8..=0xff` | list, payload size in the next `b - 0xf7` bytes      |
//!
//! The decoder never copies payloads: every bytes value is a range of the
//! input buffer, and nodes come from an [`Arena`] that is reset at the start
//! of every parse.

use super::arena::{Arena, NodeId};
use super::value::Value;
use crate::error::{DecodeError, DecodePhase, Result};

/// Default maximum list nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

const SHORT_STRING: u8 = 0x80;
const LONG_STRING: u8 = 0xb8;
const SHORT_LIST: u8 = 0xc0;
const LONG_LIST: u8 = 0xf8;
const SHORT_PAYLOAD_MAX: u64 = 55;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Lists nested deeper than this fail with `DepthLimitExceeded`.
    pub max_depth: usize,
    /// Reject size encodings that a canonical encoder would never produce.
    pub strict_lengths: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_lengths: false,
        }
    }
}

/// A single-threaded decoder owning its node arena.
///
/// Not meant to be shared; use a [`DecoderPool`](super::DecoderPool) to give
/// each concurrent caller its own instance.
#[derive(Debug, Default)]
pub struct Decoder {
    arena: Arena,
    options: DecodeOptions,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            arena: Arena::new(),
            options,
        }
    }

    pub(crate) fn with_arena_capacity(options: DecodeOptions, capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            options,
        }
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Decode exactly one value spanning the whole input.
    pub fn decode<'a>(&'a mut self, input: &'a [u8]) -> Result<Value<'a>> {
        let (value, rest) = self.decode_prefix(input)?;
        if !rest.is_empty() {
            return Err(DecodeError::TrailingBytes {
                remaining: rest.len(),
            });
        }
        Ok(value)
    }

    /// Decode one value from the front of `input` and return the unread tail.
    pub fn decode_prefix<'a>(&'a mut self, input: &'a [u8]) -> Result<(Value<'a>, &'a [u8])> {
        self.arena.reset();
        let mut parser = Parser {
            input,
            pos: 0,
            arena: &mut self.arena,
            options: self.options,
        };
        let root = parser.parse_value(0)?;
        let rest = &input[parser.pos..];
        Ok((Value::new(&self.arena, input, root), rest))
    }
}

struct Parser<'p> {
    input: &'p [u8],
    pos: usize,
    arena: &'p mut Arena,
    options: DecodeOptions,
}

impl Parser<'_> {
    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Check that `size` more bytes are available and return it as `usize`.
    fn reserve(&self, size: u64) -> Result<usize> {
        let available = self.remaining();
        match usize::try_from(size) {
            Ok(size) if size <= available => Ok(size),
            _ => Err(DecodeError::Truncated {
                needed: size,
                available,
            }),
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<NodeId> {
        let Some(&prefix) = self.input.get(self.pos) else {
            return Err(DecodeError::EmptyInput);
        };
        let start = self.pos;
        self.pos += 1;

        match prefix {
            0x00..=0x7f => Ok(self.arena.alloc_bytes(start, 1)),
            SHORT_STRING..=0xb7 => {
                let size = u64::from(prefix - SHORT_STRING);
                self.parse_bytes(size)
                    .map_err(|e| e.within(DecodePhase::ShortString))
            }
            LONG_STRING..=0xbf => {
                let size = self
                    .read_size(usize::from(prefix - 0xb7))
                    .map_err(|e| e.within(DecodePhase::LongStringSize))?;
                self.parse_bytes(size)
                    .map_err(|e| e.within(DecodePhase::LongString))
            }
            SHORT_LIST..=0xf7 => {
                let size = u64::from(prefix - SHORT_LIST);
                self.parse_list(size, depth)
                    .map_err(|e| e.within(DecodePhase::ShortList))
            }
            LONG_LIST..=0xff => {
                let size = self
                    .read_size(usize::from(prefix - 0xf7))
                    .map_err(|e| e.within(DecodePhase::LongListSize))?;
                self.parse_list(size, depth)
                    .map_err(|e| e.within(DecodePhase::LongList))
            }
        }
    }

    fn parse_bytes(&mut self, size: u64) -> Result<NodeId> {
        let len = self.reserve(size)?;
        if self.options.strict_lengths && len == 1 && self.input[self.pos] < SHORT_STRING {
            return Err(DecodeError::NonCanonical(
                "single byte below 0x80 must encode as itself",
            ));
        }
        let id = self.arena.alloc_bytes(self.pos, len);
        self.pos += len;
        Ok(id)
    }

    fn parse_list(&mut self, size: u64, depth: usize) -> Result<NodeId> {
        if depth >= self.options.max_depth {
            return Err(DecodeError::DepthLimitExceeded {
                limit: self.options.max_depth,
            });
        }
        let declared = self.reserve(size)?;
        let list = self.arena.alloc_array();

        let mut left = declared;
        while left > 0 {
            let before = self.pos;
            let child = self
                .parse_value(depth + 1)
                .map_err(|e| e.within(DecodePhase::ListItem))?;
            self.arena.push_child(list, child);

            let consumed = self.pos - before;
            if consumed > left {
                return Err(DecodeError::MalformedListEnding {
                    overrun: consumed - left,
                });
            }
            left -= consumed;
        }
        Ok(list)
    }

    /// Read a `width`-byte big-endian size field (1..=8 bytes).
    fn read_size(&mut self, width: usize) -> Result<u64> {
        let width = self.reserve(width as u64)?;
        let field = &self.input[self.pos..self.pos + width];

        let mut buf = [0u8; 8];
        buf[8 - width..].copy_from_slice(field);
        let size = u64::from_be_bytes(buf);

        if self.options.strict_lengths {
            if field[0] == 0 {
                return Err(DecodeError::NonCanonical("size has leading zero bytes"));
            }
            if size <= SHORT_PAYLOAD_MAX {
                return Err(DecodeError::NonCanonical(
                    "long form used for payload under 56 bytes",
                ));
            }
        }
        self.pos += width;
        Ok(size)
    }
}
