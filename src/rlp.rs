// Decode-only RLP. The node encodes with its own writers; this side parses
// untrusted network and storage bytes into borrowed trees.

pub mod arena;
pub mod decoder;
pub mod pool;
pub mod value;

pub use arena::Arena;
pub use decoder::{DecodeOptions, Decoder, DEFAULT_MAX_DEPTH};
pub use pool::{DecoderPool, PooledDecoder};
pub use value::{Children, OwnedValue, Value, ValueKind};

use once_cell::sync::Lazy;

static GLOBAL_POOL: Lazy<DecoderPool> = Lazy::new(DecoderPool::default);

/// Process-wide decoder pool with default options.
pub fn global_pool() -> &'static DecoderPool {
    &GLOBAL_POOL
}
