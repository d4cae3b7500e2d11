//! Pool of reusable decoders.
//!
//! Idle decoders sit in a bounded MPMC channel. Borrowing never blocks: an
//! empty pool hands out a fresh decoder, and a full pool drops the returned
//! one. Callers that need to cap total decoders should bound their own
//! concurrency instead.

use super::decoder::{DecodeOptions, Decoder};
use super::value::Value;
use crate::config::DecoderConfig;
use crate::error::Result;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::ops::{Deref, DerefMut};
use tracing::{debug, trace};

pub const DEFAULT_MAX_IDLE: usize = 64;

/// Initial arena slots for decoders created by a pool.
pub const DEFAULT_ARENA_CAPACITY: usize = 32;

pub struct DecoderPool {
    idle_tx: Sender<Decoder>,
    idle_rx: Receiver<Decoder>,
    max_idle: usize,
    options: DecodeOptions,
    arena_capacity: usize,
}

impl DecoderPool {
    pub fn new(max_idle: usize) -> Self {
        Self::with_options(max_idle, DecodeOptions::default())
    }

    pub fn with_options(max_idle: usize, options: DecodeOptions) -> Self {
        let max_idle = max_idle.max(1);
        let (idle_tx, idle_rx) = crossbeam_channel::bounded(max_idle);
        Self {
            idle_tx,
            idle_rx,
            max_idle,
            options,
            arena_capacity: DEFAULT_ARENA_CAPACITY,
        }
    }

    pub fn from_config(config: &DecoderConfig) -> Self {
        let mut pool = Self::with_options(config.pool_max_idle, config.options());
        pool.arena_capacity = config.arena_capacity;
        pool
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    pub fn max_idle(&self) -> usize {
        self.max_idle
    }

    /// Number of decoders currently waiting in the pool.
    pub fn idle(&self) -> usize {
        self.idle_rx.len()
    }

    /// Take a decoder out of the pool. Pair with [`DecoderPool::release`],
    /// or use [`DecoderPool::get`] to have it returned automatically.
    pub fn acquire(&self) -> Decoder {
        match self.idle_rx.try_recv() {
            Ok(decoder) => decoder,
            Err(_) => {
                trace!(capacity = self.arena_capacity, "decoder pool empty, allocating");
                Decoder::with_arena_capacity(self.options, self.arena_capacity)
            }
        }
    }

    /// Return a decoder. Decoders with options other than the pool's are
    /// dropped, as are decoders returned to a full pool.
    pub fn release(&self, decoder: Decoder) {
        if decoder.options() != self.options {
            debug!("dropping decoder with foreign options");
            return;
        }
        if let Err(TrySendError::Full(_)) = self.idle_tx.try_send(decoder) {
            trace!(max_idle = self.max_idle, "decoder pool full, dropping decoder");
        }
    }

    /// Borrow a decoder for the lifetime of the returned guard.
    pub fn get(&self) -> PooledDecoder<'_> {
        PooledDecoder {
            pool: self,
            decoder: Some(self.acquire()),
        }
    }

    /// Decode `input` with a pooled decoder and hand the tree to `f`.
    ///
    /// The decoder goes back to the pool whether decoding succeeds or not.
    pub fn decode_with<R>(&self, input: &[u8], f: impl FnOnce(Value<'_>) -> R) -> Result<R> {
        let mut decoder = self.get();
        match decoder.decode(input) {
            Ok(value) => Ok(f(value)),
            Err(err) => {
                debug!(len = input.len(), error = %err, "rlp decode failed");
                Err(err)
            }
        }
    }
}

impl Default for DecoderPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}

/// A decoder on loan from a [`DecoderPool`], returned when dropped.
pub struct PooledDecoder<'p> {
    pool: &'p DecoderPool,
    decoder: Option<Decoder>,
}

impl PooledDecoder<'_> {
    /// Keep the decoder instead of returning it to the pool.
    pub fn detach(mut self) -> Decoder {
        match self.decoder.take() {
            Some(decoder) => decoder,
            None => unreachable!("pooled decoder taken twice"),
        }
    }
}

impl Deref for PooledDecoder<'_> {
    type Target = Decoder;

    fn deref(&self) -> &Decoder {
        match &self.decoder {
            Some(decoder) => decoder,
            None => unreachable!("pooled decoder used after detach"),
        }
    }
}

impl DerefMut for PooledDecoder<'_> {
    fn deref_mut(&mut self) -> &mut Decoder {
        match &mut self.decoder {
            Some(decoder) => decoder,
            None => unreachable!("pooled decoder used after detach"),
        }
    }
}

impl Drop for PooledDecoder<'_> {
    fn drop(&mut self) {
        if let Some(decoder) = self.decoder.take() {
            self.pool.release(decoder);
        }
    }
}
