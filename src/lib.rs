//! TrinityChain primitives - decoding and chain-head notification building blocks
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Encoding
//! - [`rlp`] - Zero-copy RLP decoder, node arena and decoder pool
//!
//! ## Core Blockchain
//! - [`blockchain`] - Block headers, chain-head events and the event stream
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Encoding
// ============================================================================
pub mod rlp;

// ============================================================================
// Core Blockchain
// ============================================================================
pub mod blockchain;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
