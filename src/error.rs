//! Error types for TrinityChain primitives

use crate::rlp::ValueKind;
use std::fmt;
use thiserror::Error;

/// Where in the grammar a decode failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePhase {
    ShortString,
    LongString,
    LongStringSize,
    ShortList,
    LongList,
    LongListSize,
    ListItem,
}

impl fmt::Display for DecodePhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodePhase::ShortString => write!(f, "short string"),
            DecodePhase::LongString => write!(f, "long string"),
            DecodePhase::LongStringSize => write!(f, "size of long string"),
            DecodePhase::ShortList => write!(f, "short list"),
            DecodePhase::LongList => write!(f, "long list"),
            DecodePhase::LongListSize => write!(f, "size of long list"),
            DecodePhase::ListItem => write!(f, "list item"),
        }
    }
}

/// Errors produced while decoding RLP input.
///
/// Every variant is terminal for the decode call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("cannot parse empty input")]
    EmptyInput,

    #[error("input truncated: need {needed} bytes, {available} available")]
    Truncated { needed: u64, available: usize },

    #[error("list items overran declared size by {overrun} bytes")]
    MalformedListEnding { overrun: usize },

    #[error("cannot parse {phase}: {source}")]
    Context {
        phase: DecodePhase,
        #[source]
        source: Box<DecodeError>,
    },

    #[error("{remaining} trailing bytes after value")]
    TrailingBytes { remaining: usize },

    #[error("nesting depth exceeds limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    #[error("non-canonical encoding: {0}")]
    NonCanonical(&'static str),

    #[error("expected {expected:?} value")]
    UnexpectedKind { expected: ValueKind },

    #[error("integer of {len} bytes overflows target type")]
    IntegerOverflow { len: usize },

    #[error("expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("expected list of {expected} items, got {got}")]
    ListLength { expected: usize, got: usize },
}

impl DecodeError {
    pub(crate) fn within(self, phase: DecodePhase) -> Self {
        DecodeError::Context {
            phase,
            source: Box::new(self),
        }
    }

    /// The innermost error, with all phase context stripped.
    pub fn root_cause(&self) -> &DecodeError {
        let mut err = self;
        while let DecodeError::Context { source, .. } = err {
            err = source;
        }
        err
    }

    /// True when the input ended before the encoding it declared.
    pub fn is_truncated(&self) -> bool {
        matches!(
            self.root_cause(),
            DecodeError::Truncated { .. } | DecodeError::EmptyInput
        )
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_strips_context() {
        let err = DecodeError::Truncated {
            needed: 3,
            available: 1,
        }
        .within(DecodePhase::ShortString)
        .within(DecodePhase::ListItem)
        .within(DecodePhase::ShortList);

        assert_eq!(
            err.root_cause(),
            &DecodeError::Truncated {
                needed: 3,
                available: 1
            }
        );
        assert!(err.is_truncated());
    }

    #[test]
    fn test_context_message_names_phase() {
        let err = DecodeError::MalformedListEnding { overrun: 2 }.within(DecodePhase::LongList);
        assert_eq!(
            err.to_string(),
            "cannot parse long list: list items overran declared size by 2 bytes"
        );
        assert!(!err.is_truncated());
    }
}
