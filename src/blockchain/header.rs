use crate::error::{DecodeError, Result};
use crate::rlp::{DecoderPool, Value};
use sha2::{Digest, Sha256};

pub type Sha256Hash = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u64,
    pub timestamp: u64,
    pub previous_hash: Sha256Hash,
    pub merkle_root: Sha256Hash,
    pub difficulty: u32,
    pub nonce: u64,
}

impl BlockHeader {
    pub fn hash(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.previous_hash);
        hasher.update(self.merkle_root);
        hasher.update(self.difficulty.to_le_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hasher.finalize().into()
    }

    /// Build a header from its RLP list form:
    /// `[height, timestamp, previous_hash, merkle_root, difficulty, nonce]`.
    pub fn from_rlp(value: Value<'_>) -> Result<Self> {
        let [height, timestamp, previous_hash, merkle_root, difficulty, nonce] =
            value.fields::<6>()?;

        let difficulty = u32::try_from(difficulty.as_u64()?).map_err(|_| {
            DecodeError::IntegerOverflow {
                len: difficulty.len(),
            }
        })?;

        Ok(BlockHeader {
            height: height.as_u64()?,
            timestamp: timestamp.as_u64()?,
            previous_hash: previous_hash.as_fixed()?,
            merkle_root: merkle_root.as_fixed()?,
            difficulty,
            nonce: nonce.as_u64()?,
        })
    }

    /// Decode a header with a decoder borrowed from `pool`.
    pub fn decode(pool: &DecoderPool, bytes: &[u8]) -> Result<Self> {
        pool.decode_with(bytes, BlockHeader::from_rlp)?
    }
}
