use thiserror::Error;

use crate::engine::{MAX_COST, MIN_COST, SALT_LEN};

/// Everything that can go wrong while hashing, parsing or verifying.
///
/// All variants describe bad input or a misbehaving collaborator; none are
/// transient, so retrying the same call gives the same result.
#[derive(Error, Debug)]
pub enum BcryptError {
    #[error("invalid cost {0}: must be between {MIN_COST} and {MAX_COST}")]
    InvalidCost(u32),
    #[error("invalid salt length {0}: expected {SALT_LEN} bytes")]
    InvalidSalt(usize),
    #[error("invalid key: Blowfish key material must not be empty")]
    InvalidKey,
    #[error("malformed bcrypt base64 encoding")]
    MalformedEncoding,
    #[error("malformed hash record: {0}")]
    MalformedRecord(&'static str),
    #[error("unsupported bcrypt version '{0}'")]
    UnsupportedVersion(String),
    #[error("buffer too small: need {needed} bytes, got {available}")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("random source failed: {0}")]
    RandomSource(#[from] rand::Error),
}

pub type BcryptResult<T> = Result<T, BcryptError>;
