//! bcrypt password hashing.
//!
//! bcrypt is a password hashing function designed by Niels Provos and David
//! Mazières, based on the Blowfish cipher, and presented in 1999 at the
//! Usenix Security Symposium. Its key schedule is deliberately expensive and
//! tunable through a cost parameter.
//!
//! ```no_run
//! let stored = bcrypt_rust::hash("hunter2", 12)?;
//! assert!(bcrypt_rust::verify("hunter2", &stored)?);
//! # Ok::<(), bcrypt_rust::BcryptError>(())
//! ```
//!
//! Passwords are byte strings and only the first 72 bytes take part in the
//! hash. The empty password is accepted. A NUL byte between other bytes is
//! significant (`"a\0b"` and `"a"` differ), but the key is the password plus
//! a terminating NUL repeated to fill the key schedule, so a password made
//! only of NUL bytes hashes the same as the empty password.

pub mod base64;
pub mod blowfish;
pub mod engine;
mod error;
mod hasher;
pub mod record;

pub use crate::engine::{Cost, Digest, Salt, BCRYPT_SALTSPACE, DEFAULT_COST, MAX_COST, MIN_COST};
pub use crate::error::{BcryptError, BcryptResult};
pub use crate::hasher::{
    hash, hash_with_salt, hash_with_salt_str, verify, BcryptHasher, PasswordHasher,
};
pub use crate::record::{HashRecord, SaltString, Version, BCRYPT_HASHSPACE};
