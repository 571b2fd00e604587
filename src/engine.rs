//! The bcrypt function itself: `(password, salt, cost) -> 24-byte digest`.
//!
//! Nothing here keeps state between calls or touches I/O. Salt randomness
//! comes from whatever RNG the caller hands to [`generate_salt`].

use std::fmt;

use rand::{CryptoRng, RngCore};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::base64;
use crate::blowfish::eks_setup;
use crate::error::{BcryptError, BcryptResult};

pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;
pub const DEFAULT_COST: u32 = 12;

/// Raw salt length in bytes.
pub const SALT_LEN: usize = 16;
/// Raw digest length in bytes.
pub const DIGEST_LEN: usize = 24;
/// Password bytes past this index are ignored.
pub const MAX_PASSWORD_LEN: usize = 72;

/// Minimum buffer for [`Salt::encode_into`]: 22 characters, a NUL, and slack.
pub const BCRYPT_SALTSPACE: usize = 25;

const MAGIC: &[u8; DIGEST_LEN] = b"OrpheanBeholderScryDoubt";
const ENCRYPT_ROUNDS: usize = 64;

/// log2 of the number of key expansion rounds, always within 4..=31.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cost(u32);

impl Cost {
    pub fn new(cost: u32) -> BcryptResult<Self> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(BcryptError::InvalidCost(cost));
        }
        Ok(Cost(cost))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Number of Eksblowfish expansion rounds, `2^cost`.
    pub fn rounds(self) -> u64 {
        1u64 << self.0
    }
}

impl Default for Cost {
    fn default() -> Self {
        Cost(DEFAULT_COST)
    }
}

impl TryFrom<u32> for Cost {
    type Error = BcryptError;

    fn try_from(cost: u32) -> BcryptResult<Self> {
        Cost::new(cost)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Sixteen raw salt bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    pub fn from_slice(bytes: &[u8]) -> BcryptResult<Self> {
        let raw: [u8; SALT_LEN] = bytes
            .try_into()
            .map_err(|_| BcryptError::InvalidSalt(bytes.len()))?;
        Ok(Salt(raw))
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    /// The 22-character bcrypt base64 form.
    pub fn encode(&self) -> String {
        base64::encode(&self.0)
    }

    /// Writes the 22-character form plus a NUL into `output`, which must be
    /// at least [`BCRYPT_SALTSPACE`] bytes. Nothing is written on failure.
    pub fn encode_into(&self, output: &mut [u8]) -> BcryptResult<usize> {
        if output.len() < BCRYPT_SALTSPACE {
            return Err(BcryptError::BufferTooSmall {
                needed: BCRYPT_SALTSPACE,
                available: output.len(),
            });
        }
        base64::encode_into(&self.0, output)
    }

    pub fn decode(encoded: &str) -> BcryptResult<Self> {
        base64::decode_exact::<SALT_LEN>(encoded).map(Salt)
    }

    /// Decodes caller-supplied salt text, dropping any stray bits in the
    /// 22nd character. Re-encoding yields the canonical form.
    pub fn decode_lenient(encoded: &str) -> BcryptResult<Self> {
        base64::decode_exact_lenient::<SALT_LEN>(encoded).map(Salt)
    }
}

impl From<[u8; SALT_LEN]> for Salt {
    fn from(raw: [u8; SALT_LEN]) -> Self {
        Salt(raw)
    }
}

/// The raw 24-byte ciphertext of the magic string.
///
/// Hash records only carry the first 23 bytes; see [`Digest::stored`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// The 23 bytes that survive into a hash record.
    pub fn stored(&self) -> [u8; DIGEST_LEN - 1] {
        let mut out = [0u8; DIGEST_LEN - 1];
        out.copy_from_slice(&self.0[..DIGEST_LEN - 1]);
        out
    }
}

/// Draws a fresh salt from `rng`.
pub fn generate_salt<R: RngCore + CryptoRng>(rng: &mut R) -> BcryptResult<Salt> {
    let mut raw = [0u8; SALT_LEN];
    rng.try_fill_bytes(&mut raw)?;
    Ok(Salt(raw))
}

/// Builds the Blowfish key: the password's first 72 bytes followed by a NUL,
/// cut back to 72 bytes in total. Embedded NULs are ordinary bytes.
fn prepare_key(password: &[u8]) -> (Zeroizing<[u8; MAX_PASSWORD_LEN]>, usize) {
    if password.len() > MAX_PASSWORD_LEN {
        warn!(
            len = password.len(),
            "password is longer than {MAX_PASSWORD_LEN} bytes and will be truncated"
        );
    }

    let mut key = Zeroizing::new([0u8; MAX_PASSWORD_LEN]);
    let used = password.len().min(MAX_PASSWORD_LEN);
    key[..used].copy_from_slice(&password[..used]);

    (key, (used + 1).min(MAX_PASSWORD_LEN))
}

/// Computes the bcrypt digest of `password`.
///
/// Deterministic in its three inputs. An empty password is valid and is
/// hashed as a single NUL byte, which makes it collide with any password
/// consisting only of NULs.
pub fn hash(password: &[u8], salt: &Salt, cost: Cost) -> BcryptResult<Digest> {
    debug!(cost = cost.get(), "computing bcrypt digest");

    let (key, key_len) = prepare_key(password);
    let state = eks_setup(cost, &key[..key_len], &salt.0)?;

    let mut words = [0u32; DIGEST_LEN / 4];
    for (word, chunk) in words.iter_mut().zip(MAGIC.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    for _ in 0..ENCRYPT_ROUNDS {
        for pair in words.chunks_exact_mut(2) {
            let (l, r) = state.encrypt_block(pair[0], pair[1]);
            pair[0] = l;
            pair[1] = r;
        }
    }

    let mut out = [0u8; DIGEST_LEN];
    for (chunk, word) in out.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }

    Ok(Digest(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn cost(c: u32) -> Cost {
        Cost::new(c).unwrap()
    }

    #[test]
    fn cost_bounds() {
        assert!(matches!(Cost::new(3), Err(BcryptError::InvalidCost(3))));
        assert!(matches!(Cost::new(32), Err(BcryptError::InvalidCost(32))));
        assert_eq!(Cost::new(4).unwrap().rounds(), 16);
        assert_eq!(Cost::new(31).unwrap().rounds(), 1 << 31);
        assert_eq!(Cost::default().get(), DEFAULT_COST);
        assert_eq!(Cost::new(5).unwrap().to_string(), "05");
    }

    #[test]
    fn salt_length_is_checked() {
        assert!(matches!(Salt::from_slice(&[0u8; 15]), Err(BcryptError::InvalidSalt(15))));
        assert!(matches!(Salt::from_slice(&[0u8; 17]), Err(BcryptError::InvalidSalt(17))));
        assert!(Salt::from_slice(&[0u8; 16]).is_ok());
    }

    #[test]
    fn salt_encode_into_needs_saltspace() {
        let salt = Salt::from([0u8; SALT_LEN]);
        let mut short = [0x55u8; BCRYPT_SALTSPACE - 1];
        assert!(matches!(
            salt.encode_into(&mut short),
            Err(BcryptError::BufferTooSmall { needed: BCRYPT_SALTSPACE, .. })
        ));
        assert!(short.iter().all(|&b| b == 0x55));

        let mut buf = [0x55u8; BCRYPT_SALTSPACE];
        assert_eq!(salt.encode_into(&mut buf).unwrap(), 22);
        assert_eq!(buf[22], 0);
    }

    #[test]
    fn generated_salts_differ() {
        let a = generate_salt(&mut OsRng).unwrap();
        let b = generate_salt(&mut OsRng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn key_preparation() {
        let (key, len) = prepare_key(b"");
        assert_eq!(len, 1);
        assert_eq!(key[0], 0);

        let (key, len) = prepare_key(b"a\0b");
        assert_eq!(len, 4);
        assert_eq!(&key[..4], b"a\0b\0");

        let (_, len) = prepare_key(&[b'x'; 71]);
        assert_eq!(len, 72);
        let (key, len) = prepare_key(&[b'x'; 100]);
        assert_eq!(len, 72);
        assert_eq!(key[71], b'x');
    }

    #[test]
    fn empty_password_golden() {
        let digest = hash(b"", &Salt::from([0u8; 16]), cost(4)).unwrap();
        let expected: [u8; 24] = [
            0xcb, 0xde, 0x9d, 0x37, 0xb8, 0x96, 0xf4, 0xd5, 0x0b, 0x12, 0x76, 0xc4, 0x9c, 0x47,
            0x00, 0x46, 0x6d, 0x77, 0xe9, 0xc5, 0x71, 0x05, 0x94, 0x22,
        ];
        assert_eq!(digest.as_bytes(), &expected);
    }

    #[test]
    fn deterministic() {
        let salt = Salt::from([7u8; 16]);
        let a = hash(b"password", &salt, cost(4)).unwrap();
        let b = hash(b"password", &salt, cost(4)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn embedded_nul_is_significant() {
        let salt = Salt::from([0u8; 16]);
        let a = hash(b"a", &salt, cost(4)).unwrap();
        let b = hash(b"a\0b", &salt, cost(4)).unwrap();
        assert_ne!(a, b);
    }
}
