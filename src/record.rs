//! The modular-crypt text form of a bcrypt hash.
//!
//! ```text
//! $2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW
//! \__/\_/\____________________/\_____________________________/
//!  |   |          salt (22)             digest (31)
//!  |   cost, two digits
//!  version
//! ```

use std::fmt;
use std::str::FromStr;

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::base64;
use crate::engine::{self, Cost, Digest, Salt, DIGEST_LEN};
use crate::error::{BcryptError, BcryptResult};

/// Length of a formatted record.
pub const RECORD_LEN: usize = 60;
/// Minimum buffer for [`HashRecord::format_into`]: the record plus a NUL.
pub const BCRYPT_HASHSPACE: usize = RECORD_LEN + 1;
/// Length of `$2b$12$` plus the encoded salt.
pub const FULL_SALT_LEN: usize = 29;

const PREFIX_LEN: usize = 7;
const SALT_CHARS: usize = base64::encoded_len(engine::SALT_LEN);
const DIGEST_CHARS: usize = base64::encoded_len(STORED_DIGEST_LEN);
const STORED_DIGEST_LEN: usize = DIGEST_LEN - 1;

/// bcrypt revision tag.
///
/// All supported revisions hash identically; the tag is carried through so
/// that re-formatting a parsed record reproduces it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Version {
    /// Original OpenBSD revision with NUL-terminated, UTF-8 keys.
    TwoA,
    /// Current OpenBSD revision.
    #[default]
    TwoB,
    /// crypt_blowfish's name for the fixed algorithm; same as `2b`.
    TwoY,
}

impl Version {
    pub fn as_str(self) -> &'static str {
        match self {
            Version::TwoA => "2a",
            Version::TwoB => "2b",
            Version::TwoY => "2y",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Version {
    type Err = BcryptError;

    fn from_str(tag: &str) -> BcryptResult<Self> {
        match tag {
            "2a" => Ok(Version::TwoA),
            "2b" => Ok(Version::TwoB),
            "2y" => Ok(Version::TwoY),
            other => Err(BcryptError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// Splits `$<version>$<cc>$` off the front of `s`.
fn parse_prefix(s: &str) -> BcryptResult<(Version, Cost, &str)> {
    if !s.is_ascii() {
        return Err(BcryptError::MalformedRecord("non-ASCII characters"));
    }
    let rest = s
        .strip_prefix('$')
        .ok_or(BcryptError::MalformedRecord("missing leading '$'"))?;
    let (tag, rest) = rest
        .split_once('$')
        .ok_or(BcryptError::MalformedRecord("missing version separator"))?;
    let version: Version = tag.parse()?;

    let (cost, rest) = rest
        .split_once('$')
        .ok_or(BcryptError::MalformedRecord("missing cost separator"))?;
    if cost.len() != 2 || !cost.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BcryptError::MalformedRecord("cost must be two decimal digits"));
    }
    let cost = cost
        .parse::<u32>()
        .map_err(|_| BcryptError::MalformedRecord("cost must be two decimal digits"))?;

    Ok((version, Cost::new(cost)?, rest))
}

/// Parsed form of a stored bcrypt hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashRecord {
    version: Version,
    cost: Cost,
    salt: Salt,
    digest: [u8; STORED_DIGEST_LEN],
}

impl HashRecord {
    /// Builds a record from an engine digest, dropping its last byte.
    pub fn new(version: Version, cost: Cost, salt: Salt, digest: &Digest) -> Self {
        HashRecord {
            version,
            cost,
            salt,
            digest: digest.stored(),
        }
    }

    /// Builds a record from already-stored parts.
    pub fn from_parts(
        version: Version,
        cost: Cost,
        salt: Salt,
        digest: [u8; STORED_DIGEST_LEN],
    ) -> Self {
        HashRecord {
            version,
            cost,
            salt,
            digest,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// The 23 digest bytes carried by the record.
    pub fn digest(&self) -> &[u8; STORED_DIGEST_LEN] {
        &self.digest
    }

    pub fn parse(s: &str) -> BcryptResult<Self> {
        let (version, cost, rest) = parse_prefix(s)?;
        if s.len() != RECORD_LEN || rest.len() != SALT_CHARS + DIGEST_CHARS {
            return Err(BcryptError::MalformedRecord("wrong record length"));
        }

        let salt = Salt::decode(&rest[..SALT_CHARS])?;
        let digest = base64::decode_exact::<STORED_DIGEST_LEN>(&rest[SALT_CHARS..])?;

        Ok(HashRecord {
            version,
            cost,
            salt,
            digest,
        })
    }

    pub fn format(&self) -> String {
        format!(
            "${}${}${}{}",
            self.version,
            self.cost,
            self.salt.encode(),
            base64::encode(&self.digest)
        )
    }

    /// Writes the 60-character record and a NUL into `output`.
    ///
    /// `output` must hold at least [`BCRYPT_HASHSPACE`] bytes; otherwise it
    /// is left untouched.
    pub fn format_into(&self, output: &mut [u8]) -> BcryptResult<usize> {
        if output.len() < BCRYPT_HASHSPACE {
            return Err(BcryptError::BufferTooSmall {
                needed: BCRYPT_HASHSPACE,
                available: output.len(),
            });
        }
        let text = self.format();
        output[..RECORD_LEN].copy_from_slice(text.as_bytes());
        output[RECORD_LEN] = 0;
        Ok(RECORD_LEN)
    }

    /// Re-hashes `password` with this record's salt and cost and compares
    /// the result in constant time.
    pub fn verify(&self, password: &[u8]) -> BcryptResult<bool> {
        debug!(version = %self.version, cost = self.cost.get(), "verifying bcrypt hash");
        let candidate = engine::hash(password, &self.salt, self.cost)?.stored();
        Ok(candidate.ct_eq(&self.digest).into())
    }
}

impl fmt::Display for HashRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for HashRecord {
    type Err = BcryptError;

    fn from_str(s: &str) -> BcryptResult<Self> {
        HashRecord::parse(s)
    }
}

/// Checks `password` against a stored hash string.
pub fn verify(password: &[u8], record: &str) -> BcryptResult<bool> {
    HashRecord::parse(record)?.verify(password)
}

/// A salt with its version and cost, as written before the digest in a
/// record: `$2b$12$J/dtt5ybYUTCJ/dtt5ybYO`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaltString {
    pub version: Version,
    pub cost: Cost,
    pub salt: Salt,
}

impl SaltString {
    /// Accepts either the 29-character form or a bare 22-character salt.
    /// A bare salt takes `default_cost` and version `2b`.
    ///
    /// Stray low bits in the last salt character are dropped, so a parsed
    /// salt always displays in canonical form. A structurally broken prefix
    /// is reported as `InvalidSalt`; a well-formed prefix naming an unknown
    /// version or an out-of-range cost keeps its specific error.
    pub fn parse(s: &str, default_cost: Cost) -> BcryptResult<Self> {
        let invalid = || BcryptError::InvalidSalt(s.len());
        match s.len() {
            SALT_CHARS => Ok(SaltString {
                version: Version::TwoB,
                cost: default_cost,
                salt: Salt::decode_lenient(s).map_err(|_| invalid())?,
            }),
            FULL_SALT_LEN => {
                let (version, cost, rest) = parse_prefix(s).map_err(|e| match e {
                    BcryptError::MalformedRecord(_) => invalid(),
                    other => other,
                })?;
                if rest.len() != SALT_CHARS {
                    return Err(invalid());
                }
                let salt = Salt::decode_lenient(rest).map_err(|_| invalid())?;
                Ok(SaltString { version, cost, salt })
            }
            other => Err(BcryptError::InvalidSalt(other)),
        }
    }
}

impl fmt::Display for SaltString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${}${}${}", self.version, self.cost, self.salt.encode())
    }
}
