use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::engine::{self, Cost, Salt};
use crate::error::BcryptResult;
use crate::record::{self, HashRecord, SaltString, Version};

/// Something that turns passwords into storable strings and checks them.
pub trait PasswordHasher {
    fn hash(&self, password: &[u8]) -> BcryptResult<String>;

    fn verify(&self, password: &[u8], digest: &str) -> BcryptResult<bool>;
}

/// bcrypt with a fixed cost and output version.
///
/// Defaults to cost 12 and version `2b`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BcryptHasher {
    cost: Cost,
    version: Version,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> BcryptResult<Self> {
        Ok(BcryptHasher {
            cost: Cost::new(cost)?,
            version: Version::default(),
        })
    }

    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Hashes with a salt drawn from `rng`.
    pub fn hash_with_rng<R: RngCore + CryptoRng>(
        &self,
        password: &[u8],
        rng: &mut R,
    ) -> BcryptResult<HashRecord> {
        let salt = engine::generate_salt(rng)?;
        self.hash_with_salt(password, &salt)
    }

    /// Hashes with a caller-chosen salt.
    pub fn hash_with_salt(&self, password: &[u8], salt: &Salt) -> BcryptResult<HashRecord> {
        let digest = engine::hash(password, salt, self.cost)?;
        Ok(HashRecord::new(self.version, self.cost, *salt, &digest))
    }

    /// Hashes with a salt given as text, either bare (22 characters) or with
    /// its `$2b$12$` prefix. A prefix overrides this hasher's version and cost.
    pub fn hash_with_salt_str(&self, password: &[u8], salt: &str) -> BcryptResult<String> {
        let parsed = SaltString::parse(salt, self.cost)?;
        let version = if salt.len() == record::FULL_SALT_LEN {
            parsed.version
        } else {
            self.version
        };
        let digest = engine::hash(password, &parsed.salt, parsed.cost)?;
        Ok(HashRecord::new(version, parsed.cost, parsed.salt, &digest).format())
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &[u8]) -> BcryptResult<String> {
        Ok(self.hash_with_rng(password, &mut OsRng)?.format())
    }

    fn verify(&self, password: &[u8], digest: &str) -> BcryptResult<bool> {
        record::verify(password, digest)
    }
}

/// Hashes `password` at `cost` with a fresh random salt, as version `2b`.
pub fn hash<P: AsRef<[u8]>>(password: P, cost: u32) -> BcryptResult<String> {
    BcryptHasher::new(cost)?.hash(password.as_ref())
}

/// Hashes `password` with an explicit 16-byte salt.
pub fn hash_with_salt<P: AsRef<[u8]>>(
    password: P,
    cost: u32,
    salt: &[u8],
) -> BcryptResult<HashRecord> {
    let hasher = BcryptHasher::new(cost)?;
    hasher.hash_with_salt(password.as_ref(), &Salt::from_slice(salt)?)
}

/// Hashes `password` with a salt string; see [`BcryptHasher::hash_with_salt_str`].
pub fn hash_with_salt_str<P: AsRef<[u8]>>(password: P, salt: &str) -> BcryptResult<String> {
    BcryptHasher::default().hash_with_salt_str(password.as_ref(), salt)
}

/// Checks `password` against a stored bcrypt hash.
pub fn verify<P: AsRef<[u8]>>(password: P, hash: &str) -> BcryptResult<bool> {
    record::verify(password.as_ref(), hash)
}
