use argon2::Variant;
use rand::RngCore;
use serde::{Serialize, Deserialize};
use subtle::ConstantTimeEq;

pub const SALT_LEN: usize = 32;

/// encoded-hash marker used to tell migrated records from legacy ones.
pub const HASH_PREFIX: &str = "$argon2";

pub const DEFAULT_MEM_COST: u32 = 19456;

pub type Salt = [u8; SALT_LEN];

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("stored password hash is malformed")]
    Malformed(#[source] argon2::Error),

    #[error("password hashing failed")]
    Hash(#[source] argon2::Error),
}

/// stored password material, tagged once at load time so every caller
/// matches on the scheme instead of re-sniffing the string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PasswordRecord {
    Hashed(String),
    Plaintext(String),
}

impl From<String> for PasswordRecord {
    fn from(stored: String) -> Self {
        if stored.starts_with(HASH_PREFIX) {
            PasswordRecord::Hashed(stored)
        } else {
            PasswordRecord::Plaintext(stored)
        }
    }
}

impl From<PasswordRecord> for String {
    fn from(record: PasswordRecord) -> Self {
        match record {
            PasswordRecord::Hashed(stored) |
            PasswordRecord::Plaintext(stored) => stored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCheck {
    pub valid: bool,
    /// set whenever the record was verified over the legacy plaintext
    /// path. callers are expected to force a hash upgrade on it.
    pub needs_migration: bool,
}

pub fn gen_salt() -> Salt {
    let mut salt = [0u8; SALT_LEN];

    rand::thread_rng().fill_bytes(&mut salt);

    salt
}

pub fn create(password: &str, mem_cost: u32) -> Result<String, PasswordError> {
    let salt = gen_salt();

    let mut config = argon2::Config::default();
    config.mem_cost = mem_cost;
    config.variant = Variant::Argon2id;

    argon2::hash_encoded(password.as_bytes(), &salt, &config)
        .map_err(PasswordError::Hash)
}

pub fn verify(record: &PasswordRecord, given: &str) -> Result<PasswordCheck, PasswordError> {
    match record {
        PasswordRecord::Hashed(encoded) => {
            let valid = argon2::verify_encoded(encoded, given.as_bytes())
                .map_err(PasswordError::Malformed)?;

            Ok(PasswordCheck {
                valid,
                needs_migration: false,
            })
        },
        PasswordRecord::Plaintext(stored) => {
            let valid = stored.as_bytes().ct_eq(given.as_bytes()).into();

            Ok(PasswordCheck {
                valid,
                needs_migration: true,
            })
        }
    }
}
