//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  Parameters are configurable via `Argon2Params`
//! (loaded from `config.toml` or sensible defaults) and are persisted in
//! the vault header, so a vault always re-opens with the cost it was
//! written with.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use tracing::debug;

use super::keys::{MasterKey, KEY_LEN};
use crate::errors::{PassLocalError, Result};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
pub const MIN_MEMORY_KIB: u32 = 8_192;

/// Maximum memory cost in KiB (4 GB).  Caps what a hostile header can
/// make us allocate.
pub const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;

/// Maximum iteration count.  Bounds how long a hostile header can make
/// an unlock attempt run.
pub const MAX_ITERATIONS: u32 = 64;

/// Maximum number of lanes.
pub const MAX_PARALLELISM: u32 = 64;

/// Configurable Argon2id parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Argon2Params {
    /// Reject parameter sets that are dangerously weak or absurdly large.
    pub fn validate(&self) -> Result<()> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(PassLocalError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if self.memory_kib > MAX_MEMORY_KIB {
            return Err(PassLocalError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be at most {MAX_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if !(1..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(PassLocalError::KeyDerivationFailed(format!(
                "Argon2 iterations must be between 1 and {MAX_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        if !(1..=MAX_PARALLELISM).contains(&self.parallelism) {
            return Err(PassLocalError::KeyDerivationFailed(format!(
                "Argon2 parallelism must be between 1 and {MAX_PARALLELISM} (got {})",
                self.parallelism
            )));
        }

        // Anything else the argon2 crate refuses fails here, not at
        // derive time.
        self.to_params()?;
        Ok(())
    }

    fn to_params(&self) -> Result<Params> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| PassLocalError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))
    }
}

/// Derive the master key from a password and salt using the default
/// Argon2id parameters (64 MB, 3 iterations, 4 lanes).
pub fn derive_master_key(password: &[u8], salt: &[u8]) -> Result<MasterKey> {
    derive_master_key_with_params(password, salt, &Argon2Params::default())
}

/// Derive the master key with explicit Argon2id parameters.
///
/// The same password + salt + params always produce the same key.
/// A salt that is not exactly `SALT_LEN` bytes means the vault file is
/// corrupt.
pub fn derive_master_key_with_params(
    password: &[u8],
    salt: &[u8],
    argon2_params: &Argon2Params,
) -> Result<MasterKey> {
    if salt.len() != SALT_LEN {
        return Err(PassLocalError::Corrupt(format!(
            "salt must be {SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }
    argon2_params.validate()?;

    let params = argon2_params.to_params()?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    debug!(
        memory_kib = argon2_params.memory_kib,
        iterations = argon2_params.iterations,
        parallelism = argon2_params.parallelism,
        "deriving master key"
    );

    let mut key = MasterKey::zeroed();
    argon2
        .hash_password_into(password, salt, key.as_mut_bytes())
        .map_err(|e| PassLocalError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Argon2Params {
        Argon2Params {
            memory_kib: MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn rejects_short_salt_as_corrupt() {
        let err = derive_master_key_with_params(b"pw", &[0u8; 8], &fast()).unwrap_err();
        assert!(matches!(err, PassLocalError::Corrupt(_)));
    }

    #[test]
    fn rejects_weak_params() {
        let weak = Argon2Params {
            memory_kib: 1024,
            ..fast()
        };
        let err = derive_master_key_with_params(b"pw", &[0u8; SALT_LEN], &weak).unwrap_err();
        assert!(matches!(err, PassLocalError::KeyDerivationFailed(_)));
    }

    #[test]
    fn rejects_oversized_memory() {
        let huge = Argon2Params {
            memory_kib: MAX_MEMORY_KIB + 1,
            ..fast()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn rejects_unbounded_time_and_lanes() {
        let slow = Argon2Params {
            memory_kib: MAX_MEMORY_KIB,
            iterations: u32::MAX,
            parallelism: 1,
        };
        assert!(slow.validate().is_err());

        let wide = Argon2Params {
            parallelism: MAX_PARALLELISM + 1,
            ..fast()
        };
        assert!(wide.validate().is_err());

        let edge = Argon2Params {
            iterations: MAX_ITERATIONS,
            parallelism: MAX_PARALLELISM,
            ..fast()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn validated_corner_params_derive() {
        let widest = Argon2Params {
            memory_kib: MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: MAX_PARALLELISM,
        };
        assert!(widest.validate().is_ok());
        assert!(derive_master_key_with_params(b"pw", &[0u8; SALT_LEN], &widest).is_ok());
    }

    #[test]
    fn params_change_the_key() {
        let salt = [7u8; SALT_LEN];
        let a = derive_master_key_with_params(b"pw", &salt, &fast()).unwrap();
        let b = derive_master_key_with_params(
            b"pw",
            &salt,
            &Argon2Params {
                iterations: 2,
                ..fast()
            },
        )
        .unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
