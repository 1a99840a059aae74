use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand_core::OsRng;

/// One-way password hashing with Argon2id.
///
/// Cost is taken from [`IdentityConfig`]. Digests are PHC strings, so
/// parameters travel with each hash and older digests still verify after a
/// cost change.
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl SecretHasher {
    /// # Errors
    ///
    /// Returns [`IdentityError::Configuration`] when the cost parameters are
    /// outside what Argon2 accepts.
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let params = Params::new(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
            None,
        )
        .map_err(|e| IdentityError::Configuration(format!("invalid argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// # Errors
    ///
    /// Returns [`IdentityError::HashingError`] if Argon2 fails.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| IdentityError::HashingError)?
            .to_string();
        Ok(password_hash)
    }

    /// A malformed digest never verifies.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(digest) else {
            tracing::warn!("stored password digest is not a valid PHC string");
            return false;
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
