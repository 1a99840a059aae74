use crate::error::{IdentityError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const REDACTED: &str = "[REDACTED]";

#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// HMAC secret for session tokens
    pub session_secret: String,
    /// HMAC secret for password-reset tokens, must differ from `session_secret`
    pub reset_secret: String,
    pub session_ttl_seconds: i64,
    pub reset_ttl_seconds: i64,
    pub issuer: String,
    /// Base URL of the client app, reset links point at `<client_url>/reset-password`
    pub client_url: String,
    pub password_min_length: usize,
    pub password_max_length: usize,
    pub name_min_length: usize,
    /// Argon2id memory cost in KiB
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("session_secret", &REDACTED)
            .field("reset_secret", &REDACTED)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("reset_ttl_seconds", &self.reset_ttl_seconds)
            .field("issuer", &self.issuer)
            .field("client_url", &self.client_url)
            .field("password_min_length", &self.password_min_length)
            .field("password_max_length", &self.password_max_length)
            .field("name_min_length", &self.name_min_length)
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_iterations", &self.hash_iterations)
            .field("hash_parallelism", &self.hash_parallelism)
            .finish()
    }
}

impl IdentityConfig {
    pub fn new(session_secret: impl Into<String>, reset_secret: impl Into<String>) -> Self {
        Self {
            session_secret: session_secret.into(),
            reset_secret: reset_secret.into(),
            session_ttl_seconds: 3600,
            reset_ttl_seconds: 3600,
            issuer: "eventhub".to_string(),
            client_url: "http://localhost:5173".to_string(),
            password_min_length: 7,
            password_max_length: 32,
            name_min_length: 3,
            hash_memory_kib: 19_456,
            hash_iterations: 2,
            hash_parallelism: 1,
        }
    }

    /// Cheap hashing parameters so test suites stay fast
    pub fn for_testing() -> Self {
        Self {
            hash_memory_kib: 1024,
            hash_iterations: 1,
            ..Self::new("test-session-secret", "test-reset-secret")
        }
    }

    /// # Errors
    ///
    /// Returns [`IdentityError::Configuration`] when a secret is empty, both
    /// secrets are the same, or a lifetime is not positive.
    pub fn validate(&self) -> Result<()> {
        if self.session_secret.is_empty() || self.reset_secret.is_empty() {
            return Err(IdentityError::Configuration("token secrets must not be empty".into()));
        }
        if self.session_secret == self.reset_secret {
            return Err(IdentityError::Configuration(
                "session and reset tokens must use different secrets".into(),
            ));
        }
        if self.session_ttl_seconds <= 0 || self.reset_ttl_seconds <= 0 {
            return Err(IdentityError::Configuration("token lifetimes must be positive".into()));
        }
        if self.password_min_length > self.password_max_length {
            return Err(IdentityError::Configuration("password length bounds are inverted".into()));
        }
        Ok(())
    }
}
