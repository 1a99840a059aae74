use crate::error::{EngineError, EngineResult};
use auth_identity::IdentityConfig;
use email_service::EmailConfig;
use logger_redacted::LoggerConfig;
use object_storage::StorageConfig;
use std::path::PathBuf;
use std::str::FromStr;

/// Everything the engine needs at startup, built once and injected
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub identity: IdentityConfig,
    pub email: EmailConfig,
    pub storage: StorageConfig,
    pub logger: LoggerConfig,
}

impl EngineConfig {
    /// Load configuration from the process environment, reading `.env` first
    /// if one exists.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] if `JWT_SECRET` or `JWT_RESET_SECRET` is
    /// missing, a number does not parse, or the identity settings do not
    /// validate.
    pub fn from_env() -> EngineResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(EngineError::Config(format!("failed to read .env: {e}")));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with values supplied by `lookup`
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| EngineError::Config(format!("{key} is not set")))
        };

        let mut identity = IdentityConfig::new(required("JWT_SECRET")?, required("JWT_RESET_SECRET")?);
        if let Some(ttl) = parsed(&lookup, "JWT_TTL_SECONDS")? {
            identity.session_ttl_seconds = ttl;
        }
        if let Some(ttl) = parsed(&lookup, "RESET_TTL_SECONDS")? {
            identity.reset_ttl_seconds = ttl;
        }
        if let Some(client_url) = lookup("CLIENT_URL") {
            identity.client_url = client_url;
        }
        if let Some(issuer) = lookup("JWT_ISSUER") {
            identity.issuer = issuer;
        }
        identity
            .validate()
            .map_err(|e| EngineError::Config(e.to_string()))?;

        let mut storage = StorageConfig::default();
        if let Some(server_url) = lookup("SERVER_URL") {
            storage.server_url = server_url;
        }
        if let Some(upload_dir) = lookup("UPLOAD_DIR") {
            storage.upload_dir = PathBuf::from(upload_dir);
        }
        if let Some(limit) = parsed(&lookup, "MAX_UPLOAD_BYTES")? {
            storage.max_upload_bytes = limit;
        }

        let mut logger = LoggerConfig::default();
        if let Some(level) = lookup("LOG_LEVEL") {
            logger.log_level = level;
        }
        if let Some(json) = parsed(&lookup, "LOG_JSON")? {
            logger.json = json;
        }

        Ok(Self {
            identity,
            email: EmailConfig::from_lookup(&lookup),
            storage,
            logger,
        })
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> EngineResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| EngineError::Config(format!("{key} has an invalid value '{raw}'")))
        })
        .transpose()
}
