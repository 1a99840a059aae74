//! Session and password-reset token services
//!
//! Both token classes are HS256 JWTs, but each is signed with its own secret
//! and carries its own `purpose` claim, so one can never stand in for the other.

use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use crate::models::Role;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Session,
    Reset,
}

/// JWT token claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (account ID)
    pub sub: String,

    /// JWT ID
    pub jti: String,

    pub email: String,

    /// Present on session tokens minted at registration and login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    pub purpose: TokenPurpose,

    /// Issued at timestamp (seconds since epoch)
    pub iat: i64,

    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,

    pub iss: String,
}

impl TokenClaims {
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] if `sub` is not a UUID.
    pub fn account_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| IdentityError::InvalidToken)
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn from_secret(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_seconds),
        }
    }
}

/// Signed token with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session and reset tokens
pub struct TokenAuthority {
    session: SigningKeys,
    reset: SigningKeys,
    issuer: String,
}

impl TokenAuthority {
    /// # Errors
    ///
    /// Fails with [`IdentityError::Configuration`] if the configuration does
    /// not validate (empty or shared secrets, non-positive lifetimes).
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session: SigningKeys::from_secret(&config.session_secret, config.session_ttl_seconds),
            reset: SigningKeys::from_secret(&config.reset_secret, config.reset_ttl_seconds),
            issuer: config.issuer.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns [`IdentityError::TokenSigning`] if encoding fails.
    pub fn issue_session(&self, account_id: Uuid, email: &str, role: Option<Role>) -> Result<IssuedToken> {
        self.sign_at(TokenPurpose::Session, account_id, email, role, Utc::now())
    }

    /// # Errors
    ///
    /// Returns [`IdentityError::TokenSigning`] if encoding fails.
    pub fn issue_reset(&self, account_id: Uuid, email: &str) -> Result<IssuedToken> {
        self.sign_at(TokenPurpose::Reset, account_id, email, None, Utc::now())
    }

    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] on a bad signature, expiry,
    /// wrong issuer or a token of the other purpose.
    pub fn verify_session(&self, token: &str) -> Result<TokenClaims> {
        self.verify(TokenPurpose::Session, token)
    }

    /// # Errors
    ///
    /// Same failure modes as [`TokenAuthority::verify_session`], checked
    /// against the reset secret.
    pub fn verify_reset(&self, token: &str) -> Result<TokenClaims> {
        self.verify(TokenPurpose::Reset, token)
    }

    fn keys(&self, purpose: TokenPurpose) -> &SigningKeys {
        match purpose {
            TokenPurpose::Session => &self.session,
            TokenPurpose::Reset => &self.reset,
        }
    }

    pub(crate) fn sign_at(
        &self,
        purpose: TokenPurpose,
        account_id: Uuid,
        email: &str,
        role: Option<Role>,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let keys = self.keys(purpose);
        let expires_at = issued_at + keys.ttl;
        let claims = TokenClaims {
            sub: account_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
            purpose,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| IdentityError::TokenSigning(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, purpose: TokenPurpose, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<TokenClaims>(token, &self.keys(purpose).decoding, &validation)
            .map_err(|e| {
                tracing::debug!(?purpose, error = %e, "token rejected");
                IdentityError::InvalidToken
            })?;

        if token_data.claims.purpose != purpose {
            tracing::debug!(?purpose, "token purpose mismatch");
            return Err(IdentityError::InvalidToken);
        }

        Ok(token_data.claims)
    }
}
