//! Role gate in front of privileged operations
//!
//! The guard reads the `Authorization` header of an inbound call, verifies it
//! as a session token and re-loads the account from the directory. The role
//! claim inside the token is never trusted on its own.

use crate::error::{IdentityError, Result};
use crate::models::{Account, Role};
use crate::repository::AccountRepository;
use crate::tokens::{TokenAuthority, TokenClaims};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

const BEARER_PREFIX: &str = "Bearer ";

/// Per-call request state handed to the guard
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// Raw `Authorization` header value
    pub authorization: Option<String>,
    /// Set by the guard once the caller is authenticated
    pub auth: Option<AuthContext>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            authorization: None,
            auth: None,
        }
    }

    pub fn with_authorization(mut self, header: impl Into<String>) -> Self {
        self.authorization = Some(header.into());
        self
    }

    /// Build from header pairs, matching the header name case-insensitively
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let authorization = headers
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            .map(|(_, value)| value.to_string());
        Self {
            authorization,
            ..Self::new()
        }
    }

    pub fn account(&self) -> Option<&Account> {
        self.auth.as_ref().map(|auth| &auth.account)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Authenticated caller attached to a request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account: Account,
    pub claims: TokenClaims,
}

/// Proof that the caller was verified as an Organizer.
///
/// Only [`AccessGuard::guard_organizer_only`] can build one, so any operation
/// taking `&OrganizerContext` cannot be reached without passing the guard.
#[derive(Debug, Clone)]
pub struct OrganizerContext {
    account: Account,
}

impl OrganizerContext {
    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn account_id(&self) -> Uuid {
        self.account.id
    }
}

pub struct AccessGuard {
    tokens: Arc<TokenAuthority>,
    accounts: Arc<dyn AccountRepository>,
}

impl AccessGuard {
    pub fn new(tokens: Arc<TokenAuthority>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { tokens, accounts }
    }

    /// Pull the token out of a `Bearer <token>` header value.
    ///
    /// # Errors
    ///
    /// [`IdentityError::MissingBearerToken`] when the header is absent, uses
    /// another scheme, or the token is empty or padded with extra whitespace.
    pub fn extract_bearer(header: Option<&str>) -> Result<&str> {
        let token = header
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .ok_or(IdentityError::MissingBearerToken)?;

        if token.is_empty() || token.contains(char::is_whitespace) {
            return Err(IdentityError::MissingBearerToken);
        }
        Ok(token)
    }

    /// Verify the bearer token and load the account it names.
    ///
    /// # Errors
    ///
    /// [`IdentityError::MissingBearerToken`] before any verification,
    /// [`IdentityError::InvalidToken`] for bad tokens and
    /// [`IdentityError::UnknownAccount`] when the account is gone.
    pub async fn authenticate(&self, ctx: &RequestContext) -> Result<AuthContext> {
        let token = Self::extract_bearer(ctx.authorization.as_deref())?;
        let claims = self.tokens.verify_session(token)?;
        let account = self
            .accounts
            .find_by_id(claims.account_id()?)
            .await?
            .ok_or(IdentityError::UnknownAccount)?;

        Ok(AuthContext { account, claims })
    }

    /// Admit only callers whose stored role is [`Role::Organizer`].
    ///
    /// On success the authenticated account is attached to `ctx`; on failure
    /// `ctx` is left untouched.
    #[instrument(skip_all, fields(request_id = %ctx.request_id))]
    pub async fn guard_organizer_only(&self, ctx: &mut RequestContext) -> Result<OrganizerContext> {
        let auth = self.authenticate(ctx).await?;
        if auth.account.role != Role::Organizer {
            debug!(account_id = %auth.account.id, role = %auth.account.role, "organizer role required");
            return Err(IdentityError::InsufficientRole);
        }

        let organizer = OrganizerContext {
            account: auth.account.clone(),
        };
        ctx.auth = Some(auth);
        Ok(organizer)
    }
}
