use crate::{config::*, error::*, models::*, password::SecretHasher, repository::*, tokens::TokenAuthority};
use chrono::Utc;
use email_service::{password_reset_email, Notifier};
use logger_redacted::redact;
use object_storage::{ensure_supported_image, BlobSink, Upload};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const PASSWORD_RESET_MESSAGE: &str = "Password has been successfully reset";

/// Registration, login and the password flows of the account collection
pub struct AccountDirectory {
    accounts: Arc<dyn AccountRepository>,
    tokens: Arc<TokenAuthority>,
    notifier: Arc<dyn Notifier>,
    blobs: Arc<dyn BlobSink>,
    hasher: SecretHasher,
    config: IdentityConfig,
}

struct ValidRegistration {
    role: Role,
    gender: Option<Gender>,
}

impl AccountDirectory {
    /// # Errors
    ///
    /// Returns [`IdentityError::Configuration`] for unusable hashing or token
    /// settings.
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tokens: Arc<TokenAuthority>,
        notifier: Arc<dyn Notifier>,
        blobs: Arc<dyn BlobSink>,
        config: IdentityConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            accounts,
            tokens,
            notifier,
            blobs,
            hasher: SecretHasher::new(&config)?,
            config,
        })
    }

    /// Create an account and return a session token for it.
    ///
    /// Input is validated before anything is written. The avatar, if any, is
    /// stored first so a rejected upload never leaves an account behind.
    #[instrument(skip_all)]
    pub async fn register(&self, request: RegisterRequest, avatar: Option<Upload>) -> Result<AuthToken> {
        let valid = self.validate_registration(&request, avatar.as_ref())?;

        // Read-then-write: a concurrent duplicate is caught by the store's unique index
        if self.accounts.find_by_email(&request.email).await?.is_some() {
            return Err(IdentityError::EmailAlreadyInUse);
        }

        let avatar_url = match avatar {
            Some(upload) => Some(
                self.blobs
                    .store(&upload.bytes, &upload.mime_type, upload.file_name.as_deref())
                    .await?,
            ),
            None => None,
        };

        let password_hash = self.hash_secret(&request.password).await?;
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email: request.email,
            password_hash,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            role: valid.role,
            gender: valid.gender,
            is_banned: false,
            avatar_url,
            created_events: Vec::new(),
            attending_events: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let account = self.accounts.create(&account).await.map_err(|e| {
            if matches!(e, IdentityError::EmailAlreadyInUse) {
                warn!(
                    email = %redact(&account.email),
                    orphaned_avatar = account.avatar_url.as_deref().unwrap_or("none"),
                    "duplicate registration lost the race"
                );
            }
            e
        })?;

        let issued = self.tokens.issue_session(account.id, &account.email, Some(account.role))?;
        info!(account_id = %account.id, email = %redact(&account.email), role = %account.role, "account registered");
        Ok(AuthToken {
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Unknown email and wrong password fail identically.
    #[instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthToken> {
        let Some(account) = self.accounts.find_by_email(&request.email).await? else {
            info!(email = %redact(&request.email), "login rejected");
            return Err(IdentityError::InvalidCredentials);
        };

        if !self.verify_secret(&request.password, &account.password_hash).await? {
            info!(email = %redact(&request.email), "login rejected");
            return Err(IdentityError::InvalidCredentials);
        }

        let issued = self.tokens.issue_session(account.id, &account.email, Some(account.role))?;
        info!(account_id = %account.id, "login succeeded");
        Ok(AuthToken {
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    pub async fn verify_session(&self, token: &str) -> Result<AccountProfile> {
        let claims = self.tokens.verify_session(token)?;
        let account = self
            .accounts
            .find_by_id(claims.account_id()?)
            .await?
            .ok_or(IdentityError::UnknownAccount)?;
        Ok(AccountProfile::from(&account))
    }

    /// Mail a reset link to the account. Discloses whether the email is
    /// registered. A delivery failure is reported after the token was issued.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordResponse> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(IdentityError::UnknownEmail)?;

        let issued = self.tokens.issue_reset(account.id, &account.email)?;
        let link = format!(
            "{}/reset-password?token={}",
            self.config.client_url.trim_end_matches('/'),
            issued.token
        );
        let rendered = password_reset_email(&link, self.config.reset_ttl_seconds / 60);

        match self
            .notifier
            .send(&account.email, &rendered.subject, &rendered.html_body)
            .await
        {
            Ok(message_id) => {
                info!(account_id = %account.id, message_id = %message_id, "password reset email sent");
                Ok(ForgotPasswordResponse { email: account.email })
            }
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "password reset email failed");
                Err(IdentityError::EmailDeliveryFailed(e))
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn reset_password(&self, request: PasswordResetConfirm) -> Result<ResetPasswordResponse> {
        let claims = self.tokens.verify_reset(&request.token)?;
        let account_id = claims.account_id()?;
        if self.accounts.find_by_id(account_id).await?.is_none() {
            return Err(IdentityError::UnknownAccount);
        }

        self.validate_password(&request.new_password)?;
        let password_hash = self.hash_secret(&request.new_password).await?;
        if !self.accounts.update_password(account_id, &password_hash).await? {
            return Err(IdentityError::UnknownAccount);
        }

        info!(account_id = %account_id, "password reset");
        Ok(ResetPasswordResponse {
            message: PASSWORD_RESET_MESSAGE.to_string(),
        })
    }

    /// Change the password of a logged-in account after re-checking the current one.
    #[instrument(skip_all, fields(account_id = %account_id))]
    pub async fn change_password(&self, account_id: Uuid, current: &str, new_password: &str) -> Result<()> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(IdentityError::AccountNotFound(account_id))?;

        if !self.verify_secret(current, &account.password_hash).await? {
            return Err(IdentityError::InvalidCredentials);
        }

        self.validate_password(new_password)?;
        let password_hash = self.hash_secret(new_password).await?;
        if !self.accounts.update_password(account_id, &password_hash).await? {
            return Err(IdentityError::AccountNotFound(account_id));
        }
        info!("password changed");
        Ok(())
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
        let accounts = self.accounts.find_many(&AccountFilter::All).await?;
        Ok(accounts.iter().map(AccountSummary::from).collect())
    }

    pub async fn get_account(&self, id: Uuid) -> Result<AccountSummary> {
        self.accounts
            .find_by_id(id)
            .await?
            .map(|account| AccountSummary::from(&account))
            .ok_or(IdentityError::AccountNotFound(id))
    }

    /// Names, gender and avatar only. Passwords and relationship sets have
    /// their own flows.
    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<AccountSummary> {
        if update.is_empty() {
            return Err(IdentityError::Validation("no profile fields to update".into()));
        }
        for name in [&update.first_name, &update.last_name].into_iter().flatten() {
            self.validate_name(name)?;
        }

        let account = self
            .accounts
            .update_profile(id, &update)
            .await?
            .ok_or(IdentityError::AccountNotFound(id))?;
        Ok(AccountSummary::from(&account))
    }

    fn validate_registration(&self, request: &RegisterRequest, avatar: Option<&Upload>) -> Result<ValidRegistration> {
        if !is_valid_email(&request.email) {
            return Err(IdentityError::Validation("email must be a valid address".into()));
        }
        self.validate_name(&request.first_name)?;
        self.validate_name(&request.last_name)?;
        self.validate_password(&request.password)?;

        let role = request.role.parse::<Role>().map_err(IdentityError::Validation)?;
        let gender = match request.gender.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(value.parse::<Gender>().map_err(IdentityError::Validation)?),
        };
        if let Some(upload) = avatar {
            ensure_supported_image(&upload.mime_type)?;
        }

        Ok(ValidRegistration { role, gender })
    }

    fn validate_name(&self, name: &str) -> Result<()> {
        if name.trim().chars().count() < self.config.name_min_length {
            return Err(IdentityError::Validation(format!(
                "names must be at least {} characters",
                self.config.name_min_length
            )));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<()> {
        let length = password.chars().count();
        if length < self.config.password_min_length || length > self.config.password_max_length {
            return Err(IdentityError::Validation(format!(
                "password must be between {} and {} characters",
                self.config.password_min_length, self.config.password_max_length
            )));
        }
        Ok(())
    }

    async fn hash_secret(&self, plaintext: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|_| IdentityError::HashingError)?
    }

    async fn verify_secret(&self, plaintext: &str, digest: &str) -> Result<bool> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .map_err(|_| IdentityError::HashingError)
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}
