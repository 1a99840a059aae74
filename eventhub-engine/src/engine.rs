use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use auth_identity::{
    AccessGuard, AccountDirectory, AccountProfile, AccountRepository, AccountSummary, AuthToken,
    ForgotPasswordResponse, InMemoryAccountRepository, LoginRequest, OrganizerContext, PasswordResetConfirm,
    ProfileUpdate, RegisterRequest, RequestContext, ResetPasswordResponse, TokenAuthority,
};
use email_service::{EmailService, Notifier};
use error_common::log_error;
use event_registry::{
    EventPatch, EventRegistry, EventRepository, EventView, InMemoryEventRepository, NewEvent, RelationshipRepair,
    RemoveEventResponse, RepairReport,
};
use object_storage::{BlobSink, FileSystemBlobSink, Upload};
use std::sync::Arc;
use uuid::Uuid;

/// Collaborators the engine is wired to
pub struct Collaborators {
    pub accounts: Arc<dyn AccountRepository>,
    pub events: Arc<dyn EventRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub blobs: Arc<dyn BlobSink>,
}

/// The operations the HTTP layer calls into.
///
/// Event operations take the raw [`RequestContext`] and run the organizer
/// gate first; there is no way to reach the registry around it.
pub struct EventHub {
    directory: AccountDirectory,
    guard: AccessGuard,
    registry: EventRegistry,
    repair: RelationshipRepair,
}

fn failed(operation: &'static str, error: impl Into<EngineError>) -> EngineError {
    let error = error.into();
    log_error(operation, &error);
    error
}

impl EventHub {
    pub fn new(config: &EngineConfig, collaborators: Collaborators) -> EngineResult<Self> {
        let tokens = Arc::new(TokenAuthority::new(&config.identity)?);
        let directory = AccountDirectory::new(
            collaborators.accounts.clone(),
            tokens.clone(),
            collaborators.notifier,
            collaborators.blobs.clone(),
            config.identity.clone(),
        )?;

        Ok(Self {
            directory,
            guard: AccessGuard::new(tokens, collaborators.accounts.clone()),
            registry: EventRegistry::new(
                collaborators.events.clone(),
                collaborators.accounts.clone(),
                collaborators.blobs,
            ),
            repair: RelationshipRepair::new(collaborators.events, collaborators.accounts),
        })
    }

    /// SMTP mail and on-disk uploads over the in-memory record store
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        Self::new(
            config,
            Collaborators {
                accounts: Arc::new(InMemoryAccountRepository::new()),
                events: Arc::new(InMemoryEventRepository::new()),
                notifier: Arc::new(EmailService::new(config.email.clone())),
                blobs: Arc::new(FileSystemBlobSink::new(config.storage.clone())),
            },
        )
    }

    pub async fn register(&self, request: RegisterRequest, avatar: Option<Upload>) -> EngineResult<AuthToken> {
        self.directory
            .register(request, avatar)
            .await
            .map_err(|e| failed("register", e))
    }

    pub async fn login(&self, request: LoginRequest) -> EngineResult<AuthToken> {
        self.directory.login(request).await.map_err(|e| failed("login", e))
    }

    pub async fn verify_session(&self, token: &str) -> EngineResult<AccountProfile> {
        self.directory
            .verify_session(token)
            .await
            .map_err(|e| failed("verify_session", e))
    }

    pub async fn forgot_password(&self, email: &str) -> EngineResult<ForgotPasswordResponse> {
        self.directory
            .forgot_password(email)
            .await
            .map_err(|e| failed("forgot_password", e))
    }

    pub async fn reset_password(&self, request: PasswordResetConfirm) -> EngineResult<ResetPasswordResponse> {
        self.directory
            .reset_password(request)
            .await
            .map_err(|e| failed("reset_password", e))
    }

    /// Password change for the caller named by the bearer token
    pub async fn change_password(&self, ctx: &RequestContext, current: &str, new_password: &str) -> EngineResult<()> {
        let auth = self.guard.authenticate(ctx).await.map_err(|e| failed("change_password", e))?;
        self.directory
            .change_password(auth.account.id, current, new_password)
            .await
            .map_err(|e| failed("change_password", e))
    }

    /// Profile update for the caller named by the bearer token
    pub async fn update_profile(&self, ctx: &RequestContext, update: ProfileUpdate) -> EngineResult<AccountSummary> {
        let auth = self.guard.authenticate(ctx).await.map_err(|e| failed("update_profile", e))?;
        self.directory
            .update_profile(auth.account.id, update)
            .await
            .map_err(|e| failed("update_profile", e))
    }

    pub async fn guard_organizer_only(&self, ctx: &mut RequestContext) -> EngineResult<OrganizerContext> {
        self.guard
            .guard_organizer_only(ctx)
            .await
            .map_err(|e| failed("guard_organizer_only", e))
    }

    pub async fn create_event(
        &self,
        ctx: &mut RequestContext,
        new_event: NewEvent,
        poster: Option<Upload>,
    ) -> EngineResult<EventView> {
        let organizer = self.guard_organizer_only(ctx).await?;
        self.registry
            .create(&organizer, new_event, poster)
            .await
            .map_err(|e| failed("create_event", e))
    }

    pub async fn update_event(&self, ctx: &mut RequestContext, id: Uuid, patch: EventPatch) -> EngineResult<EventView> {
        let organizer = self.guard_organizer_only(ctx).await?;
        self.registry
            .update(&organizer, id, patch)
            .await
            .map_err(|e| failed("update_event", e))
    }

    pub async fn remove_event(&self, ctx: &mut RequestContext, id: Uuid) -> EngineResult<RemoveEventResponse> {
        let organizer = self.guard_organizer_only(ctx).await?;
        self.registry
            .remove(&organizer, id)
            .await
            .map_err(|e| failed("remove_event", e))
    }

    pub async fn list_events(&self, ctx: &mut RequestContext) -> EngineResult<Vec<EventView>> {
        let organizer = self.guard_organizer_only(ctx).await?;
        self.registry.list(&organizer).await.map_err(|e| failed("list_events", e))
    }

    pub async fn get_event(&self, ctx: &mut RequestContext, id: Uuid) -> EngineResult<EventView> {
        let organizer = self.guard_organizer_only(ctx).await?;
        self.registry
            .get(&organizer, id)
            .await
            .map_err(|e| failed("get_event", e))
    }

    /// Operator task, not exposed to request callers
    pub async fn repair_relationships(&self) -> EngineResult<RepairReport> {
        self.repair.run().await.map_err(|e| failed("repair_relationships", e))
    }
}
