//! Shared integration harness: an engine over in-memory collaborators

#![allow(dead_code)]

use auth_identity::{
    Account, AccountRepository, AuthToken, IdentityConfig, InMemoryAccountRepository, LoginRequest, RegisterRequest,
    RequestContext,
};
use chrono::{Duration, Utc};
use email_service::{EmailConfig, InMemoryNotifier};
use event_registry::{InMemoryEventRepository, NewEvent};
use eventhub_engine::{Collaborators, EngineConfig, EventHub};
use logger_redacted::LoggerConfig;
use object_storage::{InMemoryBlobSink, StorageConfig};
use std::sync::Arc;
use uuid::Uuid;

pub const PASSWORD: &str = "s3cret-pass";

pub struct TestHarness {
    pub hub: EventHub,
    pub accounts: Arc<InMemoryAccountRepository>,
    pub events: Arc<InMemoryEventRepository>,
    pub notifier: Arc<InMemoryNotifier>,
    pub blobs: Arc<InMemoryBlobSink>,
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        identity: IdentityConfig::for_testing(),
        email: EmailConfig::default(),
        storage: StorageConfig::default(),
        logger: LoggerConfig::default(),
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_notifier(config, InMemoryNotifier::new())
    }

    pub fn with_notifier(config: EngineConfig, notifier: InMemoryNotifier) -> Self {
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let events = Arc::new(InMemoryEventRepository::new());
        let notifier = Arc::new(notifier);
        let blobs = Arc::new(InMemoryBlobSink::new(config.storage.clone()));

        let hub = EventHub::new(
            &config,
            Collaborators {
                accounts: accounts.clone(),
                events: events.clone(),
                notifier: notifier.clone(),
                blobs: blobs.clone(),
            },
        )
        .expect("Failed to build engine");

        Self {
            hub,
            accounts,
            events,
            notifier,
            blobs,
        }
    }

    /// Register an account and return its session token and stored record
    pub async fn register(&self, email: &str, role: &str) -> (AuthToken, Account) {
        let token = self
            .hub
            .register(registration(email, role), None)
            .await
            .expect("Failed to register");
        (token, self.account_by_email(email).await)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken, eventhub_engine::EngineError> {
        self.hub
            .login(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
    }

    pub async fn account(&self, id: Uuid) -> Account {
        self.accounts
            .find_by_id(id)
            .await
            .expect("Store lookup failed")
            .expect("Account should exist")
    }

    pub async fn account_by_email(&self, email: &str) -> Account {
        self.accounts
            .find_by_email(email)
            .await
            .expect("Store lookup failed")
            .expect("Account should exist")
    }
}

pub fn registration(email: &str, role: &str) -> RegisterRequest {
    RegisterRequest {
        first_name: "Margaret".into(),
        last_name: "Hamilton".into(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role: role.to_string(),
        gender: None,
    }
}

pub fn bearer(token: &AuthToken) -> RequestContext {
    RequestContext::new().with_authorization(format!("Bearer {}", token.token))
}

pub fn new_event(title: &str, participants: Vec<Uuid>) -> NewEvent {
    let start_date = Utc::now() + Duration::days(30);
    NewEvent {
        title: title.to_string(),
        description: "Quarterly community meetup".into(),
        location: "Room 101".into(),
        start_date,
        end_date: start_date + Duration::hours(2),
        status: Default::default(),
        organizer: None,
        participants,
    }
}

pub fn occurrences(ids: &[Uuid], id: Uuid) -> usize {
    ids.iter().filter(|candidate| **candidate == id).count()
}
