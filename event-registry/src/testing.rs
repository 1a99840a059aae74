//! Shared fixtures for the unit tests of this crate

use crate::models::NewEvent;
use crate::registry::EventRegistry;
use crate::repository::InMemoryEventRepository;
use crate::RelationshipRepair;
use async_trait::async_trait;
use auth_identity::{
    AccessGuard, Account, AccountFilter, AccountRepository, IdentityConfig, IdentityError, InMemoryAccountRepository,
    OrganizerContext, ProfileUpdate, RelationPatch, RequestContext, Role, TokenAuthority,
};
use chrono::{Duration, Utc};
use object_storage::InMemoryBlobSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Account store whose relationship writes can be switched to fail
#[derive(Default)]
pub struct FlakyAccounts {
    inner: InMemoryAccountRepository,
    fail_relations: AtomicBool,
}

impl FlakyAccounts {
    pub fn fail_relation_writes(&self, fail: bool) {
        self.fail_relations.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountRepository for FlakyAccounts {
    async fn create(&self, account: &Account) -> auth_identity::Result<Account> {
        self.inner.create(account).await
    }

    async fn find_by_id(&self, id: Uuid) -> auth_identity::Result<Option<Account>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> auth_identity::Result<Option<Account>> {
        self.inner.find_by_email(email).await
    }

    async fn find_many(&self, filter: &AccountFilter) -> auth_identity::Result<Vec<Account>> {
        self.inner.find_many(filter).await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> auth_identity::Result<bool> {
        self.inner.update_password(id, password_hash).await
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> auth_identity::Result<Option<Account>> {
        self.inner.update_profile(id, update).await
    }

    async fn update_relations(&self, filter: &AccountFilter, patch: &RelationPatch) -> auth_identity::Result<u64> {
        if self.fail_relations.load(Ordering::SeqCst) {
            return Err(IdentityError::Store(anyhow::anyhow!("connection reset")));
        }
        self.inner.update_relations(filter, patch).await
    }
}

pub struct World {
    pub registry: EventRegistry,
    pub repair: RelationshipRepair,
    pub events: Arc<InMemoryEventRepository>,
    pub accounts: Arc<FlakyAccounts>,
    pub organizer: Account,
    pub organizer_ctx: OrganizerContext,
}

impl World {
    pub async fn new() -> Self {
        let events = Arc::new(InMemoryEventRepository::new());
        let accounts = Arc::new(FlakyAccounts::default());
        let tokens = Arc::new(TokenAuthority::new(&IdentityConfig::for_testing()).unwrap());

        let organizer = insert_account(&accounts, "organizer@example.com", Role::Organizer).await;
        let token = tokens.issue_session(organizer.id, &organizer.email, Some(Role::Organizer)).unwrap();
        let guard = AccessGuard::new(tokens, accounts.clone());
        let mut ctx = RequestContext::new().with_authorization(format!("Bearer {}", token.token));
        let organizer_ctx = guard.guard_organizer_only(&mut ctx).await.unwrap();

        Self {
            registry: EventRegistry::new(events.clone(), accounts.clone(), Arc::new(InMemoryBlobSink::default())),
            repair: RelationshipRepair::new(events.clone(), accounts.clone()),
            events,
            accounts,
            organizer,
            organizer_ctx,
        }
    }

    pub async fn account(&self, email: &str, role: Role) -> Account {
        insert_account(&self.accounts, email, role).await
    }

    pub async fn reload(&self, id: Uuid) -> Account {
        self.accounts.find_by_id(id).await.unwrap().unwrap()
    }
}

async fn insert_account(accounts: &FlakyAccounts, email: &str, role: Role) -> Account {
    let now = Utc::now();
    accounts
        .create(&Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "digest".into(),
            first_name: "Test".into(),
            last_name: "Account".into(),
            role,
            gender: None,
            is_banned: false,
            avatar_url: None,
            created_events: Vec::new(),
            attending_events: Vec::new(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub fn new_event(title: &str, participants: Vec<Uuid>) -> NewEvent {
    let start_date = Utc::now() + Duration::days(7);
    NewEvent {
        title: title.to_string(),
        description: "An evening of talks".into(),
        location: "Lisbon".into(),
        start_date,
        end_date: start_date + Duration::hours(3),
        status: Default::default(),
        organizer: None,
        participants,
    }
}
