use crate::{error::*, models::*};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The two relationship sets an account carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSet {
    CreatedEvents,
    AttendingEvents,
}

/// Which accounts a multi-document update touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    All,
    Id(Uuid),
    IdIn(Vec<Uuid>),
    /// Accounts whose relationship set contains the event
    Listing { set: RelationSet, event_id: Uuid },
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        match self {
            AccountFilter::All => true,
            AccountFilter::Id(id) => account.id == *id,
            AccountFilter::IdIn(ids) => ids.contains(&account.id),
            AccountFilter::Listing { set, event_id } => relation(account, *set).contains(event_id),
        }
    }
}

/// Change applied to one relationship set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationPatch {
    /// Append unless already present
    AddToSet { set: RelationSet, event_id: Uuid },
    /// Remove every occurrence
    Pull { set: RelationSet, event_id: Uuid },
    /// Overwrite the whole set
    Replace { set: RelationSet, events: Vec<Uuid> },
}

impl RelationPatch {
    /// Returns true if the account changed
    pub fn apply(&self, account: &mut Account) -> bool {
        let changed = match self {
            RelationPatch::AddToSet { set, event_id } => {
                let events = relation_mut(account, *set);
                if events.contains(event_id) {
                    false
                } else {
                    events.push(*event_id);
                    true
                }
            }
            RelationPatch::Pull { set, event_id } => {
                let events = relation_mut(account, *set);
                let before = events.len();
                events.retain(|id| id != event_id);
                events.len() != before
            }
            RelationPatch::Replace { set, events } => {
                let current = relation_mut(account, *set);
                if *current == *events {
                    false
                } else {
                    current.clone_from(events);
                    true
                }
            }
        };
        if changed {
            account.updated_at = Utc::now();
        }
        changed
    }
}

pub fn relation(account: &Account, set: RelationSet) -> &Vec<Uuid> {
    match set {
        RelationSet::CreatedEvents => &account.created_events,
        RelationSet::AttendingEvents => &account.attending_events,
    }
}

fn relation_mut(account: &mut Account, set: RelationSet) -> &mut Vec<Uuid> {
    match set {
        RelationSet::CreatedEvents => &mut account.created_events,
        RelationSet::AttendingEvents => &mut account.attending_events,
    }
}

/// Account collection of the record store
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account. A duplicate email is reported as
    /// [`IdentityError::EmailAlreadyInUse`].
    async fn create(&self, account: &Account) -> Result<Account>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
    async fn find_many(&self, filter: &AccountFilter) -> Result<Vec<Account>>;
    /// Returns false when no account has this id
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool>;
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<Account>>;
    /// Apply the patch to every matching account, returning how many changed
    async fn update_relations(&self, filter: &AccountFilter, patch: &RelationPatch) -> Result<u64>;
}

#[derive(Default)]
struct AccountTable {
    accounts: HashMap<Uuid, Account>,
    email_index: HashMap<String, Uuid>,
}

/// In-memory implementation for development/testing
#[derive(Default, Clone)]
pub struct InMemoryAccountRepository {
    table: Arc<RwLock<AccountTable>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: &Account) -> Result<Account> {
        let mut table = self.table.write().await;
        // Unique index on email, checked under the write lock
        if table.email_index.contains_key(&account.email) {
            return Err(IdentityError::EmailAlreadyInUse);
        }
        table.email_index.insert(account.email.clone(), account.id);
        table.accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.table.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let table = self.table.read().await;
        Ok(table
            .email_index
            .get(email)
            .and_then(|id| table.accounts.get(id))
            .cloned())
    }

    async fn find_many(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let table = self.table.read().await;
        let mut found: Vec<Account> = table
            .accounts
            .values()
            .filter(|account| filter.matches(account))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let mut table = self.table.write().await;
        match table.accounts.get_mut(&id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<Account>> {
        let mut table = self.table.write().await;
        Ok(table.accounts.get_mut(&id).map(|account| {
            update.apply(account);
            account.clone()
        }))
    }

    async fn update_relations(&self, filter: &AccountFilter, patch: &RelationPatch) -> Result<u64> {
        let mut table = self.table.write().await;
        let mut modified = 0;
        for account in table.accounts.values_mut().filter(|a| filter.matches(a)) {
            if patch.apply(account) {
                modified += 1;
            }
        }
        Ok(modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(email: &str) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "digest".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            role: Role::Participant,
            gender: None,
            is_banned: false,
            avatar_url: None,
            created_events: Vec::new(),
            attending_events: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_by_store() {
        let repo = InMemoryAccountRepository::new();
        repo.create(&account("dup@example.com")).await.unwrap();

        let second = repo.create(&account("dup@example.com")).await;
        assert!(matches!(second, Err(IdentityError::EmailAlreadyInUse)));
        assert_eq!(repo.find_many(&AccountFilter::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let repo = InMemoryAccountRepository::new();
        repo.create(&account("Case@example.com")).await.unwrap();

        assert!(repo.find_by_email("Case@example.com").await.unwrap().is_some());
        assert!(repo.find_by_email("case@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_to_set_does_not_duplicate() {
        let repo = InMemoryAccountRepository::new();
        let stored = repo.create(&account("a@example.com")).await.unwrap();
        let event_id = Uuid::new_v4();
        let patch = RelationPatch::AddToSet { set: RelationSet::AttendingEvents, event_id };

        assert_eq!(repo.update_relations(&AccountFilter::Id(stored.id), &patch).await.unwrap(), 1);
        assert_eq!(repo.update_relations(&AccountFilter::Id(stored.id), &patch).await.unwrap(), 0);

        let reloaded = repo.find_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(reloaded.attending_events, vec![event_id]);
    }

    #[tokio::test]
    async fn test_pull_by_listing_filter() {
        let repo = InMemoryAccountRepository::new();
        let first = repo.create(&account("a@example.com")).await.unwrap();
        let second = repo.create(&account("b@example.com")).await.unwrap();
        let event_id = Uuid::new_v4();
        let add = RelationPatch::AddToSet { set: RelationSet::AttendingEvents, event_id };
        repo.update_relations(&AccountFilter::IdIn(vec![first.id, second.id]), &add)
            .await
            .unwrap();

        let pulled = repo
            .update_relations(
                &AccountFilter::Listing { set: RelationSet::AttendingEvents, event_id },
                &RelationPatch::Pull { set: RelationSet::AttendingEvents, event_id },
            )
            .await
            .unwrap();
        assert_eq!(pulled, 2);
        let reloaded = repo.find_by_id(first.id).await.unwrap().unwrap();
        assert!(reloaded.attending_events.is_empty());
    }
}
