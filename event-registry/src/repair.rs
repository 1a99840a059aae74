use crate::error::{RegistryError, RegistryResult};
use crate::repository::EventRepository;
use auth_identity::{relation, Account, AccountFilter, AccountRepository, RelationPatch, RelationSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub accounts_scanned: usize,
    pub accounts_repaired: usize,
    /// Entries removed because they named no event at all
    pub dangling_references: usize,
}

/// Re-derives every account's relationship sets from the event collection.
///
/// Soft-deleted events count, matching what the write path keeps. Existing
/// order is preserved and only accounts whose sets differ are written, so a
/// second run reports nothing to repair.
pub struct RelationshipRepair {
    events: Arc<dyn EventRepository>,
    accounts: Arc<dyn AccountRepository>,
}

impl RelationshipRepair {
    pub fn new(events: Arc<dyn EventRepository>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { events, accounts }
    }

    #[instrument(skip_all)]
    pub async fn run(&self) -> RegistryResult<RepairReport> {
        let events = self.events.find_all().await?;
        let known: HashSet<Uuid> = events.iter().map(|event| event.id).collect();

        let mut created: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut attending: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for event in &events {
            created.entry(event.organizer).or_default().push(event.id);
            for participant in &event.participants {
                attending.entry(*participant).or_default().push(event.id);
            }
        }

        let accounts = self.accounts.find_many(&AccountFilter::All).await?;
        let mut report = RepairReport {
            accounts_scanned: accounts.len(),
            ..RepairReport::default()
        };

        for account in &accounts {
            let mut repaired = false;
            for (set, expected) in [
                (RelationSet::CreatedEvents, created.get(&account.id)),
                (RelationSet::AttendingEvents, attending.get(&account.id)),
            ] {
                let expected = expected.map(Vec::as_slice).unwrap_or_default();
                let current = relation(account, set);
                report.dangling_references += current.iter().filter(|id| !known.contains(id)).count();

                let rebuilt = rebuild(current, expected);
                if rebuilt != *current {
                    self.rewrite(account, set, rebuilt).await?;
                    repaired = true;
                }
            }
            if repaired {
                report.accounts_repaired += 1;
            }
        }

        info!(
            scanned = report.accounts_scanned,
            repaired = report.accounts_repaired,
            dangling = report.dangling_references,
            "relationship repair finished"
        );
        Ok(report)
    }

    async fn rewrite(&self, account: &Account, set: RelationSet, events: Vec<Uuid>) -> RegistryResult<()> {
        let patch = RelationPatch::Replace { set, events };
        self.accounts
            .update_relations(&AccountFilter::Id(account.id), &patch)
            .await
            .map_err(|source| {
                warn!(account_id = %account.id, ?set, error = %source, "relationship repair write failed");
                RegistryError::Identity(source)
            })?;
        Ok(())
    }
}

/// Entries of `current` that are still expected, in their existing order,
/// followed by the missing expected ones.
fn rebuild(current: &[Uuid], expected: &[Uuid]) -> Vec<Uuid> {
    let expected_set: HashSet<&Uuid> = expected.iter().collect();
    let mut seen = HashSet::new();
    let mut rebuilt: Vec<Uuid> = current
        .iter()
        .filter(|id| expected_set.contains(id) && seen.insert(**id))
        .copied()
        .collect();
    rebuilt.extend(expected.iter().filter(|id| seen.insert(**id)));
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventPatch;
    use crate::testing::*;
    use auth_identity::Role;

    #[test]
    fn test_rebuild_keeps_order_and_drops_strays() {
        let (a, b, c, stray) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(rebuild(&[b, stray, a, b], &[a, b, c]), vec![b, a, c]);
        assert!(rebuild(&[stray], &[]).is_empty());
    }

    #[tokio::test]
    async fn test_repair_restores_sets_after_partial_write() {
        let w = World::new().await;
        let p = w.account("p@example.com", Role::Participant).await;

        w.accounts.fail_relation_writes(true);
        assert!(w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![p.id]), None)
            .await
            .is_err());
        w.accounts.fail_relation_writes(false);

        let event = w.events.find_by_title("Launch").await.unwrap().unwrap();
        let report = w.repair.run().await.unwrap();
        assert_eq!(report.accounts_scanned, 2);
        assert_eq!(report.accounts_repaired, 2);
        assert_eq!(w.reload(w.organizer.id).await.created_events, vec![event.id]);
        assert_eq!(w.reload(p.id).await.attending_events, vec![event.id]);

        assert_eq!(w.repair.run().await.unwrap().accounts_repaired, 0);
    }

    #[tokio::test]
    async fn test_repair_removes_dangling_and_stale_entries() {
        let w = World::new().await;
        let a = w.account("a@example.com", Role::Participant).await;
        let b = w.account("b@example.com", Role::Participant).await;
        let view = w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![a.id]), None)
            .await
            .unwrap();

        // Move the participant behind the registry's back
        w.events
            .find_by_id_and_update(
                view.id,
                &EventPatch {
                    participants: Some(vec![b.id]),
                    ..EventPatch::default()
                },
                crate::models::ReturnDocument::After,
            )
            .await
            .unwrap();
        let ghost = Uuid::new_v4();
        w.accounts
            .update_relations(
                &AccountFilter::Id(b.id),
                &RelationPatch::AddToSet { set: RelationSet::AttendingEvents, event_id: ghost },
            )
            .await
            .unwrap();

        let report = w.repair.run().await.unwrap();
        assert_eq!(report.dangling_references, 1);
        assert_eq!(report.accounts_repaired, 2);
        assert!(w.reload(a.id).await.attending_events.is_empty());
        assert_eq!(w.reload(b.id).await.attending_events, vec![view.id]);
    }

    #[tokio::test]
    async fn test_repair_keeps_soft_deleted_references() {
        let w = World::new().await;
        let view = w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![]), None)
            .await
            .unwrap();
        w.registry.remove(&w.organizer_ctx, view.id).await.unwrap();

        let report = w.repair.run().await.unwrap();
        assert_eq!(report.accounts_repaired, 0);
        assert_eq!(w.reload(w.organizer.id).await.created_events, vec![view.id]);
    }
}
