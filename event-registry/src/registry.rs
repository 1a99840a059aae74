//! Event writes and the account relationship sets they drive
//!
//! Every event write is followed by a sequence of independent account
//! updates that keep `createdEvents` and `attendingEvents` in line with the
//! event collection. Nothing spans those writes: if one fails, the earlier
//! ones stay committed and the failure is reported as
//! [`RegistryError::Reconciliation`] naming the step. Each step is an
//! idempotent set operation, so re-running the write or
//! [`RelationshipRepair`](crate::RelationshipRepair) converges.

use crate::error::{RegistryError, RegistryResult};
use crate::models::*;
use crate::repository::EventRepository;
use auth_identity::{
    Account, AccountFilter, AccountRepository, AccountSummary, OrganizerContext, RelationPatch, RelationSet, Role,
};
use chrono::Utc;
use object_storage::{ensure_supported_image, BlobSink, Upload};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub struct EventRegistry {
    events: Arc<dyn EventRepository>,
    accounts: Arc<dyn AccountRepository>,
    blobs: Arc<dyn BlobSink>,
}

impl EventRegistry {
    pub fn new(
        events: Arc<dyn EventRepository>,
        accounts: Arc<dyn AccountRepository>,
        blobs: Arc<dyn BlobSink>,
    ) -> Self {
        Self {
            events,
            accounts,
            blobs,
        }
    }

    /// Insert an event, then list it on its organizer and participants.
    ///
    /// All checks run before the first write. The poster is stored ahead of
    /// the insert so a rejected upload leaves no event.
    #[instrument(skip_all, fields(actor = %ctx.account_id()))]
    pub async fn create(
        &self,
        ctx: &OrganizerContext,
        new_event: NewEvent,
        poster: Option<Upload>,
    ) -> RegistryResult<EventView> {
        let title = required("title", &new_event.title)?;
        let description = required("description", &new_event.description)?;
        let location = required("location", &new_event.location)?;
        check_dates(&new_event.start_date, &new_event.end_date)?;
        if let Some(ref upload) = poster {
            ensure_supported_image(&upload.mime_type)?;
        }
        let participants = dedup(&new_event.participants);
        let organizer = new_event.organizer.unwrap_or_else(|| ctx.account_id());

        if self.events.find_by_title(&title).await?.is_some() {
            return Err(RegistryError::TitleInUse(title));
        }
        self.ensure_organizer(organizer).await?;
        self.ensure_accounts_exist(&participants).await?;

        let poster_url = match poster {
            Some(upload) => Some(
                self.blobs
                    .store(&upload.bytes, &upload.mime_type, upload.file_name.as_deref())
                    .await?,
            ),
            None => None,
        };

        let now = Utc::now();
        let event = self
            .events
            .create(&Event {
                id: Uuid::new_v4(),
                title,
                description,
                location,
                start_date: new_event.start_date,
                end_date: new_event.end_date,
                status: new_event.status,
                is_deleted: false,
                poster_url,
                organizer,
                participants,
                created_at: now,
                updated_at: now,
            })
            .await?;

        self.relate(
            "add_created_event",
            event.id,
            AccountFilter::Id(event.organizer),
            RelationPatch::AddToSet {
                set: RelationSet::CreatedEvents,
                event_id: event.id,
            },
        )
        .await?;
        if !event.participants.is_empty() {
            self.relate(
                "add_attending_event",
                event.id,
                AccountFilter::IdIn(event.participants.clone()),
                RelationPatch::AddToSet {
                    set: RelationSet::AttendingEvents,
                    event_id: event.id,
                },
            )
            .await?;
        }

        info!(event_id = %event.id, participants = event.participants.len(), "event created");
        self.populate_one(event).await
    }

    /// Apply a partial update and move the event between account sets.
    ///
    /// Participants are diffed against the document as it was before the
    /// write. Accounts that list the event but are no longer participants
    /// lose it, and every current participant gains it if absent.
    #[instrument(skip_all, fields(actor = %ctx.account_id(), event_id = %id))]
    pub async fn update(&self, ctx: &OrganizerContext, id: Uuid, patch: EventPatch) -> RegistryResult<EventView> {
        let mut patch = patch;
        if let Some(ref title) = patch.title {
            patch.title = Some(required("title", title)?);
        }
        if let Some(ref description) = patch.description {
            patch.description = Some(required("description", description)?);
        }
        if let Some(ref location) = patch.location {
            patch.location = Some(required("location", location)?);
        }
        if let Some(ref participants) = patch.participants {
            patch.participants = Some(dedup(participants));
        }

        let current = self.find_live(id).await?;
        check_dates(
            patch.start_date.as_ref().unwrap_or(&current.start_date),
            patch.end_date.as_ref().unwrap_or(&current.end_date),
        )?;
        if let Some(ref title) = patch.title {
            if let Some(existing) = self.events.find_by_title(title).await? {
                if existing.id != id {
                    return Err(RegistryError::TitleInUse(title.clone()));
                }
            }
        }
        if let Some(organizer) = patch.organizer {
            self.ensure_organizer(organizer).await?;
        }
        if let Some(ref participants) = patch.participants {
            self.ensure_accounts_exist(participants).await?;
        }

        let previous = self
            .events
            .find_by_id_and_update(id, &patch, ReturnDocument::Before)
            .await?
            .ok_or(RegistryError::EventNotFound(id))?;
        let organizer = patch.organizer.unwrap_or(previous.organizer);
        let participants = patch.participants.clone().unwrap_or_else(|| previous.participants.clone());

        self.relate(
            "add_created_event",
            id,
            AccountFilter::Id(organizer),
            RelationPatch::AddToSet {
                set: RelationSet::CreatedEvents,
                event_id: id,
            },
        )
        .await?;
        if organizer != previous.organizer {
            self.relate(
                "pull_created_event",
                id,
                AccountFilter::Id(previous.organizer),
                RelationPatch::Pull {
                    set: RelationSet::CreatedEvents,
                    event_id: id,
                },
            )
            .await?;
        }

        let listing = self
            .accounts
            .find_many(&AccountFilter::Listing {
                set: RelationSet::AttendingEvents,
                event_id: id,
            })
            .await
            .map_err(|source| RegistryError::Reconciliation {
                step: "find_attending_accounts",
                event_id: id,
                source,
            })?;
        let current_set: HashSet<Uuid> = participants.iter().copied().collect();
        let removed = dedup(
            &previous
                .participants
                .iter()
                .copied()
                .chain(listing.iter().map(|account| account.id))
                .filter(|account_id| !current_set.contains(account_id))
                .collect::<Vec<_>>(),
        );
        let added = participants
            .iter()
            .filter(|account_id| !previous.participants.contains(account_id))
            .count();

        if !removed.is_empty() {
            self.relate(
                "pull_attending_event",
                id,
                AccountFilter::IdIn(removed.clone()),
                RelationPatch::Pull {
                    set: RelationSet::AttendingEvents,
                    event_id: id,
                },
            )
            .await?;
        }
        if !participants.is_empty() {
            self.relate(
                "add_attending_event",
                id,
                AccountFilter::IdIn(participants.clone()),
                RelationPatch::AddToSet {
                    set: RelationSet::AttendingEvents,
                    event_id: id,
                },
            )
            .await?;
        }

        info!(added, removed = removed.len(), "event updated");
        let updated = self
            .events
            .find_by_id(id)
            .await?
            .ok_or(RegistryError::EventNotFound(id))?;
        self.populate_one(updated).await
    }

    /// Soft delete. Account sets keep their references; reads filter on the flag.
    #[instrument(skip_all, fields(actor = %ctx.account_id(), event_id = %id))]
    pub async fn remove(&self, ctx: &OrganizerContext, id: Uuid) -> RegistryResult<RemoveEventResponse> {
        if !self.events.soft_delete(id).await? {
            return Err(RegistryError::EventNotFound(id));
        }
        info!("event soft-deleted");
        Ok(RemoveEventResponse {
            message: EVENT_DELETED_MESSAGE.to_string(),
        })
    }

    pub async fn list(&self, _ctx: &OrganizerContext) -> RegistryResult<Vec<EventView>> {
        let events = self.events.find_active().await?;
        self.populate(events).await
    }

    pub async fn get(&self, _ctx: &OrganizerContext, id: Uuid) -> RegistryResult<EventView> {
        let event = self.find_live(id).await?;
        self.populate_one(event).await
    }

    async fn find_live(&self, id: Uuid) -> RegistryResult<Event> {
        self.events
            .find_by_id(id)
            .await?
            .filter(|event| !event.is_deleted)
            .ok_or(RegistryError::EventNotFound(id))
    }

    async fn ensure_organizer(&self, organizer: Uuid) -> RegistryResult<Account> {
        let account = self
            .accounts
            .find_by_id(organizer)
            .await?
            .ok_or(RegistryError::AccountNotFound(organizer))?;
        if account.role != Role::Organizer {
            return Err(RegistryError::Validation(format!(
                "account {organizer} does not hold the organizer role"
            )));
        }
        Ok(account)
    }

    async fn ensure_accounts_exist(&self, ids: &[Uuid]) -> RegistryResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let found: HashSet<Uuid> = self
            .accounts
            .find_many(&AccountFilter::IdIn(ids.to_vec()))
            .await?
            .iter()
            .map(|account| account.id)
            .collect();
        match ids.iter().find(|id| !found.contains(id)) {
            Some(missing) => Err(RegistryError::AccountNotFound(*missing)),
            None => Ok(()),
        }
    }

    async fn relate(
        &self,
        step: &'static str,
        event_id: Uuid,
        filter: AccountFilter,
        patch: RelationPatch,
    ) -> RegistryResult<u64> {
        match self.accounts.update_relations(&filter, &patch).await {
            Ok(modified) => {
                debug!(step, %event_id, modified, "relationship step applied");
                Ok(modified)
            }
            Err(source) => {
                warn!(step, %event_id, error = %source, "relationship step failed");
                Err(RegistryError::Reconciliation { step, event_id, source })
            }
        }
    }

    async fn populate_one(&self, event: Event) -> RegistryResult<EventView> {
        self.populate(vec![event])
            .await?
            .pop()
            .ok_or_else(|| RegistryError::Store(anyhow::anyhow!("populate returned no event")))
    }

    async fn populate(&self, events: Vec<Event>) -> RegistryResult<Vec<EventView>> {
        let referenced = dedup(
            &events
                .iter()
                .flat_map(|event| std::iter::once(event.organizer).chain(event.participants.iter().copied()))
                .collect::<Vec<_>>(),
        );
        let summaries: HashMap<Uuid, AccountSummary> = if referenced.is_empty() {
            HashMap::new()
        } else {
            self.accounts
                .find_many(&AccountFilter::IdIn(referenced))
                .await?
                .iter()
                .map(|account| (account.id, AccountSummary::from(account)))
                .collect()
        };

        Ok(events
            .into_iter()
            .map(|event| EventView {
                organizer: summaries.get(&event.organizer).cloned(),
                participants: event
                    .participants
                    .iter()
                    .filter_map(|id| summaries.get(id).cloned())
                    .collect(),
                id: event.id,
                title: event.title,
                description: event.description,
                location: event.location,
                start_date: event.start_date,
                end_date: event.end_date,
                status: event.status,
                poster_url: event.poster_url,
                created_at: event.created_at,
                updated_at: event.updated_at,
            })
            .collect())
    }
}

fn required(field: &str, value: &str) -> RegistryResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn check_dates(start: &chrono::DateTime<Utc>, end: &chrono::DateTime<Utc>) -> RegistryResult<()> {
    if end < start {
        return Err(RegistryError::Validation("end date must not be before start date".into()));
    }
    Ok(())
}

/// First occurrence wins, order kept
fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use chrono::Duration;
    use object_storage::StorageError;

    #[tokio::test]
    async fn test_create_lists_event_on_organizer_and_participants() {
        let w = World::new().await;
        let p1 = w.account("p1@example.com", Role::Participant).await;
        let p2 = w.account("p2@example.com", Role::Participant).await;

        let view = w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![p1.id, p2.id, p1.id]), None)
            .await
            .unwrap();

        assert_eq!(view.participants.len(), 2);
        assert_eq!(view.organizer.as_ref().map(|o| o.id), Some(w.organizer.id));
        assert_eq!(w.reload(w.organizer.id).await.created_events, vec![view.id]);
        assert_eq!(w.reload(p1.id).await.attending_events, vec![view.id]);
        assert_eq!(w.reload(p2.id).await.attending_events, vec![view.id]);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_title_and_bad_input() {
        let w = World::new().await;
        w.registry
            .create(&w.organizer_ctx, new_event("Launch", vec![]), None)
            .await
            .unwrap();

        assert!(matches!(
            w.registry.create(&w.organizer_ctx, new_event("Launch", vec![]), None).await,
            Err(RegistryError::TitleInUse(_))
        ));

        let mut backwards = new_event("Backwards", vec![]);
        backwards.end_date = backwards.start_date - Duration::hours(1);
        assert!(matches!(
            w.registry.create(&w.organizer_ctx, backwards, None).await,
            Err(RegistryError::Validation(_))
        ));

        assert!(matches!(
            w.registry
                .create(&w.organizer_ctx, new_event("Ghosts", vec![Uuid::new_v4()]), None)
                .await,
            Err(RegistryError::AccountNotFound(_))
        ));
        assert_eq!(w.events.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_participant_cannot_be_named_organizer() {
        let w = World::new().await;
        let participant = w.account("p@example.com", Role::Participant).await;
        let mut event = new_event("Launch", vec![]);
        event.organizer = Some(participant.id);

        assert!(matches!(
            w.registry.create(&w.organizer_ctx, event, None).await,
            Err(RegistryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_pdf_poster_rejected_before_insert() {
        let w = World::new().await;
        let pdf = Upload::new(b"%PDF".to_vec(), "application/pdf");

        let result = w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![]), Some(pdf))
            .await;
        assert!(matches!(result, Err(RegistryError::Upload(StorageError::UnsupportedMediaType(_)))));
        assert!(w.events.find_all().await.unwrap().is_empty());
        assert!(w.reload(w.organizer.id).await.created_events.is_empty());
    }

    #[tokio::test]
    async fn test_poster_url_persisted() {
        let w = World::new().await;
        let gif = Upload::new(b"GIF89a".to_vec(), "image/gif");

        let view = w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![]), Some(gif))
            .await
            .unwrap();
        assert!(view.poster_url.is_some_and(|url| url.ends_with(".gif")));
    }

    #[tokio::test]
    async fn test_update_moves_participants_by_set_difference() {
        let w = World::new().await;
        let a = w.account("a@example.com", Role::Participant).await;
        let b = w.account("b@example.com", Role::Participant).await;
        let c = w.account("c@example.com", Role::Participant).await;
        let view = w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![a.id, b.id]), None)
            .await
            .unwrap();

        let updated = w
            .registry
            .update(
                &w.organizer_ctx,
                view.id,
                EventPatch {
                    participants: Some(vec![b.id, c.id]),
                    ..EventPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.participants.iter().map(|p| p.id).collect::<Vec<_>>(), vec![b.id, c.id]);
        assert!(w.reload(a.id).await.attending_events.is_empty());
        assert_eq!(w.reload(b.id).await.attending_events, vec![view.id]);
        assert_eq!(w.reload(c.id).await.attending_events, vec![view.id]);
        assert_eq!(w.reload(w.organizer.id).await.created_events, vec![view.id]);
    }

    #[tokio::test]
    async fn test_organizer_change_retracts_from_previous_organizer() {
        let w = World::new().await;
        let other = w.account("other@example.com", Role::Organizer).await;
        let view = w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![]), None)
            .await
            .unwrap();

        w.registry
            .update(
                &w.organizer_ctx,
                view.id,
                EventPatch {
                    organizer: Some(other.id),
                    ..EventPatch::default()
                },
            )
            .await
            .unwrap();

        assert!(w.reload(w.organizer.id).await.created_events.is_empty());
        assert_eq!(w.reload(other.id).await.created_events, vec![view.id]);
    }

    #[tokio::test]
    async fn test_rename_onto_another_title_is_conflict_before_any_write() {
        let w = World::new().await;
        let a = w.account("a@example.com", Role::Participant).await;
        let b = w.account("b@example.com", Role::Participant).await;
        w.registry
            .create(&w.organizer_ctx, new_event("Launch", vec![]), None)
            .await
            .unwrap();
        let retro = w
            .registry
            .create(&w.organizer_ctx, new_event("Retro", vec![a.id]), None)
            .await
            .unwrap();

        let result = w
            .registry
            .update(
                &w.organizer_ctx,
                retro.id,
                EventPatch {
                    title: Some("Launch".into()),
                    participants: Some(vec![b.id]),
                    ..EventPatch::default()
                },
            )
            .await;
        assert!(matches!(result, Err(RegistryError::TitleInUse(ref t)) if t == "Launch"));

        let stored = w.events.find_by_id(retro.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Retro");
        assert_eq!(stored.participants, vec![a.id]);
        assert_eq!(w.reload(a.id).await.attending_events, vec![retro.id]);
        assert!(w.reload(b.id).await.attending_events.is_empty());

        // Keeping its own title is not a conflict
        let renamed = w
            .registry
            .update(
                &w.organizer_ctx,
                retro.id,
                EventPatch {
                    title: Some("Retro".into()),
                    ..EventPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.title, "Retro");
    }

    #[tokio::test]
    async fn test_update_of_deleted_or_missing_event_is_not_found() {
        let w = World::new().await;
        let view = w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![]), None)
            .await
            .unwrap();
        w.registry.remove(&w.organizer_ctx, view.id).await.unwrap();

        let patch = EventPatch {
            description: Some("again".into()),
            ..EventPatch::default()
        };
        assert!(matches!(
            w.registry.update(&w.organizer_ctx, view.id, patch.clone()).await,
            Err(RegistryError::EventNotFound(_))
        ));
        assert!(matches!(
            w.registry.update(&w.organizer_ctx, Uuid::new_v4(), patch).await,
            Err(RegistryError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_event_but_keeps_references() {
        let w = World::new().await;
        let p = w.account("p@example.com", Role::Participant).await;
        let view = w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![p.id]), None)
            .await
            .unwrap();

        let response = w.registry.remove(&w.organizer_ctx, view.id).await.unwrap();
        assert_eq!(response.message, EVENT_DELETED_MESSAGE);
        assert!(w.registry.remove(&w.organizer_ctx, view.id).await.is_ok());

        assert!(w.registry.list(&w.organizer_ctx).await.unwrap().is_empty());
        assert!(matches!(
            w.registry.get(&w.organizer_ctx, view.id).await,
            Err(RegistryError::EventNotFound(_))
        ));
        assert!(w.events.find_by_id(view.id).await.unwrap().is_some());
        assert_eq!(w.reload(p.id).await.attending_events, vec![view.id]);
        assert_eq!(w.reload(w.organizer.id).await.created_events, vec![view.id]);
    }

    #[tokio::test]
    async fn test_failed_relationship_step_is_reported_and_event_kept() {
        let w = World::new().await;
        let p = w.account("p@example.com", Role::Participant).await;
        w.accounts.fail_relation_writes(true);

        let result = w
            .registry
            .create(&w.organizer_ctx, new_event("Launch", vec![p.id]), None)
            .await;
        assert!(matches!(
            result,
            Err(RegistryError::Reconciliation { step: "add_created_event", .. })
        ));
        assert_eq!(w.events.find_all().await.unwrap().len(), 1);
        assert!(w.reload(w.organizer.id).await.created_events.is_empty());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(dedup(&[a, b, a, b, a]), vec![a, b]);
    }
}
