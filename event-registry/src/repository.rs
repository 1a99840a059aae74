use crate::error::{RegistryError, RegistryResult};
use crate::models::{Event, EventPatch, ReturnDocument};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Event collection of the record store
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new event. A duplicate title is reported as
    /// [`RegistryError::TitleInUse`].
    async fn create(&self, event: &Event) -> RegistryResult<Event>;
    /// Direct lookup, soft-deleted events included
    async fn find_by_id(&self, id: Uuid) -> RegistryResult<Option<Event>>;
    async fn find_by_title(&self, title: &str) -> RegistryResult<Option<Event>>;
    /// Events that are not soft-deleted, oldest first
    async fn find_active(&self) -> RegistryResult<Vec<Event>>;
    /// Every event, soft-deleted ones included, oldest first
    async fn find_all(&self) -> RegistryResult<Vec<Event>>;
    /// Apply `patch` and return the document from the requested side of the
    /// write, or `None` if no event has this id.
    async fn find_by_id_and_update(
        &self,
        id: Uuid,
        patch: &EventPatch,
        return_document: ReturnDocument,
    ) -> RegistryResult<Option<Event>>;
    /// Set the deleted flag; returns false if no event has this id
    async fn soft_delete(&self, id: Uuid) -> RegistryResult<bool>;
}

/// In-memory implementation for development/testing, kept in insertion order
#[derive(Default, Clone)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<Vec<Event>>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn create(&self, event: &Event) -> RegistryResult<Event> {
        let mut events = self.events.write().await;
        // Unique index on title, checked under the write lock
        if events.iter().any(|e| e.title == event.title) {
            return Err(RegistryError::TitleInUse(event.title.clone()));
        }
        events.push(event.clone());
        Ok(event.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> RegistryResult<Option<Event>> {
        Ok(self.events.read().await.iter().find(|e| e.id == id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> RegistryResult<Option<Event>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .find(|e| e.title == title)
            .cloned())
    }

    async fn find_active(&self) -> RegistryResult<Vec<Event>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| !e.is_deleted)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> RegistryResult<Vec<Event>> {
        Ok(self.events.read().await.clone())
    }

    async fn find_by_id_and_update(
        &self,
        id: Uuid,
        patch: &EventPatch,
        return_document: ReturnDocument,
    ) -> RegistryResult<Option<Event>> {
        let mut events = self.events.write().await;
        if let Some(ref title) = patch.title {
            if events.iter().any(|e| e.id != id && e.title == *title) {
                return Err(RegistryError::TitleInUse(title.clone()));
            }
        }

        let Some(event) = events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        let before = event.clone();
        patch.apply(event);

        Ok(Some(match return_document {
            ReturnDocument::Before => before,
            ReturnDocument::After => event.clone(),
        }))
    }

    async fn soft_delete(&self, id: Uuid) -> RegistryResult<bool> {
        let mut events = self.events.write().await;
        match events.iter_mut().find(|e| e.id == id) {
            Some(event) => {
                if !event.is_deleted {
                    event.is_deleted = true;
                    event.updated_at = chrono::Utc::now();
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
