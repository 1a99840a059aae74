use auth_identity::AccountSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EVENT_DELETED_MESSAGE: &str = "Event deleted successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Done,
    Cancelled,
}

/// Stored event record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    /// Unique across all events, soft-deleted ones included
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: EventStatus,
    pub is_deleted: bool,
    pub poster_url: Option<String>,
    pub organizer: Uuid,
    pub participants: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub status: EventStatus,
    /// Defaults to the calling organizer
    #[serde(default)]
    pub organizer: Option<Uuid>,
    #[serde(default)]
    pub participants: Vec<Uuid>,
}

/// Partial update; `None` leaves the field as it is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<EventStatus>,
    pub organizer: Option<Uuid>,
    pub participants: Option<Vec<Uuid>>,
}

impl EventPatch {
    pub fn apply(&self, event: &mut Event) {
        if let Some(ref title) = self.title {
            event.title = title.clone();
        }
        if let Some(ref description) = self.description {
            event.description = description.clone();
        }
        if let Some(ref location) = self.location {
            event.location = location.clone();
        }
        if let Some(start_date) = self.start_date {
            event.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            event.end_date = end_date;
        }
        if let Some(status) = self.status {
            event.status = status;
        }
        if let Some(organizer) = self.organizer {
            event.organizer = organizer;
        }
        if let Some(ref participants) = self.participants {
            event.participants = participants.clone();
        }
        event.updated_at = Utc::now();
    }
}

/// Which side of an update `find_by_id_and_update` hands back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnDocument {
    Before,
    After,
}

/// Event with organizer and participants resolved to account summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: EventStatus,
    pub poster_url: Option<String>,
    /// `None` if the organizer account no longer resolves
    pub organizer: Option<AccountSummary>,
    /// Participants that no longer resolve are left out
    pub participants: Vec<AccountSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveEventResponse {
    pub message: String,
}
