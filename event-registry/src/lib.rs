//! Event records and the account relationships they imply
//!
//! [`EventRegistry`] writes events and keeps each account's `createdEvents`
//! and `attendingEvents` in step with them. Every operation takes an
//! [`OrganizerContext`](auth_identity::OrganizerContext), so it can only run
//! behind the organizer gate. [`RelationshipRepair`] re-derives the account
//! sets from the event collection after a partial failure.

pub mod error;
pub mod models;
pub mod registry;
pub mod repair;
pub mod repository;

#[cfg(test)]
mod testing;

pub use error::{RegistryError, RegistryResult};
pub use models::*;
pub use registry::EventRegistry;
pub use repair::{RelationshipRepair, RepairReport};
pub use repository::{EventRepository, InMemoryEventRepository};
