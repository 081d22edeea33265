//! Cross-Skill Collective domain layer.
//!
//! This crate holds the pure building blocks shared by the client and
//! application layers: entity types mirroring the external store, the
//! route-gate policy, the marketplace filter engine, and form validation.
//! It performs no I/O and has no async surface.

pub mod entities;
pub mod error;
pub mod filter;
pub mod forms;
pub mod routes;

pub mod types {
    /// All entity primary keys in the external store are UUIDs.
    pub type EntityId = uuid::Uuid;

    /// All timestamps are UTC.
    pub type Timestamp = chrono::DateTime<chrono::Utc>;
}
