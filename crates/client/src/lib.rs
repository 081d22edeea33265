//! Collaborator layer: typed access to the external auth service and
//! relational store.
//!
//! The contracts ([`AuthProvider`], [`Directory`]) are what the application
//! layer programs against; [`HttpAuth`] and [`HttpDirectory`] are the
//! production implementations speaking the hosted backend's REST surface.
//! Tests substitute in-memory fakes.

pub mod auth;
pub mod contract;
pub mod directory;
pub mod error;
pub mod store;

pub use auth::HttpAuth;
pub use contract::{AuthEvent, AuthProvider, Directory};
pub use directory::HttpDirectory;
pub use error::{AuthError, StoreError};
pub use store::{SelectQuery, TableClient};
