//! Collaborator contracts.
//!
//! One trait per external collaborator, written against the behavior the
//! application needs and nothing more. The application layer only ever
//! holds `Arc<dyn AuthProvider>` / `Arc<dyn Directory>`, so integration
//! tests run against in-memory fakes.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crossskill_core::entities::{
    AuthUser, NewProfile, Profile, ProfilePatch, Session, SkillCatalogEntry, TeachableListing,
    UserSkill,
};
use crossskill_core::types::EntityId;

use crate::error::{AuthError, StoreError};

/// A transition delivered by [`AuthProvider::changes`].
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// The startup snapshot, delivered exactly once per subscription.
    InitialSession(Option<Session>),
    SignedIn(Session),
    SignedOut,
}

/// Contract of the external authentication service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Create a new identity. Does not create an application profile; that
    /// is a separate registration side effect against the store.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// End the current session. A no-op when no session is held.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Point-in-time view of the current session.
    async fn session(&self) -> Result<Option<Session>, AuthError>;

    /// Subscribe to auth transitions. Delivers one
    /// [`AuthEvent::InitialSession`] snapshot followed by every subsequent
    /// transition.
    fn changes(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Contract of the external relational store, one operation per entity
/// action.
///
/// No retries, no batching, no client-side deadlines: failures surface only
/// as explicit [`StoreError`]s carrying the store's message verbatim.
#[async_trait]
pub trait Directory: Send + Sync {
    /// The auth identity behind the current session, if any.
    async fn current_user(&self) -> Result<Option<AuthUser>, StoreError>;

    /// Exactly one profile for the given auth identity, or
    /// [`StoreError::NotFound`].
    async fn profile_by_auth_id(&self, auth_id: EntityId) -> Result<Profile, StoreError>;

    /// Create the profile row during registration.
    async fn create_profile(&self, profile: NewProfile) -> Result<Profile, StoreError>;

    /// Apply a partial update and return the updated profile. Immutable
    /// fields present in the patch are silently stripped, never rejected.
    async fn update_profile(
        &self,
        auth_id: EntityId,
        patch: ProfilePatch,
    ) -> Result<Profile, StoreError>;

    /// The skills a user teaches, joined with catalog name/category.
    async fn user_skills(&self, user_id: EntityId) -> Result<Vec<UserSkill>, StoreError>;

    /// The full skill catalog, ordered by category then name.
    async fn skill_catalog(&self) -> Result<Vec<SkillCatalogEntry>, StoreError>;

    /// Create one (user, skill, proficiency) association.
    /// [`StoreError::Conflict`] when the pair already exists.
    async fn add_user_skill(
        &self,
        user_id: EntityId,
        skill_id: EntityId,
        proficiency_level: i16,
    ) -> Result<UserSkill, StoreError>;

    /// Delete one association by its own id.
    async fn remove_user_skill(&self, user_skill_id: EntityId) -> Result<(), StoreError>;

    /// All teachable listings, excluding any row whose joined teacher or
    /// skill is absent.
    async fn teachable_listings(&self) -> Result<Vec<TeachableListing>, StoreError>;

    /// Distinct catalog categories, reduced client-side from the full
    /// column (not a `DISTINCT` query).
    async fn skill_categories(&self) -> Result<Vec<String>, StoreError>;

    /// Distinct teacher departments, reduced client-side from the full
    /// column.
    async fn teacher_departments(&self) -> Result<Vec<String>, StoreError>;
}
