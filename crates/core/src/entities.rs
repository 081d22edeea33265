//! Entity types mirroring the external auth service and relational store.
//!
//! `Profile`, `SkillCatalogEntry` and `UserSkill` correspond to rows of the
//! `users`, `skills` and `user_skills` tables. [`TeachableListing`] is a
//! derived, read-only projection used only for marketplace display; it is
//! never persisted on its own.

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Timestamp};

/// The raw authentication identity, as owned by the external auth service.
///
/// Distinct from [`Profile`]: an identity exists as soon as sign-up
/// succeeds, a profile only once registration completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: EntityId,
    pub email: String,
}

/// Proof of an authenticated identity for the current client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token; forwarded verbatim to the store, never inspected.
    pub access_token: String,
    pub user: AuthUser,
}

/// A row from the `users` table: the application-level user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: EntityId,
    /// Reference to the auth identity this profile belongs to.
    pub auth_id: EntityId,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub bio: Option<String>,
    pub created_at: Timestamp,
}

/// A row from the `skills` catalog table. Reference data, immutable from
/// the application's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCatalogEntry {
    pub id: EntityId,
    pub name: String,
    pub category: String,
}

/// Catalog name/category embedded alongside a [`UserSkill`] row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRef {
    pub name: String,
    pub category: String,
}

/// A row from the `user_skills` join table, embedded with its catalog skill.
///
/// Uniqueness of the `(user_id, skill_id)` pair is enforced by the external
/// store, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSkill {
    pub id: EntityId,
    pub user_id: EntityId,
    pub skill_id: EntityId,
    /// Self-assessed teaching proficiency, 1 (novice) to 5 (expert).
    pub proficiency_level: i16,
    pub skill: SkillRef,
}

/// Derived marketplace row joining a user skill with its catalog entry and
/// teaching profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeachableListing {
    /// The underlying `user_skills` row id.
    pub id: EntityId,
    pub skill_id: EntityId,
    pub skill_name: String,
    pub skill_category: String,
    pub teacher_id: EntityId,
    pub teacher_name: String,
    pub teacher_department: String,
    pub teacher_bio: Option<String>,
    pub proficiency_level: i16,
}

/// DTO for creating the profile row during registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub auth_id: EntityId,
    pub email: String,
    pub full_name: String,
    pub department: String,
}

/// Partial update for a profile.
///
/// Callers may populate any field, including the immutable ones; only the
/// mutable fields ever reach the store. See [`ProfilePatch::sanitized`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    /// Immutable; silently stripped from the update, never rejected.
    pub email: Option<String>,
    /// Immutable; silently stripped from the update, never rejected.
    pub auth_id: Option<EntityId>,
    /// Immutable; silently stripped from the update, never rejected.
    pub id: Option<EntityId>,
    /// Immutable; silently stripped from the update, never rejected.
    pub created_at: Option<Timestamp>,
}

impl ProfilePatch {
    /// Reduce the patch to the columns the application is allowed to write:
    /// `full_name`, `department` and `bio`.
    pub fn sanitized(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        if let Some(full_name) = &self.full_name {
            map.insert("full_name".into(), serde_json::Value::String(full_name.clone()));
        }
        if let Some(department) = &self.department {
            map.insert("department".into(), serde_json::Value::String(department.clone()));
        }
        if let Some(bio) = &self.bio {
            map.insert("bio".into(), serde_json::Value::String(bio.clone()));
        }
        map
    }

    /// True when the patch carries no writable fields at all.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.department.is_none() && self.bio.is_none()
    }
}
