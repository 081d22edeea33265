//! Typed data access over the store's table surface.
//!
//! One method per entity operation. Embedded relations arrive as optional
//! objects on the wire; rows whose teacher or skill side is absent are
//! dropped here, at the boundary, before the internal entities are built
//! (referential integrity in the store is eventually consistent).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crossskill_core::entities::{
    AuthUser, NewProfile, Profile, ProfilePatch, SkillCatalogEntry, SkillRef, TeachableListing,
    UserSkill,
};
use crossskill_core::filter;
use crossskill_core::types::EntityId;

use crate::contract::{AuthProvider, Directory};
use crate::error::StoreError;
use crate::store::{SelectQuery, TableClient};

/// Projection used for `user_skills` reads and writes.
const USER_SKILL_COLUMNS: &str = "id,user_id,skill_id,proficiency_level,skills(name,category)";

/// Projection used for marketplace listing reads.
const LISTING_COLUMNS: &str =
    "id,skill_id,proficiency_level,skills(name,category),users(id,full_name,department,bio)";

/// Production [`Directory`] implementation over the store's REST surface.
///
/// Store calls are authenticated with the current session's access token
/// (obtained from the auth collaborator per call), falling back to the
/// project API key when no session is held.
pub struct HttpDirectory {
    tables: TableClient,
    auth: Arc<dyn AuthProvider>,
}

/// A `user_skills` row as the store returns it, catalog embed included.
#[derive(Debug, Deserialize)]
struct UserSkillRow {
    id: EntityId,
    user_id: EntityId,
    skill_id: EntityId,
    proficiency_level: i16,
    skills: Option<SkillRef>,
}

impl UserSkillRow {
    /// Build the internal entity; `None` when the catalog embed is absent.
    fn into_user_skill(self) -> Option<UserSkill> {
        let skill = self.skills?;
        Some(UserSkill {
            id: self.id,
            user_id: self.user_id,
            skill_id: self.skill_id,
            proficiency_level: self.proficiency_level,
            skill,
        })
    }
}

/// Teacher profile fields embedded in a listing row.
#[derive(Debug, Deserialize)]
struct TeacherEmbed {
    id: EntityId,
    full_name: String,
    department: String,
    #[serde(default)]
    bio: Option<String>,
}

/// A marketplace row as the store returns it, both embeds optional.
#[derive(Debug, Deserialize)]
struct ListingRow {
    id: EntityId,
    skill_id: EntityId,
    proficiency_level: i16,
    skills: Option<SkillRef>,
    users: Option<TeacherEmbed>,
}

impl ListingRow {
    /// Build the listing; `None` when either joined side is absent.
    fn into_listing(self) -> Option<TeachableListing> {
        let skill = self.skills?;
        let teacher = self.users?;
        Some(TeachableListing {
            id: self.id,
            skill_id: self.skill_id,
            skill_name: skill.name,
            skill_category: skill.category,
            teacher_id: teacher.id,
            teacher_name: teacher.full_name,
            teacher_department: teacher.department,
            teacher_bio: teacher.bio,
            proficiency_level: self.proficiency_level,
        })
    }
}

impl HttpDirectory {
    pub fn new(tables: TableClient, auth: Arc<dyn AuthProvider>) -> Self {
        Self { tables, auth }
    }

    /// The current session's access token, if any.
    async fn bearer(&self) -> Option<String> {
        self.auth
            .session()
            .await
            .ok()
            .flatten()
            .map(|session| session.access_token)
    }

    fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, StoreError> {
        serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
        rows.into_iter().map(Self::decode).collect()
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn current_user(&self) -> Result<Option<AuthUser>, StoreError> {
        let session = self
            .auth
            .session()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Ok(session.map(|s| s.user))
    }

    async fn profile_by_auth_id(&self, auth_id: EntityId) -> Result<Profile, StoreError> {
        let bearer = self.bearer().await;
        let query = SelectQuery::new().eq("auth_id", auth_id.to_string());
        let rows = self.tables.select("users", &query, bearer.as_deref()).await?;
        match rows.into_iter().next() {
            Some(row) => Self::decode(row),
            None => Err(StoreError::NotFound { entity: "profile" }),
        }
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        let bearer = self.bearer().await;
        let row = serde_json::to_value(&profile).map_err(|e| StoreError::Decode(e.to_string()))?;
        let created = self.tables.insert("users", &row, "*", bearer.as_deref()).await?;
        tracing::info!(auth_id = %profile.auth_id, "Profile created");
        Self::decode(created)
    }

    async fn update_profile(
        &self,
        auth_id: EntityId,
        patch: ProfilePatch,
    ) -> Result<Profile, StoreError> {
        // Immutable fields never reach the store.
        let sanitized = patch.sanitized();
        if sanitized.is_empty() {
            return self.profile_by_auth_id(auth_id).await;
        }

        let bearer = self.bearer().await;
        let updated = self
            .tables
            .update(
                "users",
                "auth_id",
                &auth_id.to_string(),
                &Value::Object(sanitized),
                bearer.as_deref(),
            )
            .await?;
        tracing::info!(%auth_id, "Profile updated");
        Self::decode(updated)
    }

    async fn user_skills(&self, user_id: EntityId) -> Result<Vec<UserSkill>, StoreError> {
        let bearer = self.bearer().await;
        let query = SelectQuery::new()
            .columns(USER_SKILL_COLUMNS)
            .eq("user_id", user_id.to_string());
        let rows = self
            .tables
            .select("user_skills", &query, bearer.as_deref())
            .await?;
        let rows: Vec<UserSkillRow> = Self::decode_rows(rows)?;
        Ok(rows.into_iter().filter_map(UserSkillRow::into_user_skill).collect())
    }

    async fn skill_catalog(&self) -> Result<Vec<SkillCatalogEntry>, StoreError> {
        let bearer = self.bearer().await;
        let query = SelectQuery::new()
            .columns("id,name,category")
            .order_asc("category")
            .order_asc("name");
        let rows = self.tables.select("skills", &query, bearer.as_deref()).await?;
        Self::decode_rows(rows)
    }

    async fn add_user_skill(
        &self,
        user_id: EntityId,
        skill_id: EntityId,
        proficiency_level: i16,
    ) -> Result<UserSkill, StoreError> {
        let bearer = self.bearer().await;
        let row = serde_json::json!({
            "user_id": user_id,
            "skill_id": skill_id,
            "proficiency_level": proficiency_level,
        });
        let created = self
            .tables
            .insert("user_skills", &row, USER_SKILL_COLUMNS, bearer.as_deref())
            .await?;
        let created: UserSkillRow = Self::decode(created)?;
        created
            .into_user_skill()
            .ok_or(StoreError::NotFound { entity: "skill" })
    }

    async fn remove_user_skill(&self, user_skill_id: EntityId) -> Result<(), StoreError> {
        let bearer = self.bearer().await;
        self.tables
            .delete("user_skills", "id", &user_skill_id.to_string(), bearer.as_deref())
            .await
    }

    async fn teachable_listings(&self) -> Result<Vec<TeachableListing>, StoreError> {
        let bearer = self.bearer().await;
        let query = SelectQuery::new()
            .columns(LISTING_COLUMNS)
            .embed_present("users")
            .embed_present("skills");
        let rows = self
            .tables
            .select("user_skills", &query, bearer.as_deref())
            .await?;
        let rows: Vec<ListingRow> = Self::decode_rows(rows)?;
        // The embed-present filters should already exclude these, but the
        // store is only eventually consistent about the join sides.
        Ok(rows.into_iter().filter_map(ListingRow::into_listing).collect())
    }

    async fn skill_categories(&self) -> Result<Vec<String>, StoreError> {
        let bearer = self.bearer().await;
        let query = SelectQuery::new().columns("category");
        let rows = self.tables.select("skills", &query, bearer.as_deref()).await?;
        Ok(filter::distinct(column_values(rows, "category")))
    }

    async fn teacher_departments(&self) -> Result<Vec<String>, StoreError> {
        let bearer = self.bearer().await;
        let query = SelectQuery::new().columns("department");
        let rows = self.tables.select("users", &query, bearer.as_deref()).await?;
        Ok(filter::distinct(column_values(rows, "department")))
    }
}

/// Extract one string column from raw rows, skipping nulls.
fn column_values(rows: Vec<Value>, column: &str) -> Vec<String> {
    rows.into_iter()
        .filter_map(|row| row.get(column).and_then(|v| v.as_str()).map(String::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_row_with_both_embeds_builds_a_listing() {
        let row: ListingRow = serde_json::from_value(serde_json::json!({
            "id": "6f3b0f0a-8c8e-4a3f-9a53-0f5a6f3b0f0a",
            "skill_id": "aaaaaaaa-8c8e-4a3f-9a53-0f5a6f3b0f0a",
            "proficiency_level": 4,
            "skills": { "name": "Go", "category": "Languages" },
            "users": {
                "id": "bbbbbbbb-8c8e-4a3f-9a53-0f5a6f3b0f0a",
                "full_name": "Jane Doe",
                "department": "Technology"
            }
        }))
        .unwrap();

        let listing = row.into_listing().unwrap();
        assert_eq!(listing.skill_name, "Go");
        assert_eq!(listing.teacher_name, "Jane Doe");
        assert_eq!(listing.teacher_bio, None);
        assert_eq!(listing.proficiency_level, 4);
    }

    #[test]
    fn listing_row_missing_either_embed_is_dropped() {
        let base = serde_json::json!({
            "id": "6f3b0f0a-8c8e-4a3f-9a53-0f5a6f3b0f0a",
            "skill_id": "aaaaaaaa-8c8e-4a3f-9a53-0f5a6f3b0f0a",
            "proficiency_level": 2,
            "skills": null,
            "users": null,
        });

        let row: ListingRow = serde_json::from_value(base.clone()).unwrap();
        assert!(row.into_listing().is_none());

        let mut with_skill = base.clone();
        with_skill["skills"] = serde_json::json!({ "name": "Go", "category": "Languages" });
        let row: ListingRow = serde_json::from_value(with_skill).unwrap();
        assert!(row.into_listing().is_none(), "missing teacher must drop the row");
    }

    #[test]
    fn user_skill_row_requires_the_catalog_embed() {
        let row: UserSkillRow = serde_json::from_value(serde_json::json!({
            "id": "6f3b0f0a-8c8e-4a3f-9a53-0f5a6f3b0f0a",
            "user_id": "bbbbbbbb-8c8e-4a3f-9a53-0f5a6f3b0f0a",
            "skill_id": "aaaaaaaa-8c8e-4a3f-9a53-0f5a6f3b0f0a",
            "proficiency_level": 5,
            "skills": null
        }))
        .unwrap();
        assert!(row.into_user_skill().is_none());
    }

    #[test]
    fn column_values_skips_null_cells() {
        let rows = vec![
            serde_json::json!({ "category": "Languages" }),
            serde_json::json!({ "category": null }),
            serde_json::json!({ "category": "Soft Skills" }),
        ];
        assert_eq!(column_values(rows, "category"), vec!["Languages", "Soft Skills"]);
    }
}
