//! Profile screen controller.
//!
//! The reads form a dependency chain: the profile read is enabled only
//! once the auth identity is known, and the skill-list read only once the
//! profile id is known. A disabled read is never issued; callers observe a
//! pending state instead of an error.

use std::sync::Arc;

use crossskill_client::{Directory, StoreError};
use crossskill_core::entities::{Profile, ProfilePatch, SkillCatalogEntry, UserSkill};
use crossskill_core::forms::{AddSkillForm, ProfileForm};
use crossskill_core::types::EntityId;

use crate::cache::{QueryCache, QueryKey, QueryState};
use crate::notice::{Notice, NoticeBus};

/// View state of the profile itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileView {
    Loading,
    /// The session exists but no profile row does; the user must complete
    /// their registration.
    MissingRegistration,
    Failed(String),
    Ready(Profile),
}

pub struct ProfileScreen {
    directory: Arc<dyn Directory>,
    cache: Arc<QueryCache>,
    notices: NoticeBus,
    /// Profile edit form, seeded from the first successful profile read.
    pub edit: ProfileForm,
    pub add_skill: AddSkillForm,
    form_seeded: bool,
}

impl ProfileScreen {
    pub fn new(directory: Arc<dyn Directory>, cache: Arc<QueryCache>, notices: NoticeBus) -> Self {
        Self {
            directory,
            cache,
            notices,
            edit: ProfileForm::default(),
            add_skill: AddSkillForm::default(),
            form_seeded: false,
        }
    }

    async fn auth_user_id(&self) -> Result<Option<EntityId>, StoreError> {
        let directory = Arc::clone(&self.directory);
        let user = self
            .cache
            .get_or_fetch(QueryKey::CurrentUser, move || async move {
                directory.current_user().await
            })
            .await?;
        Ok(user.map(|u| u.id))
    }

    /// The profile view state, fetching through the cache.
    pub async fn profile(&mut self) -> ProfileView {
        let auth_id = match self.auth_user_id().await {
            Ok(Some(id)) => id,
            // Identity not yet known: the profile read stays disabled.
            Ok(None) => return ProfileView::Loading,
            Err(e) => return ProfileView::Failed(e.to_string()),
        };

        let directory = Arc::clone(&self.directory);
        let fetched = self
            .cache
            .get_or_fetch(QueryKey::Profile(auth_id), move || async move {
                directory.profile_by_auth_id(auth_id).await
            })
            .await;

        match fetched {
            Ok(profile) => {
                if !self.form_seeded {
                    self.edit = ProfileForm {
                        full_name: profile.full_name.clone(),
                        department: profile.department.clone(),
                        bio: profile.bio.clone().unwrap_or_default(),
                    };
                    self.form_seeded = true;
                }
                ProfileView::Ready(profile)
            }
            Err(StoreError::NotFound { .. }) => ProfileView::MissingRegistration,
            Err(e) => ProfileView::Failed(e.to_string()),
        }
    }

    /// The user's taught skills; pending until the profile id is known.
    pub async fn user_skills(&mut self) -> QueryState<Vec<UserSkill>> {
        let profile = match self.profile().await {
            ProfileView::Ready(profile) => profile,
            ProfileView::Failed(e) => return QueryState::Failed(e),
            _ => return QueryState::Pending,
        };

        let directory = Arc::clone(&self.directory);
        let user_id = profile.id;
        self.cache
            .get_or_fetch(QueryKey::UserSkills(user_id), move || async move {
                directory.user_skills(user_id).await
            })
            .await
            .into()
    }

    /// The full skill catalog (shared cache key with other screens).
    pub async fn catalog(&self) -> QueryState<Vec<SkillCatalogEntry>> {
        let directory = Arc::clone(&self.directory);
        self.cache
            .get_or_fetch(QueryKey::Catalog, move || async move {
                directory.skill_catalog().await
            })
            .await
            .into()
    }

    /// Catalog entries the user does not already teach, for the add-skill
    /// select.
    pub async fn available_skills(&mut self) -> QueryState<Vec<SkillCatalogEntry>> {
        let taught = match self.user_skills().await {
            QueryState::Ready(skills) => skills,
            QueryState::Pending => return QueryState::Pending,
            QueryState::Failed(e) => return QueryState::Failed(e),
        };
        match self.catalog().await {
            QueryState::Ready(catalog) => QueryState::Ready(
                catalog
                    .into_iter()
                    .filter(|entry| !taught.iter().any(|skill| skill.skill_id == entry.id))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Save the edit form. On failure the form state is preserved so the
    /// user can retry manually.
    pub async fn save_profile(&mut self) -> Option<Profile> {
        let auth_id = match self.auth_user_id().await {
            Ok(Some(id)) => id,
            _ => {
                self.notices
                    .publish(Notice::error("Update Failed", "User not authenticated."));
                return None;
            }
        };

        let patch = ProfilePatch {
            full_name: Some(self.edit.full_name.clone()),
            department: Some(self.edit.department.clone()),
            bio: Some(self.edit.bio.clone()),
            ..Default::default()
        };

        match self.directory.update_profile(auth_id, patch).await {
            Ok(profile) => {
                self.cache.invalidate(&QueryKey::Profile(auth_id));
                self.notices.publish(Notice::info(
                    "Profile Updated",
                    "Your profile has been successfully updated.",
                ));
                Some(profile)
            }
            Err(e) => {
                self.notices.publish(Notice::error("Update Failed", e.to_string()));
                None
            }
        }
    }

    /// Add the skill selected in the form with the chosen proficiency.
    pub async fn add_selected_skill(&mut self) -> Option<UserSkill> {
        let skill_id = match self.add_skill.validate_for_submit() {
            Ok(id) => id,
            Err(e) => {
                self.notices
                    .publish(Notice::error("Failed to Add Skill", e.to_string()));
                return None;
            }
        };

        let profile = match self.profile().await {
            ProfileView::Ready(profile) => profile,
            _ => {
                self.notices
                    .publish(Notice::error("Failed to Add Skill", "Profile not loaded."));
                return None;
            }
        };

        let added = self
            .directory
            .add_user_skill(profile.id, skill_id, self.add_skill.proficiency_level)
            .await;

        match added {
            Ok(skill) => {
                self.cache.invalidate(&QueryKey::UserSkills(profile.id));
                // The marketplace projection reads the same rows.
                self.cache.invalidate(&QueryKey::Listings);
                self.add_skill = AddSkillForm::default();
                self.notices.publish(Notice::info(
                    "Skill Added",
                    "New skill added to your profile.",
                ));
                Some(skill)
            }
            Err(e) => {
                self.notices
                    .publish(Notice::error("Failed to Add Skill", e.to_string()));
                None
            }
        }
    }

    /// Remove one taught skill by its association id.
    pub async fn remove_skill(&mut self, user_skill_id: EntityId) -> bool {
        let profile = match self.profile().await {
            ProfileView::Ready(profile) => profile,
            _ => {
                self.notices
                    .publish(Notice::error("Failed to Remove Skill", "Profile not loaded."));
                return false;
            }
        };

        match self.directory.remove_user_skill(user_skill_id).await {
            Ok(()) => {
                self.cache.invalidate(&QueryKey::UserSkills(profile.id));
                self.cache.invalidate(&QueryKey::Listings);
                self.notices.publish(Notice::info(
                    "Skill Removed",
                    "Skill removed from your profile.",
                ));
                true
            }
            Err(e) => {
                self.notices
                    .publish(Notice::error("Failed to Remove Skill", e.to_string()));
                false
            }
        }
    }
}
