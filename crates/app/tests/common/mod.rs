//! In-memory fakes of the two external collaborators, plus builders for a
//! populated environment. The fakes enforce the same contracts the real
//! services do (credential checks, pair uniqueness, joined reads that skip
//! rows with missing references) so the controllers under test cannot tell
//! the difference.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crossskill_client::{AuthError, AuthEvent, AuthProvider, Directory, StoreError};
use crossskill_core::entities::{
    AuthUser, NewProfile, Profile, ProfilePatch, Session, SkillCatalogEntry, SkillRef,
    TeachableListing, UserSkill,
};
use crossskill_core::filter::distinct;
use crossskill_core::types::EntityId;

// ---------------------------------------------------------------------------
// Fake auth service
// ---------------------------------------------------------------------------

pub struct FakeAuth {
    accounts: Mutex<HashMap<String, (String, AuthUser)>>,
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    /// Total collaborator calls received, across all operations.
    pub calls: AtomicUsize,
}

impl FakeAuth {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            events,
            calls: AtomicUsize::new(0),
        })
    }

    /// Register an account without going through the sign-up flow.
    pub fn seed_account(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: uuid::Uuid::new_v4(),
            email: email.to_string(),
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let user = match self.accounts.lock().unwrap().get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => {
                return Err(AuthError::Api {
                    status: 400,
                    message: "Invalid login credentials".into(),
                })
            }
        };
        let session = Session {
            access_token: format!("token-{}", user.id),
            user,
        };
        *self.current.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AuthError::Api {
                status: 422,
                message: "User already registered".into(),
            });
        }
        let user = AuthUser {
            id: uuid::Uuid::new_v4(),
            email: email.to_string(),
        };
        accounts.insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.current.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.current.lock().unwrap().clone())
    }

    fn changes(&self) -> broadcast::Receiver<AuthEvent> {
        let rx = self.events.subscribe();
        let snapshot = self.current.lock().unwrap().clone();
        let _ = self.events.send(AuthEvent::InitialSession(snapshot));
        rx
    }
}

// ---------------------------------------------------------------------------
// Fake relational store
// ---------------------------------------------------------------------------

/// A `user_skills` row as stored, before the catalog join.
#[derive(Debug, Clone)]
struct SkillRow {
    id: EntityId,
    user_id: EntityId,
    skill_id: EntityId,
    proficiency_level: i16,
}

pub struct FakeDirectory {
    auth: Arc<FakeAuth>,
    profiles: Mutex<Vec<Profile>>,
    catalog: Mutex<Vec<SkillCatalogEntry>>,
    skills: Mutex<Vec<SkillRow>>,
    /// Total read operations served, for cache-behavior assertions.
    pub reads: AtomicUsize,
    pub fail_create_profile: AtomicBool,
}

impl FakeDirectory {
    pub fn new(auth: Arc<FakeAuth>) -> Arc<Self> {
        Arc::new(Self {
            auth,
            profiles: Mutex::new(Vec::new()),
            catalog: Mutex::new(Vec::new()),
            skills: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
            fail_create_profile: AtomicBool::new(false),
        })
    }

    pub fn seed_catalog(&self, name: &str, category: &str) -> SkillCatalogEntry {
        let entry = SkillCatalogEntry {
            id: uuid::Uuid::new_v4(),
            name: name.to_string(),
            category: category.to_string(),
        };
        self.catalog.lock().unwrap().push(entry.clone());
        entry
    }

    pub fn seed_profile(&self, user: &AuthUser, full_name: &str, department: &str) -> Profile {
        let profile = Profile {
            id: uuid::Uuid::new_v4(),
            auth_id: user.id,
            full_name: full_name.to_string(),
            email: user.email.clone(),
            department: department.to_string(),
            bio: None,
            created_at: chrono::Utc::now(),
        };
        self.profiles.lock().unwrap().push(profile.clone());
        profile
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn join(&self, row: &SkillRow) -> Option<UserSkill> {
        let catalog = self.catalog.lock().unwrap();
        let entry = catalog.iter().find(|e| e.id == row.skill_id)?;
        Some(UserSkill {
            id: row.id,
            user_id: row.user_id,
            skill_id: row.skill_id,
            proficiency_level: row.proficiency_level,
            skill: SkillRef {
                name: entry.name.clone(),
                category: entry.category.clone(),
            },
        })
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn current_user(&self) -> Result<Option<AuthUser>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let session = self
            .auth
            .session()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Ok(session.map(|s| s.user))
    }

    async fn profile_by_auth_id(&self, auth_id: EntityId) -> Result<Profile, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.auth_id == auth_id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "profile" })
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        if self.fail_create_profile.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 500,
                message: "profile insert failed".into(),
            });
        }
        let row = Profile {
            id: uuid::Uuid::new_v4(),
            auth_id: profile.auth_id,
            full_name: profile.full_name,
            email: profile.email,
            department: profile.department,
            bio: None,
            created_at: chrono::Utc::now(),
        };
        self.profiles.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        auth_id: EntityId,
        patch: ProfilePatch,
    ) -> Result<Profile, StoreError> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .iter_mut()
            .find(|p| p.auth_id == auth_id)
            .ok_or(StoreError::NotFound { entity: "profile" })?;

        // Apply only what sanitization lets through, as the store would.
        let allowed = patch.sanitized();
        if let Some(full_name) = allowed.get("full_name").and_then(|v| v.as_str()) {
            profile.full_name = full_name.to_string();
        }
        if let Some(department) = allowed.get("department").and_then(|v| v.as_str()) {
            profile.department = department.to_string();
        }
        if let Some(bio) = allowed.get("bio").and_then(|v| v.as_str()) {
            profile.bio = Some(bio.to_string());
        }
        Ok(profile.clone())
    }

    async fn user_skills(&self, user_id: EntityId) -> Result<Vec<UserSkill>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows: Vec<SkillRow> = self
            .skills
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        Ok(rows.iter().filter_map(|row| self.join(row)).collect())
    }

    async fn skill_catalog(&self) -> Result<Vec<SkillCatalogEntry>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.catalog.lock().unwrap().clone();
        entries.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        Ok(entries)
    }

    async fn add_user_skill(
        &self,
        user_id: EntityId,
        skill_id: EntityId,
        proficiency_level: i16,
    ) -> Result<UserSkill, StoreError> {
        let mut skills = self.skills.lock().unwrap();
        if skills
            .iter()
            .any(|row| row.user_id == user_id && row.skill_id == skill_id)
        {
            return Err(StoreError::Conflict(
                "duplicate key value violates unique constraint \
                 \"user_skills_user_id_skill_id_key\""
                    .into(),
            ));
        }
        let row = SkillRow {
            id: uuid::Uuid::new_v4(),
            user_id,
            skill_id,
            proficiency_level,
        };
        skills.push(row.clone());
        drop(skills);
        self.join(&row).ok_or(StoreError::NotFound { entity: "skill" })
    }

    async fn remove_user_skill(&self, user_skill_id: EntityId) -> Result<(), StoreError> {
        self.skills
            .lock()
            .unwrap()
            .retain(|row| row.id != user_skill_id);
        Ok(())
    }

    async fn teachable_listings(&self) -> Result<Vec<TeachableListing>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let profiles = self.profiles.lock().unwrap().clone();
        let rows = self.skills.lock().unwrap().clone();
        let listings = rows
            .iter()
            .filter_map(|row| {
                let skill = self.join(row)?;
                let teacher = profiles.iter().find(|p| p.id == row.user_id)?;
                Some(TeachableListing {
                    id: row.id,
                    skill_id: row.skill_id,
                    skill_name: skill.skill.name,
                    skill_category: skill.skill.category,
                    teacher_id: teacher.id,
                    teacher_name: teacher.full_name.clone(),
                    teacher_department: teacher.department.clone(),
                    teacher_bio: teacher.bio.clone(),
                    proficiency_level: row.proficiency_level,
                })
            })
            .collect();
        Ok(listings)
    }

    async fn skill_categories(&self) -> Result<Vec<String>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let categories = self
            .catalog
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.category.clone())
            .collect::<Vec<_>>();
        Ok(distinct(categories))
    }

    async fn teacher_departments(&self) -> Result<Vec<String>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let departments = self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.department.clone())
            .collect::<Vec<_>>();
        Ok(distinct(departments))
    }
}

// ---------------------------------------------------------------------------
// Environment builder
// ---------------------------------------------------------------------------

/// Everything a controller test needs, wired together.
pub struct TestEnv {
    pub auth: Arc<FakeAuth>,
    pub directory: Arc<FakeDirectory>,
    pub cache: Arc<crossskill_app::cache::QueryCache>,
    pub notices: crossskill_app::notice::NoticeBus,
}

impl TestEnv {
    pub fn new() -> Self {
        let auth = FakeAuth::new();
        let directory = FakeDirectory::new(Arc::clone(&auth));
        Self {
            auth,
            directory,
            cache: Arc::new(crossskill_app::cache::QueryCache::new(
                std::time::Duration::from_secs(60),
            )),
            notices: crossskill_app::notice::NoticeBus::default(),
        }
    }

    /// Seed an account with a profile and sign it in.
    pub async fn signed_in_user(&self, email: &str, name: &str, department: &str) -> Profile {
        let user = self.auth.seed_account(email, "correct horse");
        let profile = self.directory.seed_profile(&user, name, department);
        self.auth
            .sign_in(email, "correct horse")
            .await
            .expect("seeded credentials must sign in");
        profile
    }
}

/// Drain every notice published so far.
pub fn drain_notices(
    rx: &mut tokio::sync::broadcast::Receiver<crossskill_app::notice::Notice>,
) -> Vec<crossskill_app::notice::Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}
