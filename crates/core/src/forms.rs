//! Form state and client-side validation.
//!
//! Validation runs before any collaborator call; a failing form never
//! reaches the network. The store is trusted to enforce its own
//! constraints (pair uniqueness, referential integrity) server-side.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::EntityId;

/// Departments offered during registration and profile editing.
pub const DEPARTMENTS: &[&str] = &[
    "Technology",
    "Business",
    "Communication",
    "Analytics",
    "Design",
    "Marketing",
    "Management",
    "HR",
    "Finance",
    "Operations",
];

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: u64 = 6;

/// Proficiency bounds, enforced at input only.
pub const MIN_PROFICIENCY: i16 = 1;
pub const MAX_PROFICIENCY: i16 = 5;

/// Default proficiency pre-selected in the add-skill form.
pub const DEFAULT_PROFICIENCY: i16 = 3;

/// Login form state.
#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
pub struct LoginForm {
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Please enter your password."))]
    pub password: String,
}

/// Registration form state.
#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "Please enter your full name."))]
    pub full_name: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub password: String,
    pub department: String,
}

impl RegisterForm {
    /// Validate the whole form, including the department selection, which
    /// the `validator` derive cannot express against a fixed list.
    pub fn validate_for_submit(&self) -> Result<(), CoreError> {
        if self.department.is_empty() {
            return Err(CoreError::Validation("Please select a department.".into()));
        }
        if !DEPARTMENTS.contains(&self.department.as_str()) {
            return Err(CoreError::Validation(format!(
                "Unknown department '{}'.",
                self.department
            )));
        }
        self.validate().map_err(|errors| CoreError::Validation(first_message(&errors)))
    }
}

impl LoginForm {
    pub fn validate_for_submit(&self) -> Result<(), CoreError> {
        self.validate().map_err(|errors| CoreError::Validation(first_message(&errors)))
    }
}

/// Profile edit form state, seeded from the loaded profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileForm {
    pub full_name: String,
    pub department: String,
    pub bio: String,
}

/// Add-skill form state on the profile screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSkillForm {
    pub skill_id: Option<EntityId>,
    pub proficiency_level: i16,
}

impl Default for AddSkillForm {
    fn default() -> Self {
        Self {
            skill_id: None,
            proficiency_level: DEFAULT_PROFICIENCY,
        }
    }
}

impl AddSkillForm {
    /// Check the selection and the proficiency bounds.
    pub fn validate_for_submit(&self) -> Result<EntityId, CoreError> {
        let skill_id = self
            .skill_id
            .ok_or_else(|| CoreError::Validation("Please select a skill to add.".into()))?;
        validate_proficiency(self.proficiency_level)?;
        Ok(skill_id)
    }
}

/// Validate a proficiency level against the input bounds.
pub fn validate_proficiency(level: i16) -> Result<(), CoreError> {
    if (MIN_PROFICIENCY..=MAX_PROFICIENCY).contains(&level) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Proficiency must be between {MIN_PROFICIENCY} and {MAX_PROFICIENCY}."
        )))
    }
}

/// Pull the first human-readable message out of a validator error set.
fn first_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .filter_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .next()
        .unwrap_or_else(|| "Invalid input.".to_string())
}
