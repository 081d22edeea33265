//! Registration screen controller.
//!
//! Registration is two collaborator calls: create the auth identity, then
//! create the profile row. When the second fails the identity is left
//! without a profile; this intermediate state is accepted (no rollback),
//! surfaced as a warning telling the user to contact support, and the user
//! is still navigated forward to the login screen.

use std::sync::Arc;

use crossskill_client::{AuthProvider, Directory};
use crossskill_core::entities::NewProfile;
use crossskill_core::forms::RegisterForm;
use crossskill_core::routes::{Navigation, Route};

use crate::notice::{Notice, NoticeBus};

pub struct RegisterScreen {
    auth: Arc<dyn AuthProvider>,
    directory: Arc<dyn Directory>,
    notices: NoticeBus,
    pub form: RegisterForm,
}

impl RegisterScreen {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        directory: Arc<dyn Directory>,
        notices: NoticeBus,
    ) -> Self {
        Self {
            auth,
            directory,
            notices,
            form: RegisterForm::default(),
        }
    }

    /// Attempt registration with the current form state.
    ///
    /// Validation runs before any collaborator call; an invalid form never
    /// reaches the network.
    pub async fn submit(&mut self) -> Option<Navigation> {
        if let Err(e) = self.form.validate_for_submit() {
            self.notices
                .publish(Notice::error("Registration Error", e.to_string()));
            return None;
        }

        let user = match self.auth.sign_up(&self.form.email, &self.form.password).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Sign-up failed");
                self.notices
                    .publish(Notice::error("Registration Failed", e.to_string()));
                return None;
            }
        };

        // Some auth services omit the email until it is confirmed.
        let email = if user.email.is_empty() {
            self.form.email.clone()
        } else {
            user.email.clone()
        };

        let profile = NewProfile {
            auth_id: user.id,
            email,
            full_name: self.form.full_name.clone(),
            department: self.form.department.clone(),
        };

        match self.directory.create_profile(profile).await {
            Ok(_) => {
                self.notices.publish(Notice::info(
                    "Registration Successful!",
                    "Please check your email to confirm your account.",
                ));
                Some(Navigation::Push(Route::Login))
            }
            Err(e) => {
                // Accepted inconsistent state: identity exists, profile
                // does not. Navigate forward anyway.
                tracing::error!(auth_id = %user.id, error = %e, "Profile creation failed after sign-up");
                self.notices.publish(Notice::warning(
                    "Registration Partially Failed",
                    format!(
                        "Your account was created, but we couldn't set up your profile: {e}. \
                         Please contact support."
                    ),
                ));
                Some(Navigation::Push(Route::Login))
            }
        }
    }
}
