//! Login screen controller.

use std::sync::Arc;

use crossskill_client::AuthProvider;
use crossskill_core::forms::LoginForm;
use crossskill_core::routes::{Navigation, Route};

use crate::cache::{QueryCache, QueryKey};
use crate::notice::{Notice, NoticeBus};

pub struct LoginScreen {
    auth: Arc<dyn AuthProvider>,
    cache: Arc<QueryCache>,
    notices: NoticeBus,
    pub form: LoginForm,
}

impl LoginScreen {
    pub fn new(auth: Arc<dyn AuthProvider>, cache: Arc<QueryCache>, notices: NoticeBus) -> Self {
        Self {
            auth,
            cache,
            notices,
            form: LoginForm::default(),
        }
    }

    /// Attempt to sign in with the current form state.
    ///
    /// On failure the form remains editable and nothing is retried; the
    /// collaborator's message is surfaced verbatim.
    pub async fn submit(&mut self) -> Option<Navigation> {
        if let Err(e) = self.form.validate_for_submit() {
            self.notices.publish(Notice::error("Login Failed", e.to_string()));
            return None;
        }

        match self.auth.sign_in(&self.form.email, &self.form.password).await {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "Login successful");
                // An identity cached while signed out is stale now.
                self.cache.invalidate(&QueryKey::CurrentUser);
                self.notices
                    .publish(Notice::info("Login Successful", "Welcome back!"));
                Some(Navigation::Push(Route::Dashboard))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                self.notices.publish(Notice::error("Login Failed", e.to_string()));
                None
            }
        }
    }
}
