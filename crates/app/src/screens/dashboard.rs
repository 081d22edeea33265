//! Dashboard screen controller.

use std::sync::Arc;

use crossskill_client::AuthProvider;

use crate::cache::QueryCache;
use crate::notice::{Notice, NoticeBus};

pub struct DashboardScreen {
    auth: Arc<dyn AuthProvider>,
    cache: Arc<QueryCache>,
    notices: NoticeBus,
}

impl DashboardScreen {
    pub fn new(auth: Arc<dyn AuthProvider>, cache: Arc<QueryCache>, notices: NoticeBus) -> Self {
        Self {
            auth,
            cache,
            notices,
        }
    }

    /// End the session. The session store observes the resulting auth
    /// event and the route gate redirects away from the protected screens.
    pub async fn sign_out(&self) {
        match self.auth.sign_out().await {
            Ok(()) => {
                // Cached reads belong to the signed-out user.
                self.cache.clear();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-out failed");
                self.notices.publish(Notice::error("Logout Failed", e.to_string()));
            }
        }
    }
}
