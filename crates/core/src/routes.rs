//! Route-gate policy.
//!
//! [`decide`] is the single place that answers "which screen is reachable
//! given the current session state". It is pure: the gate wiring in the
//! application crate applies the decision to a history stack, and the
//! session store owns the state transitions.

use serde::{Deserialize, Serialize};

use crate::entities::Session;

/// Current authentication state as mirrored from the external auth service.
///
/// `Unknown` holds from process start until the initial resolution
/// completes exactly once; `Unavailable` is the bounded-wait fallback when
/// it never does. Thereafter the state alternates between `Absent` and
/// `Present` on every auth event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Unknown,
    /// The auth service failed to resolve the initial state in time.
    Unavailable,
    Absent,
    Present(Session),
}

impl SessionState {
    pub fn is_present(&self) -> bool {
        matches!(self, SessionState::Present(_))
    }

    /// The session, when one is present.
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Present(session) => Some(session),
            _ => None,
        }
    }
}

/// Application routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Landing,
    Login,
    Register,
    Dashboard,
    Profile,
    Marketplace,
    /// Any path that matches no known route.
    Unknown(String),
}

impl Route {
    /// Parse a path into a route. Unmatched paths map to [`Route::Unknown`].
    pub fn parse(path: &str) -> Route {
        match path {
            "/" => Route::Landing,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/dashboard" => Route::Dashboard,
            "/profile" => Route::Profile,
            "/skills" => Route::Marketplace,
            other => Route::Unknown(other.to_string()),
        }
    }

    /// The canonical path for this route.
    pub fn path(&self) -> &str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
            Route::Profile => "/profile",
            Route::Marketplace => "/skills",
            Route::Unknown(path) => path,
        }
    }

    /// Routes that are only reachable without a session (landing, login,
    /// register). A present session redirects them to the dashboard.
    pub fn is_guest_only(&self) -> bool {
        matches!(self, Route::Landing | Route::Login | Route::Register)
    }

    /// Routes that require a session.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Profile | Route::Marketplace)
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Initial session state not yet resolved; render the loading
    /// placeholder and make no navigation decision.
    Loading,
    /// The auth service never resolved; render an explicit error view.
    Unavailable,
    /// The requested route is reachable.
    Render(Route),
    /// The requested route is not reachable in this session state.
    Redirect {
        to: Route,
        /// Always true: redirects replace the current history entry so the
        /// back button never returns to the gated path.
        replace: bool,
    },
    /// Unmatched path.
    NotFound,
}

/// A navigation produced by a screen action.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Push(Route),
    Replace(Route),
}

/// Decide what to do with a navigation to `route` under `state`.
///
/// While the state is `Unknown` every path renders the loading placeholder,
/// matched or not; no navigation decisions are made before the initial
/// resolution. Once resolved, unmatched paths are `NotFound` regardless of
/// absent/present.
pub fn decide(route: &Route, state: &SessionState) -> Disposition {
    match state {
        SessionState::Unknown => Disposition::Loading,
        SessionState::Unavailable => Disposition::Unavailable,
        SessionState::Absent => match route {
            Route::Unknown(_) => Disposition::NotFound,
            r if r.is_protected() => Disposition::Redirect {
                to: Route::Login,
                replace: true,
            },
            r => Disposition::Render(r.clone()),
        },
        SessionState::Present(_) => match route {
            Route::Unknown(_) => Disposition::NotFound,
            r if r.is_guest_only() => Disposition::Redirect {
                to: Route::Dashboard,
                replace: true,
            },
            r => Disposition::Render(r.clone()),
        },
    }
}
