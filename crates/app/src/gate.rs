//! Route gate wiring.
//!
//! Applies the pure policy in `crossskill_core::routes` to a history stack,
//! re-evaluating the current location on every session transition. The gate
//! never fetches data; its only side effect is navigation. A refused path
//! never enters history: a fresh navigation records the redirect target on
//! top of the page the user was on, and a session transition that
//! invalidates the current page redirects it in place.

use tokio::sync::watch;

use crossskill_core::routes::{decide, Disposition, Navigation, Route, SessionState};

/// Minimal history stack with push/replace semantics.
#[derive(Debug, Default)]
pub struct History {
    stack: Vec<Route>,
}

impl History {
    pub fn current(&self) -> Option<&Route> {
        self.stack.last()
    }

    pub fn push(&mut self, route: Route) {
        self.stack.push(route);
    }

    /// Replace the current entry (or push when the stack is empty).
    pub fn replace(&mut self, route: Route) {
        self.stack.pop();
        self.stack.push(route);
    }

    /// Pop the current entry; the previous one becomes current.
    pub fn back(&mut self) -> Option<&Route> {
        self.stack.pop();
        self.stack.last()
    }

    pub fn entries(&self) -> &[Route] {
        &self.stack
    }
}

/// Session-aware navigation gate.
///
/// Holds a subscription to the session store; the gate's lifetime bounds
/// the subscription's lifetime.
pub struct RouteGate {
    session: watch::Receiver<SessionState>,
    history: History,
}

impl RouteGate {
    pub fn new(session: watch::Receiver<SessionState>) -> Self {
        Self {
            session,
            history: History::default(),
        }
    }

    /// Decide a user-initiated navigation to `path` and record it.
    ///
    /// Refused paths never enter history: the redirect target is recorded
    /// instead, on top of the page the user was on, so the back button
    /// still returns there.
    pub fn navigate(&mut self, path: &str) -> Disposition {
        let route = Route::parse(path);
        let state = self.session.borrow().clone();
        let disposition = decide(&route, &state);

        match &disposition {
            Disposition::Render(rendered) => self.history.push(rendered.clone()),
            Disposition::Redirect { to, .. } => self.history.push(to.clone()),
            Disposition::NotFound => self.history.push(route),
            // No navigation decisions before the initial resolution.
            Disposition::Loading | Disposition::Unavailable => {}
        }
        disposition
    }

    /// Apply a navigation produced by a screen action.
    pub fn apply(&mut self, navigation: &Navigation) -> Disposition {
        match navigation {
            Navigation::Push(route) => self.navigate(route.path()),
            Navigation::Replace(route) => {
                let state = self.session.borrow().clone();
                let disposition = decide(route, &state);
                match &disposition {
                    Disposition::Render(rendered) => self.history.replace(rendered.clone()),
                    Disposition::Redirect { to, .. } => self.history.replace(to.clone()),
                    _ => {}
                }
                disposition
            }
        }
    }

    /// Re-evaluate the current location against the current session state.
    ///
    /// Called after a session transition; a location that became
    /// unreachable is redirected in place.
    pub fn reevaluate(&mut self) -> Option<Disposition> {
        let current = self.history.current().cloned()?;
        let state = self.session.borrow().clone();
        let disposition = decide(&current, &state);
        if let Disposition::Redirect { to, .. } = &disposition {
            self.history.replace(to.clone());
        }
        Some(disposition)
    }

    /// Wait for the next session transition, then re-evaluate.
    ///
    /// Returns `None` when the session store has gone away.
    pub async fn changed(&mut self) -> Option<Disposition> {
        self.session.changed().await.ok()?;
        self.reevaluate()
    }

    pub fn current(&self) -> Option<&Route> {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}
