//! Process-wide session store.
//!
//! Mirrors the external auth session behind a `tokio::sync::watch` channel:
//! state is `Unknown` until the initial resolution completes exactly once,
//! then `Absent`/`Present` on every subsequent auth event. Consumers read
//! through [`SessionStore::subscribe`], never through shared mutable state.
//!
//! The forwarding task's lifetime exactly bounds the provider subscription:
//! dropping the store cancels the task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crossskill_client::{AuthEvent, AuthProvider};
use crossskill_core::routes::SessionState;

/// Handle to the session mirror task.
pub struct SessionStore {
    rx: watch::Receiver<SessionState>,
    cancel: CancellationToken,
}

impl SessionStore {
    /// Spawn the mirror task.
    ///
    /// The initial resolution is bounded by `resolve_timeout`; if the auth
    /// service does not answer in time the state becomes
    /// [`SessionState::Unavailable`] instead of loading forever.
    pub fn start(provider: Arc<dyn AuthProvider>, resolve_timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(SessionState::Unknown);
        let cancel = CancellationToken::new();
        tokio::spawn(run(provider, tx, resolve_timeout, cancel.clone()));
        Self { rx, cancel }
    }

    /// Subscribe to session state transitions.
    ///
    /// The current state counts as already seen: `changed()` on the
    /// returned receiver only wakes for transitions after this call.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        let mut rx = self.rx.clone();
        rx.mark_unchanged();
        rx
    }

    /// The current state, point-in-time.
    pub fn state(&self) -> SessionState {
        self.rx.borrow().clone()
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    provider: Arc<dyn AuthProvider>,
    tx: watch::Sender<SessionState>,
    resolve_timeout: Duration,
    cancel: CancellationToken,
) {
    // Subscribe before the initial read so no transition is missed between
    // the snapshot and the event loop.
    let mut events = provider.changes();

    let initial = tokio::select! {
        _ = cancel.cancelled() => return,
        resolved = tokio::time::timeout(resolve_timeout, provider.session()) => resolved,
    };

    let state = match initial {
        Ok(Ok(Some(session))) => SessionState::Present(session),
        Ok(Ok(None)) => SessionState::Absent,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Initial session resolution failed");
            SessionState::Unavailable
        }
        Err(_) => {
            tracing::error!(
                timeout_secs = resolve_timeout.as_secs(),
                "Auth service did not resolve the initial session in time"
            );
            SessionState::Unavailable
        }
    };

    let unavailable = state == SessionState::Unavailable;
    let _ = tx.send(state);
    if unavailable {
        return;
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(AuthEvent::SignedIn(session)) => {
                    tracing::debug!(user_id = %session.user.id, "Session present");
                    let _ = tx.send(SessionState::Present(session));
                }
                Ok(AuthEvent::SignedOut) => {
                    tracing::debug!("Session absent");
                    let _ = tx.send(SessionState::Absent);
                }
                // The startup snapshot; already resolved above.
                Ok(AuthEvent::InitialSession(_)) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth event stream lagged; re-syncing");
                    if let Ok(current) = provider.session().await {
                        let _ = tx.send(match current {
                            Some(session) => SessionState::Present(session),
                            None => SessionState::Absent,
                        });
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crossskill_client::error::AuthError;
    use crossskill_core::entities::{AuthUser, Session};

    fn session(email: &str) -> Session {
        Session {
            access_token: "token".into(),
            user: AuthUser {
                id: uuid::Uuid::new_v4(),
                email: email.into(),
            },
        }
    }

    /// Scriptable provider: a stored point-in-time session plus a manual
    /// event channel. `hang` simulates an auth service that never answers.
    struct StubAuth {
        current: Mutex<Option<Session>>,
        events: broadcast::Sender<AuthEvent>,
        hang: bool,
    }

    impl StubAuth {
        fn new(current: Option<Session>, hang: bool) -> Arc<Self> {
            let (events, _) = broadcast::channel(16);
            Arc::new(Self {
                current: Mutex::new(current),
                events,
                hang,
            })
        }

        fn emit(&self, event: AuthEvent) {
            let _ = self.events.send(event);
        }
    }

    #[async_trait]
    impl AuthProvider for StubAuth {
        async fn sign_in(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
            unreachable!("not used by the session store")
        }

        async fn sign_up(&self, _email: &str, _password: &str) -> Result<AuthUser, AuthError> {
            unreachable!("not used by the session store")
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            unreachable!("not used by the session store")
        }

        async fn session(&self) -> Result<Option<Session>, AuthError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(self.current.lock().unwrap().clone())
        }

        fn changes(&self) -> broadcast::Receiver<AuthEvent> {
            self.events.subscribe()
        }
    }

    async fn next_state(rx: &mut watch::Receiver<SessionState>) -> SessionState {
        rx.changed().await.expect("store alive");
        rx.borrow().clone()
    }

    #[tokio::test]
    async fn initial_state_resolves_to_absent() {
        let store = SessionStore::start(StubAuth::new(None, false), Duration::from_secs(5));
        let mut rx = store.subscribe();
        assert_eq!(next_state(&mut rx).await, SessionState::Absent);
    }

    #[tokio::test]
    async fn initial_state_resolves_to_present() {
        let existing = session("jane@example.com");
        let store = SessionStore::start(
            StubAuth::new(Some(existing.clone()), false),
            Duration::from_secs(5),
        );
        let mut rx = store.subscribe();
        assert_eq!(next_state(&mut rx).await, SessionState::Present(existing));
    }

    #[tokio::test]
    async fn auth_events_toggle_between_present_and_absent() {
        let stub = StubAuth::new(None, false);
        let store = SessionStore::start(stub.clone(), Duration::from_secs(5));
        let mut rx = store.subscribe();
        assert_eq!(next_state(&mut rx).await, SessionState::Absent);

        let s = session("jane@example.com");
        stub.emit(AuthEvent::SignedIn(s.clone()));
        assert_eq!(next_state(&mut rx).await, SessionState::Present(s));

        stub.emit(AuthEvent::SignedOut);
        assert_eq!(next_state(&mut rx).await, SessionState::Absent);
    }

    #[tokio::test]
    async fn snapshot_events_do_not_disturb_resolved_state() {
        let stub = StubAuth::new(None, false);
        let store = SessionStore::start(stub.clone(), Duration::from_secs(5));
        let mut rx = store.subscribe();
        assert_eq!(next_state(&mut rx).await, SessionState::Absent);

        stub.emit(AuthEvent::InitialSession(Some(session("x@example.com"))));
        stub.emit(AuthEvent::SignedOut);
        assert_eq!(next_state(&mut rx).await, SessionState::Absent);
        assert_eq!(store.state(), SessionState::Absent);
    }

    #[tokio::test]
    async fn late_subscriber_sees_no_pending_change_for_the_resolved_state() {
        let stub = StubAuth::new(None, false);
        let store = SessionStore::start(stub.clone(), Duration::from_secs(5));
        let mut rx = store.subscribe();
        assert_eq!(next_state(&mut rx).await, SessionState::Absent);

        // A subscription taken after the resolution starts from the
        // current state; only subsequent transitions wake it.
        let mut late = store.subscribe();
        assert!(!late.has_changed().unwrap());
        assert_eq!(*late.borrow(), SessionState::Absent);

        let s = session("jane@example.com");
        stub.emit(AuthEvent::SignedIn(s.clone()));
        assert_eq!(next_state(&mut late).await, SessionState::Present(s));
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_auth_service_falls_back_to_unavailable() {
        let store = SessionStore::start(StubAuth::new(None, true), Duration::from_secs(15));
        let mut rx = store.subscribe();
        assert_eq!(next_state(&mut rx).await, SessionState::Unavailable);
    }
}
