//! Auth-gated routing state machine.
//!
//! The router owns the single `Session` value. It moves between three
//! stages — `Unknown` (session not yet checked), `Unauthenticated`, and
//! `Authenticated` — in response to identity events, and decides per
//! navigation request whether a route renders, redirects, or waits.
//!
//! Stage changes are published on a `tokio::sync::watch` channel so readers
//! observe them instead of polling; no component other than the router
//! mutates the session.

use finq_types::AuthError;
use tokio::sync::watch;

use crate::events::AuthEvent;
use crate::session::{Session, SessionStore};

// ============================================================================
// Routes
// ============================================================================

/// Navigable screens, one per original URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Expenses,
    Budgeting,
    Reports,
    Profile,
}

impl Route {
    /// All routes, sidebar order.
    pub fn all() -> &'static [Route] {
        &[
            Route::Dashboard,
            Route::Expenses,
            Route::Budgeting,
            Route::Reports,
            Route::Profile,
            Route::Login,
            Route::Signup,
        ]
    }

    /// Parses a URL path into a route.
    pub fn from_path(path: &str) -> Option<Route> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Dashboard),
            "/login" => Some(Route::Login),
            "/signup" => Some(Route::Signup),
            "/expenses" => Some(Route::Expenses),
            "/budgeting" => Some(Route::Budgeting),
            "/reports" => Some(Route::Reports),
            "/profile" => Some(Route::Profile),
            _ => None,
        }
    }

    /// Returns the URL path for this route.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Expenses => "/expenses",
            Route::Budgeting => "/budgeting",
            Route::Reports => "/reports",
            Route::Profile => "/profile",
        }
    }

    /// Returns the human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Login => "Login",
            Route::Signup => "Sign Up",
            Route::Expenses => "Expenses",
            Route::Budgeting => "Budgeting",
            Route::Reports => "Reports",
            Route::Profile => "Profile",
        }
    }

    /// True for the public auth screens (login, signup).
    pub fn is_public_auth(&self) -> bool {
        matches!(self, Route::Login | Route::Signup)
    }

    /// The default landing route for an authenticated user.
    pub fn landing() -> Route {
        Route::Dashboard
    }
}

// ============================================================================
// Stages and decisions
// ============================================================================

/// Authentication stage of the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    /// Session not yet checked; nothing protected may render.
    Unknown,
    Unauthenticated,
    Authenticated,
}

/// Outcome of routing a requested path against the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Mount the view for this route.
    Render(Route),
    /// Navigate to this route instead. The originally requested path is not
    /// preserved across the redirect.
    Redirect(Route),
    /// Session check still in flight; show neutral loading content.
    Pending,
}

/// Routing contract: given stage S and requested route P, decide.
pub fn resolve(stage: AuthStage, requested: Route) -> RouteDecision {
    match stage {
        AuthStage::Unknown => RouteDecision::Pending,
        AuthStage::Authenticated => {
            if requested.is_public_auth() {
                RouteDecision::Redirect(Route::landing())
            } else {
                RouteDecision::Render(requested)
            }
        }
        AuthStage::Unauthenticated => {
            if requested.is_public_auth() {
                RouteDecision::Render(requested)
            } else {
                RouteDecision::Redirect(Route::Login)
            }
        }
    }
}

// ============================================================================
// AuthRouter
// ============================================================================

/// Owner of the session value and the stage machine.
pub struct AuthRouter {
    session: Session,
    stage_tx: watch::Sender<AuthStage>,
    store: SessionStore,
}

impl AuthRouter {
    /// Creates a router in the `Unknown` stage and returns it with a stage
    /// subscription.
    pub fn new(store: SessionStore) -> (Self, watch::Receiver<AuthStage>) {
        let (stage_tx, stage_rx) = watch::channel(AuthStage::Unknown);
        (
            Self {
                session: Session::unauthenticated(),
                stage_tx,
                store,
            },
            stage_rx,
        )
    }

    /// Current stage.
    pub fn stage(&self) -> AuthStage {
        *self.stage_tx.borrow()
    }

    /// Current session value.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Subscribes to stage changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthStage> {
        self.stage_tx.subscribe()
    }

    /// True when the persisted hint says a user was logged in.
    ///
    /// Only a hint: the stage stays `Unknown` until the session check
    /// resolves, the hint just avoids flashing the login screen first.
    pub fn persisted_hint(&self) -> bool {
        self.store.load()
    }

    /// Routes a requested route against the current stage.
    pub fn resolve(&self, requested: Route) -> RouteDecision {
        resolve(self.stage(), requested)
    }

    /// Applies an identity event. The latest event is authoritative; there
    /// is no merging against an in-flight session check.
    pub fn apply_event(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn { user_id } => {
                self.set_authenticated(Session::signed_in(user_id));
            }
            AuthEvent::SignedOut => {
                // Idempotent: signing out while already unauthenticated
                // leaves the stage unchanged and never raises.
                self.set_unauthenticated();
            }
            AuthEvent::SessionChecked { result } => self.apply_session_check(result),
        }
    }

    /// Applies the result of a `fetch_session` call.
    ///
    /// Any failure — `NoSession` or otherwise — lands in `Unauthenticated`;
    /// the router never treats a failed check as a hard error.
    pub fn apply_session_check(&mut self, result: Result<Session, AuthError>) {
        match result {
            Ok(session) if session.authenticated => self.set_authenticated(session),
            Ok(_) => self.set_unauthenticated(),
            Err(AuthError::NoSession) => self.set_unauthenticated(),
            Err(e) => {
                tracing::warn!("Session check failed: {e}");
                self.set_unauthenticated();
            }
        }
    }

    fn set_authenticated(&mut self, session: Session) {
        self.session = session;
        self.store.save(true);
        self.stage_tx.send_replace(AuthStage::Authenticated);
    }

    fn set_unauthenticated(&mut self) {
        self.session = Session::unauthenticated();
        self.store.clear();
        self.stage_tx.send_replace(AuthStage::Unauthenticated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> (AuthRouter, watch::Receiver<AuthStage>) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        // Keep the tempdir alive for the test duration by leaking it; each
        // test process cleans up via the OS tempdir.
        std::mem::forget(dir);
        AuthRouter::new(store)
    }

    /// Test: public-auth routes redirect to the landing path when
    /// authenticated, never render.
    #[test]
    fn test_public_auth_redirects_when_authenticated() {
        for route in [Route::Login, Route::Signup] {
            assert_eq!(
                resolve(AuthStage::Authenticated, route),
                RouteDecision::Redirect(Route::Dashboard)
            );
        }
    }

    /// Test: protected routes redirect to login when not authenticated.
    #[test]
    fn test_protected_redirects_when_unauthenticated() {
        for route in Route::all().iter().filter(|r| !r.is_public_auth()) {
            assert_eq!(
                resolve(AuthStage::Unauthenticated, *route),
                RouteDecision::Redirect(Route::Login)
            );
        }
    }

    /// Test: nothing renders while the stage is unknown.
    #[test]
    fn test_unknown_stage_is_pending() {
        for route in Route::all() {
            assert_eq!(resolve(AuthStage::Unknown, *route), RouteDecision::Pending);
        }
    }

    /// Test: authenticated users render protected routes, unauthenticated
    /// users render the auth forms.
    #[test]
    fn test_render_cases() {
        assert_eq!(
            resolve(AuthStage::Authenticated, Route::Expenses),
            RouteDecision::Render(Route::Expenses)
        );
        assert_eq!(
            resolve(AuthStage::Unauthenticated, Route::Login),
            RouteDecision::Render(Route::Login)
        );
        assert_eq!(
            resolve(AuthStage::Unauthenticated, Route::Signup),
            RouteDecision::Render(Route::Signup)
        );
    }

    /// Test: route/path round-trip.
    #[test]
    fn test_route_path_round_trip() {
        for route in Route::all() {
            assert_eq!(Route::from_path(route.path()), Some(*route));
        }
        assert_eq!(Route::from_path("/nope"), None);
    }

    /// Test: sign-in event moves Unknown/Unauthenticated to Authenticated
    /// and persists the flag.
    #[test]
    fn test_sign_in_transition() {
        let (mut router, rx) = router();
        assert_eq!(router.stage(), AuthStage::Unknown);

        router.apply_event(AuthEvent::SignedIn {
            user_id: "user-1".to_string(),
        });
        assert_eq!(router.stage(), AuthStage::Authenticated);
        assert_eq!(*rx.borrow(), AuthStage::Authenticated);
        assert_eq!(router.session().user_id.as_deref(), Some("user-1"));
        assert!(router.persisted_hint());
    }

    /// Test: session check failure lands in Unauthenticated for both
    /// NoSession and Unknown errors.
    #[test]
    fn test_session_check_failure() {
        let (mut router, _rx) = router();
        router.apply_session_check(Err(AuthError::NoSession));
        assert_eq!(router.stage(), AuthStage::Unauthenticated);

        let (mut router, _rx) = self::router();
        router.apply_session_check(Err(AuthError::unknown("connection refused")));
        assert_eq!(router.stage(), AuthStage::Unauthenticated);
    }

    /// Test: signing out when already unauthenticated stays unauthenticated
    /// and does not raise.
    #[test]
    fn test_sign_out_idempotent() {
        let (mut router, _rx) = router();
        router.apply_event(AuthEvent::SignedOut);
        assert_eq!(router.stage(), AuthStage::Unauthenticated);
        router.apply_event(AuthEvent::SignedOut);
        assert_eq!(router.stage(), AuthStage::Unauthenticated);
        assert!(!router.persisted_hint());
    }

    /// Test: an external sign-out event flips Authenticated back and clears
    /// the persisted flag.
    #[test]
    fn test_event_driven_sign_out() {
        let (mut router, rx) = router();
        router.apply_event(AuthEvent::SignedIn {
            user_id: "user-1".to_string(),
        });
        assert!(router.persisted_hint());

        router.apply_event(AuthEvent::SignedOut);
        assert_eq!(*rx.borrow(), AuthStage::Unauthenticated);
        assert_eq!(router.session().user_id, None);
        assert!(!router.persisted_hint());
    }

    /// Test: successful session check via the event channel authenticates.
    #[test]
    fn test_session_checked_event() {
        let (mut router, _rx) = router();
        router.apply_event(AuthEvent::SessionChecked {
            result: Ok(Session::signed_in("user-9")),
        });
        assert_eq!(router.stage(), AuthStage::Authenticated);
        assert_eq!(router.resolve(Route::Login), RouteDecision::Redirect(Route::Dashboard));
    }
}
