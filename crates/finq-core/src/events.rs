//! Identity events.
//!
//! Asynchronous auth outcomes (a completed sign-in, a sign-out, a session
//! check resolving) arrive outside the router's call stack; the runtime
//! commits each one to the router before any other handling, so the router
//! remains the single writer of the session.

use finq_types::AuthError;

use crate::session::Session;

/// An identity-provider event the router reacts to.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// A sign-in completed (interactive or federated).
    SignedIn { user_id: String },
    /// The user signed out, locally or remotely.
    SignedOut,
    /// The startup session check resolved.
    SessionChecked { result: Result<Session, AuthError> },
}
