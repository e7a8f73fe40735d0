//! UI event types.
//!
//! Runtime handlers send these into the inbox; the reducer is the only
//! consumer. Data-bearing results carry a [`RequestId`] so the reducer can
//! drop stale responses after the user has navigated on.

use finq_core::api::Collection;
use finq_core::session::Session;
use finq_types::{
    ApiError, AuthError, Budget, DashboardSummary, PendingVerification, ProfilePreferences,
    Report, Transaction,
};

/// Monotonic id tagging one async request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(u64);

/// Request id generator. One per app; ids never repeat.
#[derive(Debug, Default)]
pub struct RequestSeq(u64);

impl RequestSeq {
    pub fn next(&mut self) -> RequestId {
        self.0 += 1;
        RequestId(self.0)
    }
}

/// Events processed by the reducer.
#[derive(Debug)]
pub enum UiEvent {
    /// Periodic tick (spinner animation, timers).
    Tick,
    /// Raw terminal input.
    Terminal(crossterm::event::Event),

    /// Result of the startup session check.
    SessionChecked {
        result: Result<Session, AuthError>,
    },
    /// Result of a username/password sign-in.
    SignInFinished {
        result: Result<Session, AuthError>,
    },
    /// Result of the federated code exchange.
    FederatedFinished {
        result: Result<Session, AuthError>,
    },
    /// Result of a sign-up request.
    SignUpFinished {
        result: Result<PendingVerification, AuthError>,
    },
    /// Result of a sign-up confirmation.
    ConfirmFinished {
        result: Result<(), AuthError>,
    },
    /// Sign-out completed (always succeeds locally).
    SignedOut,

    DashboardLoaded {
        req: RequestId,
        result: Result<DashboardSummary, ApiError>,
    },
    TransactionsLoaded {
        req: RequestId,
        result: Result<Vec<Transaction>, ApiError>,
    },
    BudgetsLoaded {
        req: RequestId,
        result: Result<Vec<Budget>, ApiError>,
    },
    ReportsLoaded {
        req: RequestId,
        result: Result<Vec<Report>, ApiError>,
    },
    ProfileLoaded {
        req: RequestId,
        result: Result<ProfilePreferences, ApiError>,
    },

    /// A create/update/delete finished; on success the reducer re-fetches
    /// the collection.
    WriteFinished {
        req: RequestId,
        collection: Collection,
        result: Result<(), ApiError>,
    },
}
