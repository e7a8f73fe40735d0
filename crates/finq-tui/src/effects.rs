//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only; the reducer never performs
//! I/O itself. Each data-fetch effect carries the [`RequestId`] that its
//! eventual result event will be tagged with.

use finq_types::{Budget, ProfilePreferences, Report, Transaction};

use crate::events::RequestId;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Resolve the current session from cached tokens.
    CheckSession,

    /// Sign in with username and password.
    SignIn { username: String, password: String },

    /// Register a new account.
    SignUp { email: String, password: String },

    /// Confirm a pending sign-up with the emailed code.
    ConfirmSignUp { email: String, code: String },

    /// Sign out: revoke remotely best-effort, clear local state.
    SignOut,

    /// Open a URL in the system browser.
    OpenBrowser { url: String },

    /// Exchange a pasted federated callback code for tokens.
    ExchangeFederatedCode { code: String, verifier: String },

    LoadDashboard { req: RequestId },
    LoadTransactions { req: RequestId },
    LoadBudgets { req: RequestId },
    LoadReports { req: RequestId },
    LoadProfile { req: RequestId },

    CreateTransaction {
        req: RequestId,
        transaction: Transaction,
    },
    UpdateTransaction {
        req: RequestId,
        id: String,
        transaction: Transaction,
    },
    DeleteTransaction { req: RequestId, id: String },

    /// Create or replace a budget, keyed by category.
    SaveBudget {
        req: RequestId,
        budget: Budget,
        existing: bool,
    },
    DeleteBudget { req: RequestId, category: String },

    /// Request server-side generation of a new report.
    GenerateReport { req: RequestId, report: Report },

    SaveProfile {
        req: RequestId,
        profile: ProfilePreferences,
    },
}
