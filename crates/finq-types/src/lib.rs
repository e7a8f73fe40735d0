//! Shared domain types for finq.
//!
//! Entities mirror the remote service's JSON shapes; the error enums are the
//! closed taxonomies every layer above the gateway clients branches on.

pub mod entities;
pub mod errors;
pub mod money;

pub use entities::{
    Budget, DashboardSummary, PendingVerification, ProfilePreferences, Report, Transaction,
    TransactionKind,
};
pub use errors::{ApiError, AuthError};
pub use money::format_amount;
