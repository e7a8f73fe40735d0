//! Core client logic for finq: configuration, session and credential
//! storage, the identity gateway client, the resource API client, and the
//! auth-gated router.

pub mod api;
pub mod config;
pub mod events;
pub mod identity;
pub mod router;
pub mod session;
