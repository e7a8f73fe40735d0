//! CLI command handlers.

pub mod auth;
pub mod collections;
pub mod config;
