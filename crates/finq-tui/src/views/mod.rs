//! Per-screen state, key handling, and rendering.
//!
//! Each view owns its state struct and a `handle_key` that mutates it and
//! returns an [`Outcome`]. Views never touch each other's state; cross-view
//! moves go through `Outcome::navigate`.

pub mod budgeting;
pub mod dashboard;
pub mod expenses;
pub mod login;
pub mod profile;
pub mod reports;
pub mod signup;

use finq_core::router::Route;

use crate::effects::UiEffect;

/// What a view's key handler wants the app to do.
#[derive(Debug, Default)]
pub struct Outcome {
    pub effects: Vec<UiEffect>,
    pub navigate: Option<Route>,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn effect(effect: UiEffect) -> Self {
        Self {
            effects: vec![effect],
            navigate: None,
        }
    }

    pub fn navigate(route: Route) -> Self {
        Self {
            effects: Vec::new(),
            navigate: Some(route),
        }
    }
}
