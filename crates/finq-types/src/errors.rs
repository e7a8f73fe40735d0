//! Closed error taxonomies for the identity and resource gateways.
//!
//! Provider-specific codes and bodies are normalized at the client boundary;
//! everything above these enums branches on the variants only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized identity-provider error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthError {
    /// Credentials were rejected (wrong password).
    InvalidCredentials,
    /// The identifier is not a known user.
    UnknownUser,
    /// The account exists but has been disabled.
    AccountDisabled,
    /// A sign-up confirmation code was wrong or expired.
    InvalidCode,
    /// No valid session exists (absent, expired, or revoked).
    NoSession,
    /// Anything the taxonomy does not name, with a one-line summary.
    Unknown { message: String },
}

impl AuthError {
    pub fn unknown(message: impl Into<String>) -> Self {
        AuthError::Unknown {
            message: message.into(),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid credentials"),
            AuthError::UnknownUser => write!(f, "unknown user"),
            AuthError::AccountDisabled => write!(f, "account disabled"),
            AuthError::InvalidCode => write!(f, "invalid confirmation code"),
            AuthError::NoSession => write!(f, "no valid session"),
            AuthError::Unknown { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Normalized resource-gateway error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    /// No user identifier was available; the request was never sent.
    Unauthenticated,
    /// The gateway answered with a non-2xx status.
    RequestFailed {
        status: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// The request failed before any HTTP status existed.
    Network { message: String },
    /// The response arrived but its envelope or body did not decode.
    Decode { message: String },
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ApiError::Decode {
            message: message.into(),
        }
    }

    /// Creates a `RequestFailed`, extracting a server message from a JSON
    /// error body when one is present.
    pub fn request_failed(status: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            None
        } else if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(|v| v.as_str())
                .map(ToString::to_string)
                .or_else(|| Some(body.to_string()))
        } else {
            Some(body.to_string())
        };
        ApiError::RequestFailed { status, message }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthenticated => write!(f, "not authenticated"),
            ApiError::RequestFailed {
                status,
                message: Some(message),
            } => {
                write!(f, "request failed (HTTP {status}): {message}")
            }
            ApiError::RequestFailed {
                status,
                message: None,
            } => write!(f, "request failed (HTTP {status})"),
            ApiError::Network { message } => write!(f, "network error: {message}"),
            ApiError::Decode { message } => write!(f, "bad response: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}
