//! Resource gateway client.
//!
//! The gateway fronts four read/write collections (transactions, budgets,
//! reports, profile) plus the dashboard summary. Responses arrive wrapped in
//! a `{statusCode, body}` envelope where `body` is sometimes an object and
//! sometimes a JSON-encoded string; [`decode_envelope`] normalizes both.
//!
//! Requests authenticate by sending the opaque user id as the Authorization
//! header. A client without a user id fails fast with `Unauthenticated`
//! before any I/O. Requests are never retried; failures surface to the
//! caller, who decides whether to re-fetch.

use finq_types::{ApiError, DashboardSummary, ProfilePreferences};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;

/// Collections exposed by the resource gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Transactions,
    Budgets,
    Reports,
    Dashboard,
    Profile,
}

impl Collection {
    /// URL path segment for this collection.
    pub fn path(&self) -> &'static str {
        match self {
            Collection::Transactions => "transactions",
            Collection::Budgets => "budgets",
            Collection::Reports => "reports",
            Collection::Dashboard => "dashboard",
            Collection::Profile => "profile",
        }
    }

    /// Parses a collection name as typed on the command line.
    pub fn from_name(name: &str) -> Option<Collection> {
        match name {
            "transactions" => Some(Collection::Transactions),
            "budgets" => Some(Collection::Budgets),
            "reports" => Some(Collection::Reports),
            "dashboard" => Some(Collection::Dashboard),
            "profile" => Some(Collection::Profile),
            _ => None,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Decodes a gateway response body.
///
/// Handles three shapes: a `{statusCode, body}` envelope with an object
/// body, the same envelope with a string-encoded JSON body, and a bare
/// payload with no envelope at all. An envelope carrying a non-2xx status
/// becomes `RequestFailed` even when the HTTP transport said 200.
pub fn decode_envelope<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ApiError::decode(format!("invalid JSON: {e}")))?;

    let payload = match value.get("statusCode").and_then(serde_json::Value::as_u64) {
        Some(status) => {
            let body = value.get("body").cloned().unwrap_or(serde_json::Value::Null);
            let body = match body {
                serde_json::Value::String(raw) => serde_json::from_str(&raw)
                    .map_err(|e| ApiError::decode(format!("invalid envelope body: {e}")))?,
                other => other,
            };
            let status = u16::try_from(status)
                .map_err(|_| ApiError::decode("envelope status out of range"))?;
            if !(200..300).contains(&status) {
                return Err(ApiError::request_failed(status, &body.to_string()));
            }
            body
        }
        None => value,
    };

    serde_json::from_value(payload).map_err(|e| ApiError::decode(format!("unexpected shape: {e}")))
}

/// Client for the resource gateway.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    http: reqwest::Client,
    base_url: String,
    user_id: Option<String>,
}

impl ResourceClient {
    /// Creates a client with no user bound; every request fails fast with
    /// `Unauthenticated` until [`set_user`](Self::set_user) is called.
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_id: None,
        }
    }

    /// Binds the signed-in user's id; it is sent as the Authorization header.
    pub fn set_user(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Lists a collection. An empty collection is an empty vec, not an error.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, ApiError> {
        self.send(reqwest::Method::GET, &self.collection_url(collection), None::<&()>)
            .await
    }

    /// Fetches a single item by id.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<T, ApiError> {
        self.send(reqwest::Method::GET, &self.item_url(collection, id), None::<&()>)
            .await
    }

    /// Creates an item. Returns the stored record, which carries the
    /// server-assigned id.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn create<T: Serialize + Sync, R: DeserializeOwned>(
        &self,
        collection: Collection,
        item: &T,
    ) -> Result<R, ApiError> {
        self.send(reqwest::Method::POST, &self.collection_url(collection), Some(item))
            .await
    }

    /// Replaces an item by id.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn update<T: Serialize + Sync, R: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
        item: &T,
    ) -> Result<R, ApiError> {
        self.send(reqwest::Method::PUT, &self.item_url(collection, id), Some(item))
            .await
    }

    /// Deletes an item by id.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn remove(&self, collection: Collection, id: &str) -> Result<(), ApiError> {
        self.send_raw(reqwest::Method::DELETE, &self.item_url(collection, id), None::<&()>)
            .await?;
        Ok(())
    }

    /// Fetches the dashboard summary.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        self.send(
            reqwest::Method::GET,
            &self.collection_url(Collection::Dashboard),
            None::<&()>,
        )
        .await
    }

    /// Fetches the signed-in user's profile preferences.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn fetch_profile(&self) -> Result<ProfilePreferences, ApiError> {
        self.send(
            reqwest::Method::GET,
            &self.collection_url(Collection::Profile),
            None::<&()>,
        )
        .await
    }

    /// Replaces the signed-in user's profile preferences.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub async fn update_profile(
        &self,
        profile: &ProfilePreferences,
    ) -> Result<ProfilePreferences, ApiError> {
        self.send(
            reqwest::Method::PUT,
            &self.collection_url(Collection::Profile),
            Some(profile),
        )
        .await
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.base_url, collection.path())
    }

    fn item_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/{}/{id}", self.base_url, collection.path())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, ApiError> {
        let text = self.send_raw(method, url, body).await?;
        decode_envelope(&text)
    }

    async fn send_raw(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<String, ApiError> {
        // Fail fast: no user id means the request is never sent.
        let Some(user_id) = &self.user_id else {
            return Err(ApiError::Unauthenticated);
        };

        let mut request = self
            .http
            .request(method, url)
            .header("Authorization", user_id);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::request_failed(status.as_u16(), &text));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use finq_types::Transaction;

    use super::*;

    /// Test: an envelope with an object body decodes straight through.
    #[test]
    fn test_envelope_object_body() {
        let text = r#"{"statusCode": 200, "body": [{"name": "Rent", "amount": 1200.0, "date": "2024-03-01", "type": "expense"}]}"#;
        let items: Vec<Transaction> = decode_envelope(text).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Rent");
    }

    /// Test: a string-encoded body is parsed a second time before decoding.
    #[test]
    fn test_envelope_string_body() {
        let text = r#"{"statusCode": 200, "body": "[{\"name\": \"Rent\", \"amount\": 1200.0, \"date\": \"2024-03-01\", \"type\": \"expense\"}]"}"#;
        let items: Vec<Transaction> = decode_envelope(text).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount, 1200.0);
    }

    /// Test: a bare payload with no envelope decodes as-is.
    #[test]
    fn test_bare_payload() {
        let items: Vec<Transaction> = decode_envelope("[]").unwrap();
        assert!(items.is_empty());
    }

    /// Test: an envelope carrying a non-2xx status is a RequestFailed even
    /// when the transport said 200.
    #[test]
    fn test_envelope_error_status() {
        let text = r#"{"statusCode": 500, "body": "{\"message\": \"db unavailable\"}"}"#;
        let err = decode_envelope::<Vec<Transaction>>(text).unwrap_err();
        assert_eq!(
            err,
            ApiError::RequestFailed {
                status: 500,
                message: Some("db unavailable".to_string()),
            }
        );
    }

    /// Test: a corrupt string-encoded body is a Decode error.
    #[test]
    fn test_envelope_corrupt_string_body() {
        let text = r#"{"statusCode": 200, "body": "{not json"}"#;
        let err = decode_envelope::<Vec<Transaction>>(text).unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    /// Test: with no user bound, requests fail fast without any I/O. The
    /// base URL is unroutable, so reaching the network would error
    /// differently.
    #[tokio::test]
    async fn test_unauthenticated_fail_fast() {
        let client = ResourceClient::new(&ApiConfig {
            base_url: "http://invalid.invalid".to_string(),
        });
        let err = client.list::<Transaction>(Collection::Transactions).await.unwrap_err();
        assert_eq!(err, ApiError::Unauthenticated);
    }

    /// Test: collection names round-trip through their CLI spelling.
    #[test]
    fn test_collection_names() {
        for c in [
            Collection::Transactions,
            Collection::Budgets,
            Collection::Reports,
            Collection::Dashboard,
            Collection::Profile,
        ] {
            assert_eq!(Collection::from_name(c.path()), Some(c));
        }
        assert_eq!(Collection::from_name("nope"), None);
    }
}
