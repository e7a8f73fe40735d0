//! Identity gateway client.
//!
//! Talks to a Cognito-style user pool over its JSON-RPC wire protocol
//! (`X-Amz-Target` dispatch, `application/x-amz-json-1.1`). Every provider
//! failure is mapped into the closed [`AuthError`] taxonomy at this boundary;
//! nothing above this module sees raw provider error codes.
//!
//! The hosted-UI federated flow (browser redirect + PKCE) lives in
//! [`hosted_ui`].

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use finq_types::{AuthError, PendingVerification};
use serde_json::json;

use crate::config::IdentityConfig;
use crate::session::{CredentialCache, Credentials, Session};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// Extracts the `sub` claim from a JWT access token without verifying the
/// signature. The token was just issued over TLS by the provider; the claim
/// is only used as an opaque user identifier.
pub fn decode_user_id(token: &str) -> Option<String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let decoded = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
    let json: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    json.get("sub")
        .and_then(|v| v.as_str())
        .map(std::string::ToString::to_string)
}

/// Maps a provider error body (`{"__type": ..., "message": ...}`) into the
/// error taxonomy. Unrecognized codes collapse into `Unknown`.
fn map_provider_error(body: &str) -> AuthError {
    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return AuthError::unknown(body.trim()),
    };

    let code = parsed
        .get("__type")
        .and_then(|v| v.as_str())
        .map(|t| t.rsplit('#').next().unwrap_or(t))
        .unwrap_or_default();
    let message = parsed
        .get("message")
        .or_else(|| parsed.get("Message"))
        .and_then(|v| v.as_str())
        .unwrap_or(code);

    match code {
        "UserNotFoundException" => AuthError::UnknownUser,
        "NotAuthorizedException" => AuthError::InvalidCredentials,
        "UserDisabledException" | "DisabledException" => AuthError::AccountDisabled,
        "CodeMismatchException" | "ExpiredCodeException" => AuthError::InvalidCode,
        _ => AuthError::unknown(message),
    }
}

/// Client for the identity gateway.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    config: IdentityConfig,
    cache: CredentialCache,
}

impl IdentityClient {
    pub fn new(config: IdentityConfig) -> Self {
        Self::with_cache(config, CredentialCache::new())
    }

    /// Creates a client with an explicit credential cache (tests).
    pub fn with_cache(config: IdentityConfig, cache: CredentialCache) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            cache,
        }
    }

    /// Signs in with username and password.
    ///
    /// On success the provider tokens are cached and the returned session
    /// carries the user id decoded from the access token.
    ///
    /// # Errors
    /// Returns the mapped provider error, `Unknown` for transport failures.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .call(
                "InitiateAuth",
                json!({
                    "AuthFlow": "USER_PASSWORD_AUTH",
                    "ClientId": self.config.client_id,
                    "AuthParameters": {
                        "USERNAME": username,
                        "PASSWORD": password,
                    },
                }),
            )
            .await?;

        let creds = credentials_from_auth_result(&response, None)?;
        self.store_credentials(&creds);
        Ok(Session::signed_in(creds.user_id))
    }

    /// Registers a new user. The account stays unconfirmed until the emailed
    /// code is submitted via [`confirm_sign_up`](Self::confirm_sign_up).
    ///
    /// # Errors
    /// Returns the mapped provider error, `Unknown` for transport failures.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<PendingVerification, AuthError> {
        let response = self
            .call(
                "SignUp",
                json!({
                    "ClientId": self.config.client_id,
                    "Username": email,
                    "Password": password,
                    "UserAttributes": [
                        { "Name": "email", "Value": email },
                    ],
                }),
            )
            .await?;

        let user_id = response
            .get("UserSub")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AuthError::unknown("Sign-up response missing user id"))?
            .to_string();
        let delivery = response
            .get("CodeDeliveryDetails")
            .and_then(|d| d.get("Destination"))
            .and_then(|v| v.as_str())
            .map(std::string::ToString::to_string);

        Ok(PendingVerification { user_id, delivery })
    }

    /// Confirms a pending sign-up with the code delivered to the user.
    ///
    /// # Errors
    /// Returns `InvalidCode` for a wrong or expired code.
    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), AuthError> {
        self.call(
            "ConfirmSignUp",
            json!({
                "ClientId": self.config.client_id,
                "Username": email,
                "ConfirmationCode": code,
            }),
        )
        .await?;
        Ok(())
    }

    /// Signs out. Revocation at the provider is best-effort; the local token
    /// cache is always cleared, so this never fails and calling it without a
    /// session is a no-op. Returns whether cached credentials existed.
    pub async fn sign_out(&self) -> bool {
        let creds = self.cached_credentials();

        if let Some(creds) = &creds
            && !creds.is_expired()
        {
            let result = self
                .call(
                    "GlobalSignOut",
                    json!({ "AccessToken": creds.access_token }),
                )
                .await;
            if let Err(e) = result {
                tracing::warn!("Provider sign-out failed, clearing local session anyway: {e}");
            }
        }

        match self.cache.clear() {
            Ok(had) => had || creds.is_some(),
            Err(e) => {
                tracing::warn!("Failed to clear credential cache: {e:#}");
                creds.is_some()
            }
        }
    }

    /// Resolves the current session from cached tokens, refreshing the
    /// access token when expired.
    ///
    /// # Errors
    /// Returns `NoSession` when no usable tokens exist.
    pub async fn fetch_session(&self) -> Result<Session, AuthError> {
        let Some(creds) = self.cached_credentials() else {
            return Err(AuthError::NoSession);
        };

        if !creds.is_expired() {
            return Ok(Session::signed_in(creds.user_id));
        }

        let Some(refresh_token) = creds.refresh_token.clone() else {
            self.discard_credentials();
            return Err(AuthError::NoSession);
        };

        match self.refresh(&refresh_token).await {
            Ok(fresh) => {
                self.store_credentials(&fresh);
                Ok(Session::signed_in(fresh.user_id))
            }
            Err(e) => {
                tracing::debug!("Token refresh failed: {e}");
                self.discard_credentials();
                Err(AuthError::NoSession)
            }
        }
    }

    /// Fetches the signed-in user's attributes as a name/value map.
    ///
    /// # Errors
    /// Returns `NoSession` when not signed in.
    pub async fn fetch_user_attributes(&self) -> Result<HashMap<String, String>, AuthError> {
        self.fetch_session().await?;
        let Some(creds) = self.cached_credentials() else {
            return Err(AuthError::NoSession);
        };

        let response = self
            .call("GetUser", json!({ "AccessToken": creds.access_token }))
            .await?;

        let mut attributes = HashMap::new();
        if let Some(list) = response.get("UserAttributes").and_then(|v| v.as_array()) {
            for entry in list {
                let name = entry.get("Name").and_then(|v| v.as_str());
                let value = entry.get("Value").and_then(|v| v.as_str());
                if let (Some(name), Some(value)) = (name, value) {
                    attributes.insert(name.to_string(), value.to_string());
                }
            }
        }
        Ok(attributes)
    }

    /// Returns cached credentials, swallowing cache read failures.
    pub fn cached_credentials(&self) -> Option<Credentials> {
        match self.cache.load() {
            Ok(creds) => creds,
            Err(e) => {
                tracing::warn!("Failed to read credential cache: {e:#}");
                None
            }
        }
    }

    /// Persists freshly exchanged hosted-UI tokens into this client's cache.
    pub fn adopt_credentials(&self, creds: &Credentials) {
        self.store_credentials(creds);
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, AuthError> {
        let response = self
            .call(
                "InitiateAuth",
                json!({
                    "AuthFlow": "REFRESH_TOKEN_AUTH",
                    "ClientId": self.config.client_id,
                    "AuthParameters": {
                        "REFRESH_TOKEN": refresh_token,
                    },
                }),
            )
            .await?;

        credentials_from_auth_result(&response, Some(refresh_token))
    }

    fn store_credentials(&self, creds: &Credentials) {
        if let Err(e) = self.cache.save(creds) {
            tracing::warn!("Failed to persist credentials: {e:#}");
        }
    }

    fn discard_credentials(&self) {
        if let Err(e) = self.cache.clear() {
            tracing::warn!("Failed to clear credential cache: {e:#}");
        }
    }

    async fn call(
        &self,
        operation: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, AuthError> {
        let response = self
            .http
            .post(self.config.endpoint())
            .header("Content-Type", "application/x-amz-json-1.1")
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::unknown(format!("Identity request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::unknown(format!("Failed to read identity response: {e}")))?;

        if !status.is_success() {
            return Err(map_provider_error(&text));
        }

        if text.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&text)
            .map_err(|e| AuthError::unknown(format!("Malformed identity response: {e}")))
    }
}

fn credentials_from_auth_result(
    response: &serde_json::Value,
    fallback_refresh: Option<&str>,
) -> Result<Credentials, AuthError> {
    let result = response
        .get("AuthenticationResult")
        .ok_or_else(|| AuthError::unknown("Auth response missing authentication result"))?;

    let access_token = result
        .get("AccessToken")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AuthError::unknown("Auth response missing access token"))?
        .to_string();
    let user_id = decode_user_id(&access_token)
        .ok_or_else(|| AuthError::unknown("Access token carries no user id"))?;
    let refresh_token = result
        .get("RefreshToken")
        .and_then(|v| v.as_str())
        .map(std::string::ToString::to_string)
        .or_else(|| fallback_refresh.map(std::string::ToString::to_string));
    let id_token = result
        .get("IdToken")
        .and_then(|v| v.as_str())
        .map(std::string::ToString::to_string);
    let expires_in = result
        .get("ExpiresIn")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(3600);

    Ok(Credentials {
        access_token,
        refresh_token,
        id_token,
        expires: Credentials::expires_at(expires_in),
        user_id,
    })
}

/// Hosted-UI federated sign-in (browser redirect + PKCE).
pub mod hosted_ui {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use finq_types::AuthError;
    use sha2::{Digest, Sha256};

    use crate::config::IdentityConfig;
    use crate::session::Credentials;

    /// OAuth scopes requested on the hosted UI.
    const SCOPES: &str = "phone email openid profile aws.cognito.signin.user.admin";

    /// PKCE code verifier and challenge.
    pub struct Pkce {
        pub verifier: String,
        pub challenge: String,
    }

    /// Generates a PKCE verifier (32 random bytes, base64url) and its S256
    /// challenge.
    pub fn generate_pkce() -> Pkce {
        let uuid1 = uuid::Uuid::new_v4();
        let uuid2 = uuid::Uuid::new_v4();
        let mut verifier_bytes = [0u8; 32];
        verifier_bytes[..16].copy_from_slice(uuid1.as_bytes());
        verifier_bytes[16..].copy_from_slice(uuid2.as_bytes());
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

        Pkce {
            verifier,
            challenge,
        }
    }

    /// Builds the hosted-UI authorization URL.
    pub fn build_auth_url(config: &IdentityConfig, pkce: &Pkce, state: &str) -> String {
        let params = [
            ("response_type", "code"),
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_sign_in.as_str()),
            ("scope", SCOPES),
            ("code_challenge", pkce.challenge.as_str()),
            ("code_challenge_method", "S256"),
            ("state", state),
        ];

        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();

        format!("{}/oauth2/authorize?{query}", config.hosted_ui_base())
    }

    /// Builds the hosted-UI logout URL.
    pub fn build_sign_out_url(config: &IdentityConfig) -> String {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &config.client_id)
            .append_pair("logout_uri", &config.redirect_sign_out)
            .finish();

        format!("{}/logout?{query}", config.hosted_ui_base())
    }

    /// Parses a pasted callback input into code + optional state. Accepts the
    /// full redirect URL, a raw query string, or just the code.
    pub fn parse_callback_input(input: &str) -> (Option<String>, Option<String>) {
        let value = input.trim();
        if value.is_empty() {
            return (None, None);
        }

        if let Ok(url) = url::Url::parse(value) {
            let code = url.query_pairs().find(|(k, _)| k == "code").map(|(_, v)| v);
            let state = url
                .query_pairs()
                .find(|(k, _)| k == "state")
                .map(|(_, v)| v);
            return (code.map(|v| v.to_string()), state.map(|v| v.to_string()));
        }

        if value.contains("code=") {
            let params = url::form_urlencoded::parse(value.as_bytes()).collect::<Vec<_>>();
            let code = params.iter().find(|(k, _)| k == "code").map(|(_, v)| v);
            let state = params.iter().find(|(k, _)| k == "state").map(|(_, v)| v);
            return (
                code.map(std::string::ToString::to_string),
                state.map(std::string::ToString::to_string),
            );
        }

        (Some(value.to_string()), None)
    }

    /// Exchanges an authorization code for tokens at the hosted-UI token
    /// endpoint.
    ///
    /// # Errors
    /// Returns `Unknown` for transport or provider failures.
    pub async fn exchange_code(
        config: &IdentityConfig,
        code: &str,
        verifier: &str,
    ) -> Result<Credentials, AuthError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "authorization_code")
            .append_pair("client_id", &config.client_id)
            .append_pair("code", code)
            .append_pair("code_verifier", verifier)
            .append_pair("redirect_uri", &config.redirect_sign_in)
            .finish();

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/oauth2/token", config.hosted_ui_base()))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| AuthError::unknown(format!("Token exchange request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::unknown(format!(
                "Token exchange failed (HTTP {status}): {body}"
            )));
        }

        let token_data: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::unknown(format!("Malformed token response: {e}")))?;

        let user_id = super::decode_user_id(&token_data.access_token)
            .ok_or_else(|| AuthError::unknown("Access token carries no user id"))?;

        Ok(Credentials {
            access_token: token_data.access_token,
            refresh_token: token_data.refresh_token,
            id_token: token_data.id_token,
            expires: Credentials::expires_at(token_data.expires_in),
            user_id,
        })
    }

    #[derive(Debug, serde::Deserialize)]
    struct TokenResponse {
        access_token: String,
        refresh_token: Option<String>,
        id_token: Option<String>,
        expires_in: u64,
    }
}
