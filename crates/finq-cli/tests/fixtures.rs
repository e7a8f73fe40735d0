//! Shared helpers for CLI integration tests.

#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Builds an unsigned JWT whose payload carries the given `sub` claim.
pub fn fake_jwt(sub: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{sub}"}}"#));
    format!("{header}.{payload}.signature")
}

/// A `finq` command with an isolated home and a complete configuration
/// pointing both gateways at the given URLs.
pub fn finq_cmd(home: &Path, identity_url: &str, api_url: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("finq");
    cmd.env("FINQ_HOME", home)
        .env("FINQ_IDENTITY_REGION", "ap-south-1")
        .env("FINQ_USER_POOL_ID", "ap-south-1_Test1234")
        .env("FINQ_CLIENT_ID", "client-abc")
        .env("FINQ_OAUTH_DOMAIN", "finq.auth.ap-south-1.amazoncognito.com")
        .env("FINQ_REDIRECT_SIGN_IN", "http://localhost:3000/")
        .env("FINQ_REDIRECT_SIGN_OUT", "http://localhost:3000/login")
        .env("FINQ_IDENTITY_BASE_URL", identity_url)
        .env("FINQ_API_BASE_URL", api_url)
        .env("FINQ_NO_BROWSER", "1");
    cmd
}

/// Seeds an unexpired credential cache for `sub` under `home`.
pub fn seed_credentials(home: &Path, sub: &str) {
    let contents = serde_json::json!({
        "access_token": fake_jwt(sub),
        "refresh_token": "refresh-token",
        "expires": u64::MAX / 2,
        "user_id": sub,
    });
    std::fs::create_dir_all(home).unwrap();
    std::fs::write(
        home.join("credentials.json"),
        serde_json::to_string_pretty(&contents).unwrap(),
    )
    .unwrap();
}

/// Wraps a payload in the gateway envelope with a string-encoded body.
pub fn envelope(status: u16, body: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "statusCode": status,
        "body": body.to_string(),
    })
}
