//! `finq list` against a mocked resource gateway.

mod fixtures;

use predicates::prelude::*;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fixtures::{envelope, finq_cmd, seed_credentials};

#[tokio::test]
async fn test_list_transactions_sends_user_id_and_prints_json() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    seed_credentials(dir.path(), "user-123");

    let transactions = serde_json::json!([
        { "id": "t-1", "name": "Groceries", "amount": 54.20, "date": "2026-03-01", "type": "expense" },
        { "id": "t-2", "name": "Salary", "amount": 3200.0, "date": "2026-03-01", "type": "income" },
    ]);
    Mock::given(method("GET"))
        .and(path("/dev/transactions"))
        .and(header("Authorization", "user-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(200, &transactions)))
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/dev", server.uri());
    finq_cmd(dir.path(), "http://localhost:1", &api_url)
        .args(["list", "transactions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Groceries"))
        .stdout(predicate::str::contains("Salary"));
}

#[tokio::test]
async fn test_list_handles_bare_payload_without_envelope() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    seed_credentials(dir.path(), "user-123");

    let budgets = serde_json::json!([
        { "category": "Food", "limit": 400.0, "spent": 210.5 },
    ]);
    Mock::given(method("GET"))
        .and(path("/dev/budgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(budgets))
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/dev", server.uri());
    finq_cmd(dir.path(), "http://localhost:1", &api_url)
        .args(["list", "budgets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Food"));
}

#[tokio::test]
async fn test_list_empty_collection_prints_empty_array() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    seed_credentials(dir.path(), "user-123");

    Mock::given(method("GET"))
        .and(path("/dev/reports"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(200, &serde_json::json!([]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/dev", server.uri());
    finq_cmd(dir.path(), "http://localhost:1", &api_url)
        .args(["list", "reports"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[tokio::test]
async fn test_list_unauthenticated_fails_before_any_request() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();

    // No cached credentials: the gateway must never be contacted
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api_url = format!("{}/dev", server.uri());
    finq_cmd(dir.path(), "http://localhost:1", &api_url)
        .args(["list", "transactions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[tokio::test]
async fn test_list_surfaces_envelope_error_status() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    seed_credentials(dir.path(), "user-123");

    // HTTP 200 carrying an envelope with a failure status
    let body = envelope(502, &serde_json::json!({ "message": "upstream unavailable" }));
    Mock::given(method("GET"))
        .and(path("/dev/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let api_url = format!("{}/dev", server.uri());
    finq_cmd(dir.path(), "http://localhost:1", &api_url)
        .args(["list", "transactions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("502"));
}

#[test]
fn test_list_unknown_collection_names_valid_ones() {
    let dir = tempdir().unwrap();
    seed_credentials(dir.path(), "user-123");

    finq_cmd(dir.path(), "http://localhost:1", "http://localhost:1/dev")
        .args(["list", "stocks"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("transactions, budgets, reports"));
}
