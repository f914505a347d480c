//! End-to-end HTTP tests against the real router with an in-memory database.

use axum_test::TestServer;
use chrono::Duration;
use serde_json::{json, Value};

use fluently::api::create_router;
use fluently::auth;
use fluently::config::Settings;
use fluently::db::Database;

const SECRET: &str = "test-secret";

fn test_settings() -> Settings {
    Settings {
        secret_key: SECRET.into(),
        ..Settings::default()
    }
}

fn server() -> TestServer {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    TestServer::new(create_router(db, test_settings())).unwrap()
}

async fn register(server: &TestServer, name: &str, email: &str, password: &str) -> Value {
    let response = server
        .post("/signup")
        .json(&json!({ "name": name, "email": email, "password": password }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 30 * 60);
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn signup_rejects_duplicate_email_but_not_duplicate_name() {
    let server = server();
    register(&server, "Test Parent", "test@example.com", "SecurePass123").await;

    let dup = server
        .post("/signup")
        .json(&json!({
            "name": "Someone Else",
            "email": "test@example.com",
            "password": "SecurePass123"
        }))
        .await;
    dup.assert_status_bad_request();
    assert_eq!(dup.json::<Value>()["detail"], "Email already registered");

    // Same display name under a different email is fine.
    register(&server, "Test Parent", "other@example.com", "SecurePass123").await;
}

#[tokio::test]
async fn signup_enforces_password_policy() {
    let server = server();
    for bad in ["Sh0rt", "alllowercase1", "ALLUPPERCASE1", "NoDigitsHere"] {
        let response = server
            .post("/signup")
            .json(&json!({ "name": "Parent", "email": "p@example.com", "password": bad }))
            .await;
        response.assert_status_bad_request();
    }
    register(&server, "Parent", "p@example.com", "SecurePass123").await;
}

#[tokio::test]
async fn signup_validates_name_and_email() {
    let server = server();
    let response = server
        .post("/signup")
        .json(&json!({ "name": " a ", "email": "p@example.com", "password": "SecurePass123" }))
        .await;
    response.assert_status_bad_request();

    let response = server
        .post("/signup")
        .json(&json!({ "name": "Parent", "email": "not-an-email", "password": "SecurePass123" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let server = server();
    register(&server, "Parent", "parent@example.com", "SecurePass123").await;

    let wrong_password = server
        .post("/login")
        .json(&json!({ "email": "parent@example.com", "password": "WrongPass123" }))
        .await;
    let unknown_email = server
        .post("/login")
        .json(&json!({ "email": "nobody@example.com", "password": "SecurePass123" }))
        .await;

    wrong_password.assert_status_unauthorized();
    unknown_email.assert_status_unauthorized();
    assert_eq!(
        wrong_password.json::<Value>(),
        unknown_email.json::<Value>()
    );
}

#[tokio::test]
async fn me_returns_the_logged_in_account() {
    let server = server();
    let signup = register(&server, "Test Parent", "test@example.com", "SecurePass123").await;
    let token = login(&server, "test@example.com", "SecurePass123").await;

    let response = server.get("/me").authorization_bearer(&token).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["id"], signup["user_id"]);
    assert_eq!(body["name"], "Test Parent");
    assert_eq!(body["email"], "test@example.com");
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn protected_endpoints_reject_bad_tokens() {
    let server = server();
    register(&server, "Parent", "parent@example.com", "SecurePass123").await;

    let expired = auth::create_access_token("parent@example.com", SECRET, Duration::minutes(-1));
    let wrong_key = auth::create_access_token("parent@example.com", "other-secret", Duration::minutes(30));

    for token in [expired.as_str(), wrong_key.as_str(), "garbage"] {
        server
            .get("/me")
            .authorization_bearer(token)
            .await
            .assert_status_unauthorized();
        server
            .get("/kids/")
            .authorization_bearer(token)
            .await
            .assert_status_unauthorized();
    }

    // Missing header entirely.
    server.get("/me").await.assert_status_unauthorized();
    server.get("/kids/").await.assert_status_unauthorized();
}

#[tokio::test]
async fn me_is_404_when_the_subject_no_longer_exists() {
    let server = server();
    // Valid signature, but nobody ever registered this address.
    let token = auth::create_access_token("ghost@example.com", SECRET, Duration::minutes(30));
    server
        .get("/me")
        .authorization_bearer(&token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn logout_is_a_stateless_ok() {
    let server = server();
    let response = server.post("/logout").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["message"], "Successfully logged out");
}

#[tokio::test]
async fn kid_names_are_unique_per_parent_only() {
    let server = server();
    register(&server, "Parent One", "one@example.com", "SecurePass123").await;
    register(&server, "Parent Two", "two@example.com", "SecurePass123").await;
    let token_one = login(&server, "one@example.com", "SecurePass123").await;
    let token_two = login(&server, "two@example.com", "SecurePass123").await;

    let kid = json!({ "name": "Zaid", "age_group": "5-8", "gender": "M" });

    server
        .post("/kids/signup")
        .authorization_bearer(&token_one)
        .json(&kid)
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    server
        .post("/kids/signup")
        .authorization_bearer(&token_one)
        .json(&kid)
        .await
        .assert_status_bad_request();

    // Same name under the other parent succeeds.
    server
        .post("/kids/signup")
        .authorization_bearer(&token_two)
        .json(&kid)
        .await
        .assert_status(axum::http::StatusCode::CREATED);
}

#[tokio::test]
async fn kids_listing_is_empty_not_an_error() {
    let server = server();
    register(&server, "Parent", "parent@example.com", "SecurePass123").await;
    let token = login(&server, "parent@example.com", "SecurePass123").await;

    let response = server.get("/kids/").authorization_bearer(&token).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn kid_signup_rejects_invalid_enum_values() {
    let server = server();
    register(&server, "Parent", "parent@example.com", "SecurePass123").await;
    let token = login(&server, "parent@example.com", "SecurePass123").await;

    let response = server
        .post("/kids/signup")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Zaid", "age_group": "13-15", "gender": "M" }))
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn full_registration_scenario() {
    let server = server();

    let signup = register(&server, "Test Parent", "test@example.com", "SecurePass123").await;
    assert_eq!(signup["message"], "User registered successfully");
    let user_id = signup["user_id"].as_str().unwrap().to_string();

    let token = login(&server, "test@example.com", "SecurePass123").await;

    let response = server
        .post("/kids/signup")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Zaid", "age_group": "5-8", "gender": "M" }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let kid = response.json::<Value>();
    assert_eq!(kid["name"], "Zaid");
    assert_eq!(kid["age_group"], "5-8");
    assert_eq!(kid["gender"], "M");
    assert_eq!(kid["parent_id"], Value::String(user_id));

    let listing = server.get("/kids/").authorization_bearer(&token).await;
    listing.assert_status_ok();
    let kids = listing.json::<Value>();
    assert_eq!(kids.as_array().unwrap().len(), 1);
    assert_eq!(kids[0]["id"], kid["id"]);
}
