mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use common::{bearer, request_json, seed_user, test_app, MockSender};

#[tokio::test]
async fn signup_rotation_and_logout_lifecycle() {
    let (app, _pool) = test_app(Arc::new(MockSender::default())).await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Ann", "email": "ann@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let first = body["refreshToken"].as_str().unwrap().to_string();
    assert!(body["accessToken"].as_str().is_some());
    // the opaque value is tokenId.secret
    assert!(first.contains('.'));
    // secrets never appear in the serialized user
    assert!(body["user"].get("password_hash").is_none());

    // validate-and-rotate hands out a fresh credential
    let (status, body) = request_json(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": first })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(second, first);

    // the rotated-away credential is dead
    let (status, _) = request_json(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": first })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // logout revokes the live one
    let (status, _) = request_json(
        &app,
        "POST",
        "/api/auth/logout",
        None,
        Some(json!({ "refreshToken": second })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request_json(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": second })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_rejects_bad_input() {
    let (app, _pool) = test_app(Arc::new(MockSender::default())).await;

    let (status, _) = request_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Ann", "email": "not-an-address", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Ann", "email": "ann@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // duplicate email
    let payload = json!({ "name": "Ann", "email": "ann@example.com", "password": "password123" });
    let (status, _) =
        request_json(&app, "POST", "/api/auth/signup", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request_json(&app, "POST", "/api/auth/signup", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unverified_login_is_forbidden_until_email_verified() {
    let (app, pool) = test_app(Arc::new(MockSender::default())).await;

    let (status, _) = request_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Ann", "email": "ann@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let login = json!({ "email": "ann@example.com", "password": "password123" });
    let (status, _) = request_json(&app, "POST", "/api/auth/login", None, Some(login.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // complete the verification with the stored token
    let token: String =
        sqlx::query_scalar("SELECT verification_token FROM users WHERE email = 'ann@example.com'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let (status, _) = request_json(
        &app,
        "GET",
        &format!("/api/auth/verify-email?token={token}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request_json(&app, "POST", "/api/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_verified"], json!(true));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let (app, pool) = test_app(Arc::new(MockSender::default())).await;
    seed_user(&pool, "u1", "ann@example.com", true, None).await;

    let (status, _) = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gated_routes_require_a_valid_bearer_token() {
    let (app, pool) = test_app(Arc::new(MockSender::default())).await;
    seed_user(&pool, "u1", "ann@example.com", true, None).await;

    let (status, _) = request_json(&app, "GET", "/api/user/getcurrentuser", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        request_json(&app, "GET", "/api/user/getcurrentuser", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = bearer("u1");
    let (status, body) =
        request_json(&app, "GET", "/api/user/getcurrentuser", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], json!("ann@example.com"));
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn unverified_account_cannot_read_profile() {
    let (app, pool) = test_app(Arc::new(MockSender::default())).await;
    seed_user(&pool, "u1", "ann@example.com", false, None).await;

    let token = bearer("u1");
    let (status, _) =
        request_json(&app, "GET", "/api/user/getcurrentuser", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_refresh_value_is_unauthorized() {
    let (app, _pool) = test_app(Arc::new(MockSender::default())).await;
    let (status, _) = request_json(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refreshToken": "no-separator" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
