mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use mailora_hub_dispatch::db::now_epoch;
use mailora_hub_dispatch::models::mail_log::{DeliveryStatus, NewMailLog};
use mailora_hub_dispatch::services::mail_log_service;
use serde_json::json;
use sqlx::SqlitePool;

use common::{bearer, request_json, seed_user, test_app, MockSender};

async fn seed_logs(pool: &SqlitePool, user_id: &str, count: usize) {
    for i in 0..count {
        mail_log_service::append(
            pool,
            &NewMailLog {
                user_id: user_id.to_string(),
                recipient: format!("r{i}@example.com"),
                subject: format!("subject {i}"),
                status: if i % 2 == 0 {
                    DeliveryStatus::Success
                } else {
                    DeliveryStatus::Failed
                },
                error: String::new(),
                sent_at: now_epoch() - i as i64,
            },
        )
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn logs_require_authentication() {
    let (app, _pool) = test_app(Arc::new(MockSender::default())).await;
    let (status, _) = request_json(&app, "GET", "/api/mail/logs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logs_are_paginated_newest_first() {
    let (app, pool) = test_app(Arc::new(MockSender::default())).await;
    seed_user(&pool, "u1", "ann@example.com", true, None).await;
    seed_logs(&pool, "u1", 15).await;
    let token = bearer("u1");

    let (status, body) =
        request_json(&app, "GET", "/api/mail/logs?page=1&limit=10", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["total"], json!(15));
    assert_eq!(body["totalPages"], json!(2));
    assert_eq!(body["logs"].as_array().unwrap().len(), 10);
    assert_eq!(body["logs"][0]["recipient"], json!("r0@example.com"));

    let (_, body) =
        request_json(&app, "GET", "/api/mail/logs?page=2&limit=10", Some(&token), None).await;
    assert_eq!(body["logs"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn out_of_range_paging_is_clamped() {
    let (app, pool) = test_app(Arc::new(MockSender::default())).await;
    seed_user(&pool, "u1", "ann@example.com", true, None).await;
    seed_logs(&pool, "u1", 3).await;
    let token = bearer("u1");

    let (status, body) = request_json(
        &app,
        "GET",
        "/api/mail/logs?page=0&limit=200",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], json!(1));
    assert_eq!(body["totalPages"], json!(1));
    assert_eq!(body["logs"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn status_filter_narrows_results() {
    let (app, pool) = test_app(Arc::new(MockSender::default())).await;
    seed_user(&pool, "u1", "ann@example.com", true, None).await;
    seed_logs(&pool, "u1", 6).await;
    let token = bearer("u1");

    let (status, body) = request_json(
        &app,
        "GET",
        "/api/mail/logs?status=failed",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(3));
    for log in body["logs"].as_array().unwrap() {
        assert_eq!(log["status"], json!("failed"));
    }
}

#[tokio::test]
async fn logs_are_scoped_to_the_requesting_user() {
    let (app, pool) = test_app(Arc::new(MockSender::default())).await;
    seed_user(&pool, "u1", "ann@example.com", true, None).await;
    seed_user(&pool, "u2", "bob@example.com", true, None).await;
    seed_logs(&pool, "u1", 4).await;
    seed_logs(&pool, "u2", 2).await;

    let (_, body) =
        request_json(&app, "GET", "/api/mail/logs", Some(&bearer("u2")), None).await;
    assert_eq!(body["total"], json!(2));
}
