#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use mailora_hub_dispatch::auth::mint_access_token;
use mailora_hub_dispatch::config::Config;
use mailora_hub_dispatch::db::{self, now_epoch};
use mailora_hub_dispatch::gmail::{MailSender, OutgoingMessage, SendError};
use mailora_hub_dispatch::routes;
use mailora_hub_dispatch::state::AppState;

pub const PEPPER: &str = "test-pepper";

/// Records every send; addresses in `fail_for` are rejected.
#[derive(Default)]
pub struct MockSender {
    pub sent: Mutex<Vec<OutgoingMessage>>,
    pub fail_for: HashSet<String>,
}

impl MockSender {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for MockSender {
    async fn send(&self, _access_token: &str, message: &OutgoingMessage) -> Result<(), SendError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail_for.contains(&message.to) {
            Err(SendError::Rejected("quota exceeded".into()))
        } else {
            Ok(())
        }
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        port: 0,
        token_pepper: PEPPER.into(),
        frontend_url: "http://localhost:5173".into(),
        cors_origins: Vec::new(),
        gmail_api_base: "http://127.0.0.1:1".into(),
        smtp: None,
    }
}

pub async fn test_app(mailer: Arc<dyn MailSender>) -> (Router, SqlitePool) {
    let pool = db::connect_memory().await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(test_config()),
        http: reqwest::Client::new(),
        mailer,
    };
    (routes::router(state), pool)
}

/// Inserts a user directly; `google` is an optional (access_token, expiry)
/// delegated grant. The password is always "password123".
pub async fn seed_user(
    pool: &SqlitePool,
    id: &str,
    email: &str,
    verified: bool,
    google: Option<(&str, i64)>,
) {
    let password_hash = bcrypt::hash("password123", 4).unwrap();
    let (token, expiry) = match google {
        Some((t, e)) => (Some(t), Some(e)),
        None => (None, None),
    };
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, is_verified, google_access_token, google_token_expiry, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind("Test User")
    .bind(email)
    .bind(&password_hash)
    .bind(verified)
    .bind(token)
    .bind(expiry)
    .bind(now_epoch())
    .execute(pool)
    .await
    .unwrap();
}

pub fn bearer(user_id: &str) -> String {
    mint_access_token(PEPPER, user_id, now_epoch())
}

pub async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Serves a fixed CSV payload on an ephemeral local port, standing in for
/// the external object store.
pub async fn serve_csv(text: &'static str) -> String {
    let app = Router::new().route("/data.csv", get(move || async move { text }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/data.csv")
}
