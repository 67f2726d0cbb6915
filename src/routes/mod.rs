use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub mod auth;
pub mod email;
pub mod mail_log;
pub mod template;
pub mod upload;
pub mod user;

pub fn router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/api/auth", auth::router())
        .nest("/api/user", user::router())
        .nest("/api/upload", upload::router())
        .nest("/api/template", template::router())
        .nest("/api/email", email::router())
        .nest("/api/mail", mail_log::router())
        .layer(cors)
        .with_state(state)
}
