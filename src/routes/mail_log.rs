use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::mail_log_service::{self, LogFilter, DEFAULT_PAGE_SIZE};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LogsQuery {
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

async fn list_logs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = LogFilter {
        status: query.status,
        from: query.from,
        to: query.to,
    };
    let page = mail_log_service::query(
        &state.pool,
        &user.id,
        &filter,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    )
    .await?;
    Ok(Json(page.into_json()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/logs", get(list_logs))
}
