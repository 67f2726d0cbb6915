use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::file_service;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCsvReq {
    pub file_name: String,
    pub file_url: String,
}

/// Registers an already-uploaded CSV resource. The upload itself goes to
/// the object store from the client; we fetch the URL once to count rows.
async fn register_csv(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<RegisterCsvReq>,
) -> Result<Json<Value>, ApiError> {
    if !user.is_verified {
        return Err(ApiError::Forbidden("email not verified".into()));
    }
    if req.file_name.trim().is_empty() || req.file_url.trim().is_empty() {
        return Err(ApiError::Validation("fileName and fileUrl are required".into()));
    }

    let file =
        file_service::register(&state.pool, &state.http, &user.id, &req.file_name, &req.file_url)
            .await?;
    let files = file_service::list(&state.pool, &user.id).await?;
    Ok(Json(json!({
        "message": "file registered successfully",
        "file": file,
        "files": files,
    })))
}

async fn list_files(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let files = file_service::list(&state.pool, &user.id).await?;
    Ok(Json(json!({ "files": files })))
}

async fn delete_csv(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    file_service::delete(&state.pool, &user.id, &file_id).await?;
    Ok(Json(json!({ "message": "csv deleted", "id": file_id })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/csv", post(register_csv))
        .route("/files", get(list_files))
        .route("/deletecsv/:id", delete(delete_csv))
}
