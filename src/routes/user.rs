use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::auth_service;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpdateNameReq {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordReq {
    pub old_password: String,
    pub new_password: String,
}

async fn get_current_user(AuthUser(user): AuthUser) -> Result<Json<Value>, ApiError> {
    if !user.is_verified {
        return Err(ApiError::Forbidden("email not verified".into()));
    }
    Ok(Json(json!(user)))
}

async fn update_name(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateNameReq>,
) -> Result<Json<Value>, ApiError> {
    auth_service::update_name(&state.pool, &user.id, &req.name).await?;
    Ok(Json(json!({ "message": "name updated successfully" })))
}

async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ChangePasswordReq>,
) -> Result<Json<Value>, ApiError> {
    auth_service::change_password(&state.pool, &user, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(json!({ "message": "password changed successfully" })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/getcurrentuser", get(get_current_user))
        .route("/update-name", put(update_name))
        .route("/change-password", put(change_password))
}
