use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::template_service;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TemplateReq {
    pub name: String,
    pub subject: String,
    pub body: String,
}

async fn add_template(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<TemplateReq>,
) -> Result<impl IntoResponse, ApiError> {
    let template =
        template_service::add(&state.pool, &user.id, &req.name, &req.subject, &req.body).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

async fn update_template(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<TemplateReq>,
) -> Result<impl IntoResponse, ApiError> {
    let template = template_service::update(
        &state.pool,
        &user.id,
        &id,
        &req.name,
        &req.subject,
        &req.body,
    )
    .await?;
    Ok(Json(template))
}

async fn delete_template(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    template_service::delete(&state.pool, &user.id, &id).await?;
    Ok(Json(json!({ "message": "template deleted", "id": id })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addtemplate", post(add_template))
        .route("/updatetemplate/:id", put(update_template))
        .route("/deletetemplate/:id", delete(delete_template))
}
