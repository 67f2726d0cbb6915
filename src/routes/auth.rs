use axum::extract::{Query, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::mint_access_token;
use crate::db::now_epoch;
use crate::error::ApiError;
use crate::models::user::User;
use crate::services::{auth_service, token_service};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignupReq {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAuthReq {
    pub access_token: String,
    pub scope: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReq {
    pub refresh_token: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogoutReq {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

#[derive(Deserialize)]
pub struct ResendReq {
    pub email: String,
}

fn device_info(headers: &HeaderMap) -> String {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Issues the access/refresh pair for a freshly authenticated user. The
/// refresh credential goes out as the opaque `tokenId.secret` value.
async fn session_response(
    state: &AppState,
    user: &User,
    device: &str,
    message: &str,
) -> Result<Json<Value>, ApiError> {
    let refresh = token_service::issue(&state.pool, &state.config.token_pepper, &user.id, device)
        .await
        .map_err(ApiError::Internal)?;
    let access = mint_access_token(&state.config.token_pepper, &user.id, now_epoch());
    Ok(Json(json!({
        "message": message,
        "user": user,
        "accessToken": access,
        "refreshToken": refresh.opaque_value(),
    })))
}

async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SignupReq>,
) -> Result<Json<Value>, ApiError> {
    let user =
        auth_service::signup(&state.pool, &state.config, &req.name, &req.email, &req.password)
            .await?;
    session_response(&state, &user, &device_info(&headers), "signup successful").await
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginReq>,
) -> Result<Json<Value>, ApiError> {
    let user = auth_service::login(&state.pool, &state.config, &req.email, &req.password).await?;
    session_response(&state, &user, &device_info(&headers), "login successful").await
}

async fn google_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GoogleAuthReq>,
) -> Result<Json<Value>, ApiError> {
    let user = auth_service::google_auth(
        &state.pool,
        &state.http,
        &req.access_token,
        req.scope.as_deref(),
    )
    .await?;
    session_response(&state, &user, &device_info(&headers), "google auth successful").await
}

/// Validate-and-rotate: a valid refresh credential is exchanged for a new
/// pair; the presented one is revoked in the process.
async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshReq>,
) -> Result<Json<Value>, ApiError> {
    let (token_id, secret) = token_service::parse_opaque(&req.refresh_token)
        .ok_or_else(|| ApiError::Auth("invalid refresh token".into()))?;
    let rotated =
        token_service::rotate(&state.pool, &state.config.token_pepper, token_id, secret)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::Auth("invalid refresh token".into()))?;
    let (user_id, fresh) = rotated;
    let access = mint_access_token(&state.config.token_pepper, &user_id, now_epoch());
    Ok(Json(json!({
        "message": "token refreshed",
        "accessToken": access,
        "refreshToken": fresh.opaque_value(),
    })))
}

/// Revokes the presented refresh credential. Always answers 200; an
/// unparseable or already-dead credential has nothing left to revoke.
async fn logout(
    State(state): State<AppState>,
    req: Option<Json<LogoutReq>>,
) -> Result<Json<Value>, ApiError> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    if let Some(raw) = req.refresh_token.as_deref() {
        if let Some((token_id, secret)) = token_service::parse_opaque(raw) {
            let valid =
                token_service::validate(&state.pool, &state.config.token_pepper, token_id, secret)
                    .await
                    .map_err(ApiError::Internal)?;
            if valid.is_some() {
                token_service::revoke(&state.pool, token_id)
                    .await
                    .map_err(ApiError::Internal)?;
            }
        }
    }
    Ok(Json(json!({ "message": "logout successful" })))
}

async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<Value>, ApiError> {
    let token = query
        .token
        .ok_or_else(|| ApiError::Validation("verification token missing".into()))?;
    auth_service::verify_email(&state.pool, &token).await?;
    Ok(Json(json!({ "message": "email verified successfully" })))
}

async fn resend_verification(
    State(state): State<AppState>,
    Json(req): Json<ResendReq>,
) -> Result<impl IntoResponse, ApiError> {
    auth_service::resend_verification(&state.pool, &state.config, &req.email).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "verification email resent successfully" })),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/google", post(google_auth))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/verify-email", get(verify_email))
        .route("/resend-verification", post(resend_verification))
}
