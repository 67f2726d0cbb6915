use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::db::now_epoch;
use crate::error::ApiError;
use crate::services::dispatch_service::{self, DispatchOptions};
use crate::services::{csv_service, file_service};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMassReq {
    pub csv_file_id: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Runs a mass-mail job. Pre-flight problems (missing fields, no Gmail
/// grant, expired grant, unknown file, unreachable CSV) abort with an
/// error before any send; once sending starts the job runs to completion
/// and answers 200 with the partial results.
async fn send_mass(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<SendMassReq>,
) -> Result<Json<Value>, ApiError> {
    if !user.is_verified {
        return Err(ApiError::Forbidden("email not verified".into()));
    }

    let (csv_file_id, subject, body) = match (req.csv_file_id, req.subject, req.body) {
        (Some(f), Some(s), Some(b)) if !f.is_empty() && !s.is_empty() && !b.is_empty() => {
            (f, s, b)
        }
        _ => return Err(ApiError::Validation("all fields are required".into())),
    };

    let access_token = user
        .google_access_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Validation(
                "gmail permissions required; log in with Google to send from your account".into(),
            )
        })?;
    if user.gmail_grant_expired(now_epoch()) {
        return Err(ApiError::Validation(
            "gmail token expired; log in with Google again".into(),
        ));
    }

    let file = file_service::get(&state.pool, &user.id, &csv_file_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("file not found".into()))?;

    let text = csv_service::fetch_csv(&state.http, &file.file_url).await?;
    let (headers, rows) = csv_service::parse_rows(&text);

    let report = dispatch_service::dispatch(
        state.mailer.as_ref(),
        &state.pool,
        &user.id,
        access_token,
        &subject,
        &body,
        &headers,
        &rows,
        &DispatchOptions::default(),
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "message": "email sending completed",
        "results": report,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/send-mass", post(send_mass))
}
