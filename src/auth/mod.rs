use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::hmac;

use crate::db::now_epoch;
use crate::error::ApiError;
use crate::models::user::User;
use crate::state::AppState;

/// Access tokens live for 15 minutes; the refresh credential carries the
/// session past that.
pub const ACCESS_TTL_SECS: i64 = 15 * 60;

fn signing_key(pepper: &str) -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, pepper.as_bytes())
}

/// Compact signed access token: `user_id.expiry.signature`. The signature
/// covers `user_id.expiry`, so neither part can be swapped out.
pub fn mint_access_token(pepper: &str, user_id: &str, now: i64) -> String {
    let payload = format!("{}.{}", user_id, now + ACCESS_TTL_SECS);
    let tag = hmac::sign(&signing_key(pepper), payload.as_bytes());
    format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(tag.as_ref()))
}

/// Returns the user id if the token is well-formed, untampered, and not
/// yet expired.
pub fn verify_access_token(pepper: &str, token: &str, now: i64) -> Option<String> {
    let (payload, sig) = token.rsplit_once('.')?;
    let sig = URL_SAFE_NO_PAD.decode(sig).ok()?;
    hmac::verify(&signing_key(pepper), payload.as_bytes(), &sig).ok()?;
    let (user_id, expiry) = payload.rsplit_once('.')?;
    let expiry: i64 = expiry.parse().ok()?;
    if expiry <= now {
        return None;
    }
    Some(user_id.to_string())
}

/// Session collaborator for gated routes: verifies the bearer token and
/// loads the account, including its delegated Gmail grant.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Auth("no authentication token provided".into()))?;

        let user_id = verify_access_token(&state.config.token_pepper, token, now_epoch())
            .ok_or_else(|| ApiError::Auth("token not verified".into()))?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or_else(|| ApiError::Auth("user not found".into()))?;

        Ok(AuthUser(user))
    }
}
