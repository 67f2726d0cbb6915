use bcrypt::{hash, verify, DEFAULT_COST};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;
use crate::db::now_epoch;
use crate::error::ApiError;
use crate::models::user::User;
use crate::smtp;

const MIN_PASSWORD_LEN: usize = 8;
const VERIFICATION_TTL_SECS: i64 = 15 * 60;
/// Google hands out one-hour access tokens.
const GOOGLE_TOKEN_TTL_SECS: i64 = 3600;

pub fn valid_email(email: &str) -> bool {
    email.parse::<lettre::Address>().is_ok()
}

fn check_password_shape(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(
            "password must be at least 8 characters long".into(),
        ));
    }
    Ok(())
}

fn random_hex_token(bytes: usize) -> Result<String, ApiError> {
    let mut buf = vec![0u8; bytes];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("system rng failure")))?;
    Ok(hex::encode(&buf))
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Creates an unverified account and mails the verification link.
pub async fn signup(
    pool: &SqlitePool,
    config: &Config,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let email = email.to_lowercase();
    if find_by_email(pool, &email).await?.is_some() {
        return Err(ApiError::Validation("user already exists".into()));
    }
    if !valid_email(&email) {
        return Err(ApiError::Validation("invalid email".into()));
    }
    check_password_shape(password)?;

    let password_hash =
        hash(password, DEFAULT_COST).map_err(|e| ApiError::Internal(e.into()))?;
    let verification_token = random_hex_token(32)?;
    let now = now_epoch();
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, is_verified, verification_token, verification_expires, created_at)
         VALUES (?, ?, ?, ?, 0, ?, ?, ?)",
    )
    .bind(&id)
    .bind(name.trim())
    .bind(&email)
    .bind(&password_hash)
    .bind(&verification_token)
    .bind(now + VERIFICATION_TTL_SECS)
    .bind(now)
    .execute(pool)
    .await?;

    smtp::send_verification_email(config, &email, &verification_token).await;

    let user = find_by_id(pool, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(user)
}

/// Password login. Unverified accounts get a fresh verification mail and a
/// Forbidden so the frontend can prompt for the inbox check.
pub async fn login(
    pool: &SqlitePool,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let email = email.to_lowercase();
    if !valid_email(&email) {
        return Err(ApiError::Validation("invalid email".into()));
    }
    check_password_shape(password)?;

    let user = find_by_email(pool, &email)
        .await?
        .ok_or_else(|| ApiError::Validation("user does not exist".into()))?;

    if user.has_gmail_grant() && user.password_hash.is_empty() {
        return Err(ApiError::Validation(
            "this account was created with Google; use 'Continue with Google' to log in".into(),
        ));
    }

    let ok = verify(password, &user.password_hash).map_err(|e| ApiError::Internal(e.into()))?;
    if !ok {
        return Err(ApiError::Validation("incorrect password".into()));
    }

    if !user.is_verified {
        resend_verification_for(pool, config, &user).await?;
        return Err(ApiError::Forbidden(
            "email not verified; a new verification link has been sent".into(),
        ));
    }
    Ok(user)
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    name: Option<String>,
    email: Option<String>,
}

/// Google sign-in: the frontend completes the consent flow and hands over
/// the delegated access token; we resolve it to a profile and store the
/// grant for later mass sends. Google accounts are verified by definition.
pub async fn google_auth(
    pool: &SqlitePool,
    http: &reqwest::Client,
    access_token: &str,
    scope: Option<&str>,
) -> Result<User, ApiError> {
    let info: GoogleUserInfo = http
        .get("https://www.googleapis.com/oauth2/v2/userinfo")
        .query(&[("access_token", access_token)])
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("google userinfo failed: {e}")))?
        .json()
        .await
        .map_err(|e| ApiError::Upstream(format!("google userinfo failed: {e}")))?;

    let email = info
        .email
        .ok_or_else(|| ApiError::Upstream("google userinfo returned no email".into()))?
        .to_lowercase();
    let name = info.name.unwrap_or_else(|| email.clone());
    let now = now_epoch();
    let expiry = now + GOOGLE_TOKEN_TTL_SECS;

    match find_by_email(pool, &email).await? {
        None => {
            let id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO users (id, name, email, password_hash, is_verified, google_access_token, google_token_expiry, google_scope, created_at)
                 VALUES (?, ?, ?, '', 1, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&name)
            .bind(&email)
            .bind(access_token)
            .bind(expiry)
            .bind(scope)
            .bind(now)
            .execute(pool)
            .await?;
            Ok(find_by_id(pool, &id)
                .await?
                .ok_or_else(|| ApiError::NotFound("user not found".into()))?)
        }
        Some(user) => {
            if !user.has_gmail_grant() && !user.password_hash.is_empty() {
                return Err(ApiError::Validation(
                    "this email is registered with a password; sign in with your password instead"
                        .into(),
                ));
            }
            sqlx::query(
                "UPDATE users SET google_access_token = ?, google_token_expiry = ?, google_scope = ?, is_verified = 1 WHERE id = ?",
            )
            .bind(access_token)
            .bind(expiry)
            .bind(scope)
            .bind(&user.id)
            .execute(pool)
            .await?;
            Ok(find_by_id(pool, &user.id)
                .await?
                .ok_or_else(|| ApiError::NotFound("user not found".into()))?)
        }
    }
}

/// Marks the account verified if the token matches and has not expired.
pub async fn verify_email(pool: &SqlitePool, token: &str) -> Result<(), ApiError> {
    let result = sqlx::query(
        "UPDATE users SET is_verified = 1, verification_token = NULL, verification_expires = NULL
         WHERE verification_token = ? AND verification_expires > ?",
    )
    .bind(token)
    .bind(now_epoch())
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::Validation("invalid or expired token".into()));
    }
    Ok(())
}

pub async fn resend_verification(
    pool: &SqlitePool,
    config: &Config,
    email: &str,
) -> Result<(), ApiError> {
    let user = find_by_email(pool, &email.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    if user.is_verified {
        return Err(ApiError::Validation("email already verified".into()));
    }
    resend_verification_for(pool, config, &user).await
}

async fn resend_verification_for(
    pool: &SqlitePool,
    config: &Config,
    user: &User,
) -> Result<(), ApiError> {
    let token = random_hex_token(32)?;
    sqlx::query("UPDATE users SET verification_token = ?, verification_expires = ? WHERE id = ?")
        .bind(&token)
        .bind(now_epoch() + VERIFICATION_TTL_SECS)
        .bind(&user.id)
        .execute(pool)
        .await?;
    smtp::send_verification_email(config, &user.email, &token).await;
    Ok(())
}

pub async fn update_name(pool: &SqlitePool, user_id: &str, name: &str) -> Result<(), ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }
    let result = sqlx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind(name)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("user not found".into()));
    }
    Ok(())
}

pub async fn change_password(
    pool: &SqlitePool,
    user: &User,
    old_password: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let ok =
        verify(old_password, &user.password_hash).map_err(|e| ApiError::Internal(e.into()))?;
    if !ok {
        return Err(ApiError::Validation("old password is incorrect".into()));
    }
    check_password_shape(new_password)?;
    let password_hash =
        hash(new_password, DEFAULT_COST).map_err(|e| ApiError::Internal(e.into()))?;
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(&user.id)
        .execute(pool)
        .await?;
    Ok(())
}
