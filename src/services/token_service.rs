use anyhow::{anyhow, Result};
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::now_epoch;
use crate::models::refresh_token::RefreshToken;

/// Refresh credentials live for seven days from issue.
pub const REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

const SECRET_BYTES: usize = 64;

/// Freshly issued credential. The raw secret leaves this struct exactly
/// once, inside [`IssuedToken::opaque_value`], and is never persisted.
#[derive(Debug)]
pub struct IssuedToken {
    pub token_id: String,
    pub secret: String,
    pub expires_at: i64,
}

impl IssuedToken {
    /// The opaque `tokenId.secret` string handed to the client. Clients
    /// store it whole and never parse it.
    pub fn opaque_value(&self) -> String {
        format!("{}.{}", self.token_id, self.secret)
    }
}

/// Splits a presented opaque credential back into (token_id, secret).
pub fn parse_opaque(value: &str) -> Option<(&str, &str)> {
    value.split_once('.').filter(|(id, secret)| {
        !id.is_empty() && !secret.is_empty() && !secret.contains('.')
    })
}

fn keyed_hash(pepper: &str, secret: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, pepper.as_bytes());
    hex::encode(hmac::sign(&key, secret.as_bytes()).as_ref())
}

/// Creates and persists a fresh credential for the user. The token id is
/// the primary key, so a colliding id fails the insert atomically instead
/// of overwriting an existing credential.
pub async fn issue(
    pool: &SqlitePool,
    pepper: &str,
    user_id: &str,
    device_info: &str,
) -> Result<IssuedToken> {
    let token_id = Uuid::new_v4().to_string();
    let mut buf = [0u8; SECRET_BYTES];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| anyhow!("system rng failure"))?;
    let secret = hex::encode(buf);
    let now = now_epoch();
    let expires_at = now + REFRESH_TTL_SECS;

    sqlx::query(
        "INSERT INTO refresh_tokens (token_id, user_id, token_hash, device_info, created_at, expires_at, revoked)
         VALUES (?, ?, ?, ?, ?, ?, 0)",
    )
    .bind(&token_id)
    .bind(user_id)
    .bind(keyed_hash(pepper, &secret))
    .bind(device_info)
    .bind(now)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(IssuedToken {
        token_id,
        secret,
        expires_at,
    })
}

/// Looks up the credential and checks the presented secret against the
/// stored keyed hash in constant time. Revoked and expired records fail
/// validation even before the sweeper removes them.
pub async fn validate(
    pool: &SqlitePool,
    pepper: &str,
    token_id: &str,
    secret: &str,
) -> Result<Option<RefreshToken>> {
    let Some(record) =
        sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token_id = ?")
            .bind(token_id)
            .fetch_optional(pool)
            .await?
    else {
        return Ok(None);
    };

    let key = hmac::Key::new(hmac::HMAC_SHA256, pepper.as_bytes());
    let Ok(expected) = hex::decode(&record.token_hash) else {
        return Ok(None);
    };
    if hmac::verify(&key, secret.as_bytes(), &expected).is_err() {
        return Ok(None);
    }
    if record.revoked || record.expires_at <= now_epoch() {
        return Ok(None);
    }
    Ok(Some(record))
}

/// Sets `revoked`; idempotent, a second call is a no-op.
pub async fn revoke(pool: &SqlitePool, token_id: &str) -> Result<()> {
    sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE token_id = ?")
        .bind(token_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Validate-and-rotate: the presented credential is revoked and a fresh
/// one is issued for the same user and device. Returns `None` when the
/// presented credential fails validation; nothing is mutated in that case.
pub async fn rotate(
    pool: &SqlitePool,
    pepper: &str,
    token_id: &str,
    secret: &str,
) -> Result<Option<(String, IssuedToken)>> {
    let Some(record) = validate(pool, pepper, token_id, secret).await? else {
        return Ok(None);
    };
    revoke(pool, &record.token_id).await?;
    let fresh = issue(pool, pepper, &record.user_id, &record.device_info).await?;
    Ok(Some((record.user_id, fresh)))
}

/// Deletes records past their expiry. Validation already treats them as
/// invalid; this only reclaims storage.
pub async fn sweep_expired(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
        .bind(now_epoch())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
