use std::time::Duration;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::services::token_service;

const SWEEP_INTERVAL_SECS: u64 = 3600;

/// Starts the background sweep that reclaims expired refresh tokens.
/// Validation already rejects expired records, so a missed tick only
/// delays cleanup.
pub fn start(pool: SqlitePool) {
    tokio::spawn(async move {
        loop {
            match token_service::sweep_expired(&pool).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "expired refresh tokens swept"),
                Err(e) => warn!("refresh token sweep failed: {e}"),
            }
            tokio::time::sleep(Duration::from_secs(SWEEP_INTERVAL_SECS)).await;
        }
    });
}
