use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One opaque refresh credential. Only the keyed hash of the secret is
/// stored; the raw secret exists client-side inside the `tokenId.secret`
/// cookie value and nowhere else.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RefreshToken {
    pub token_id: String,
    pub user_id: String,
    #[serde(skip)]
    pub token_hash: String,
    pub device_info: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub revoked: bool,
}
