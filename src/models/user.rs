use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip)] // never serialize password hash
    pub password_hash: String,
    pub is_verified: bool,
    #[serde(skip)]
    pub verification_token: Option<String>,
    #[serde(skip)]
    pub verification_expires: Option<i64>,
    /// Delegated Gmail grant, present only for Google sign-ins.
    #[serde(skip)]
    pub google_access_token: Option<String>,
    pub google_token_expiry: Option<i64>,
    pub google_scope: Option<String>,
    pub created_at: i64,
}

impl User {
    pub fn has_gmail_grant(&self) -> bool {
        self.google_access_token
            .as_deref()
            .map_or(false, |t| !t.is_empty())
    }

    pub fn gmail_grant_expired(&self, now: i64) -> bool {
        self.google_token_expiry.map_or(true, |exp| exp < now)
    }
}

/// CSV file metadata; the bytes themselves live in external object storage.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserFile {
    pub file_id: String,
    pub user_id: String,
    pub file_name: String,
    pub file_url: String,
    pub row_count: i64,
    pub uploaded_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub created_at: i64,
}
