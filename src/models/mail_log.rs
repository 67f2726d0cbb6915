use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Append-only delivery record, one per attempted send.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MailLog {
    pub id: i64,
    pub user_id: String,
    pub recipient: String,
    pub subject: String,
    pub status: String,
    pub error: String,
    pub sent_at: i64,
}

/// Insert form of [`MailLog`]; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMailLog {
    pub user_id: String,
    pub recipient: String,
    pub subject: String,
    pub status: DeliveryStatus,
    pub error: String,
    pub sent_at: i64,
}
