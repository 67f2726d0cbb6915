use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::error::ApiError;
use crate::models::mail_log::{DeliveryStatus, MailLog, NewMailLog};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogFilter {
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug)]
pub struct LogPage {
    pub logs: Vec<MailLog>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

/// Durable append of one delivery outcome. Callers treat a failure here as
/// non-fatal: the send result stands either way.
pub async fn append(pool: &SqlitePool, log: &NewMailLog) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO mail_logs (user_id, recipient, subject, status, error, sent_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&log.user_id)
    .bind(&log.recipient)
    .bind(&log.subject)
    .bind(log.status.as_str())
    .bind(&log.error)
    .bind(log.sent_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Newest-first page of one user's delivery records. `limit` is clamped to
/// 1..=100 and `page` to >= 1; a bare end date is inclusive through
/// 23:59:59 of that day.
pub async fn query(
    pool: &SqlitePool,
    user_id: &str,
    filter: &LogFilter,
    page: i64,
    limit: i64,
) -> Result<LogPage, ApiError> {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_SIZE);

    let status = filter
        .status
        .as_deref()
        .and_then(DeliveryStatus::parse);
    let from_ts = match &filter.from {
        Some(d) => Some(day_start(d)?),
        None => None,
    };
    let to_ts = match &filter.to {
        Some(d) => Some(day_end(d)?),
        None => None,
    };

    let mut where_sql = String::from("WHERE user_id = ?");
    if status.is_some() {
        where_sql.push_str(" AND status = ?");
    }
    if from_ts.is_some() {
        where_sql.push_str(" AND sent_at >= ?");
    }
    if to_ts.is_some() {
        where_sql.push_str(" AND sent_at <= ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM mail_logs {where_sql}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(user_id);
    if let Some(s) = status {
        count_query = count_query.bind(s.as_str());
    }
    if let Some(ts) = from_ts {
        count_query = count_query.bind(ts);
    }
    if let Some(ts) = to_ts {
        count_query = count_query.bind(ts);
    }
    let total = count_query.fetch_one(pool).await?;

    let rows_sql = format!(
        "SELECT * FROM mail_logs {where_sql} ORDER BY sent_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let mut rows_query = sqlx::query_as::<_, MailLog>(&rows_sql).bind(user_id);
    if let Some(s) = status {
        rows_query = rows_query.bind(s.as_str());
    }
    if let Some(ts) = from_ts {
        rows_query = rows_query.bind(ts);
    }
    if let Some(ts) = to_ts {
        rows_query = rows_query.bind(ts);
    }
    let logs = rows_query
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(pool)
        .await?;

    let total_pages = (total + limit - 1) / limit;
    Ok(LogPage {
        logs,
        total,
        page,
        total_pages,
    })
}

impl LogPage {
    pub fn into_json(self) -> serde_json::Value {
        json!({
            "success": true,
            "logs": self.logs,
            "total": self.total,
            "page": self.page,
            "totalPages": self.total_pages,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ApiError::Validation(format!("invalid date: {s}")))
}

fn day_start(s: &str) -> Result<i64, ApiError> {
    Ok(parse_date(s)?
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp())
}

fn day_end(s: &str) -> Result<i64, ApiError> {
    Ok(parse_date(s)?
        .and_hms_opt(23, 59, 59)
        .expect("end of day is always valid")
        .and_utc()
        .timestamp())
}
