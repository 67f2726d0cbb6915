use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::now_epoch;
use crate::error::ApiError;
use crate::models::user::UserFile;
use crate::services::csv_service;

/// Registers CSV metadata for a user. The bytes live in external object
/// storage; we fetch them once here to count data rows.
pub async fn register(
    pool: &SqlitePool,
    http: &reqwest::Client,
    user_id: &str,
    file_name: &str,
    file_url: &str,
) -> Result<UserFile, ApiError> {
    let text = csv_service::fetch_csv(http, file_url).await?;
    let (_, rows) = csv_service::parse_rows(&text);

    let file = UserFile {
        file_id: format!("csv_{}", Uuid::new_v4()),
        user_id: user_id.to_string(),
        file_name: file_name.to_string(),
        file_url: file_url.to_string(),
        row_count: rows.len() as i64,
        uploaded_at: now_epoch(),
    };

    sqlx::query(
        "INSERT INTO user_files (file_id, user_id, file_name, file_url, row_count, uploaded_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&file.file_id)
    .bind(&file.user_id)
    .bind(&file.file_name)
    .bind(&file.file_url)
    .bind(file.row_count)
    .bind(file.uploaded_at)
    .execute(pool)
    .await?;

    Ok(file)
}

pub async fn list(pool: &SqlitePool, user_id: &str) -> Result<Vec<UserFile>, sqlx::Error> {
    sqlx::query_as::<_, UserFile>(
        "SELECT * FROM user_files WHERE user_id = ? ORDER BY uploaded_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get(
    pool: &SqlitePool,
    user_id: &str,
    file_id: &str,
) -> Result<Option<UserFile>, sqlx::Error> {
    sqlx::query_as::<_, UserFile>(
        "SELECT * FROM user_files WHERE user_id = ? AND file_id = ?",
    )
    .bind(user_id)
    .bind(file_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &SqlitePool, user_id: &str, file_id: &str) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM user_files WHERE user_id = ? AND file_id = ?")
        .bind(user_id)
        .bind(file_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("file not found".into()));
    }
    Ok(())
}
