use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::now_epoch;
use crate::error::ApiError;
use crate::models::user::Template;

pub async fn add(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
    subject: &str,
    body: &str,
) -> Result<Template, ApiError> {
    let template = Template {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
        created_at: now_epoch(),
    };
    sqlx::query(
        "INSERT INTO templates (id, user_id, name, subject, body, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&template.id)
    .bind(&template.user_id)
    .bind(&template.name)
    .bind(&template.subject)
    .bind(&template.body)
    .bind(template.created_at)
    .execute(pool)
    .await?;
    Ok(template)
}

pub async fn update(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    name: &str,
    subject: &str,
    body: &str,
) -> Result<Template, ApiError> {
    let result =
        sqlx::query("UPDATE templates SET name = ?, subject = ?, body = ? WHERE id = ? AND user_id = ?")
            .bind(name)
            .bind(subject)
            .bind(body)
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("template not found".into()));
    }
    let template =
        sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(template)
}

pub async fn delete(pool: &SqlitePool, user_id: &str, id: &str) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM templates WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("template not found".into()));
    }
    Ok(())
}
