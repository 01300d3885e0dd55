use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    entities::contact_me::{ContactMeInsert, ContactMeMessage, ContactStatus},
    errors::AppError,
    repositories::sqlx_repo::SqlxContactRepo,
};

/// OFFSET for a 1-based `page`. Saturates instead of overflowing.
fn page_offset(page: i64, limit: i64) -> i64 {
    page.max(1).saturating_sub(1).saturating_mul(limit.max(0))
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactMeRepository: Send + Sync {
    async fn create_contact_message(&self, msg: &ContactMeInsert) -> Result<ContactMeMessage, AppError>;
    async fn list_contact_messages(
        &self,
        status: Option<ContactStatus>,
        page: i64,
        limit: i64,
    ) -> Result<Vec<ContactMeMessage>, AppError>;
    async fn count_contact_messages(&self, status: Option<ContactStatus>) -> Result<i64, AppError>;
    async fn list_recent_contact_messages(&self, limit: i64) -> Result<Vec<ContactMeMessage>, AppError>;
    async fn update_contact_status(&self, id: &Uuid, status: ContactStatus) -> Result<ContactMeMessage, AppError>;
    async fn delete_contact_message(&self, id: &Uuid) -> Result<(), AppError>;
}

impl SqlxContactRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxContactRepo { pool }
    }
}

#[async_trait]
impl ContactMeRepository for SqlxContactRepo {
    async fn create_contact_message(&self, msg: &ContactMeInsert) -> Result<ContactMeMessage, AppError> {
        let contact = sqlx::query_as::<_, ContactMeMessage>(
            r#"
            INSERT INTO contact_messages (name, email, subject, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, subject, message, status, created_at
            "#,
        )
        .bind(&msg.name)
        .bind(&msg.email)
        .bind(&msg.subject)
        .bind(&msg.message)
        .bind(msg.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(contact)
    }

    async fn list_contact_messages(
        &self,
        status: Option<ContactStatus>,
        page: i64,
        limit: i64,
    ) -> Result<Vec<ContactMeMessage>, AppError> {
        let messages = sqlx::query_as::<_, ContactMeMessage>(
            r#"
            SELECT id, name, email, subject, message, status, created_at
            FROM contact_messages
            WHERE $1::contact_status IS NULL OR status = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(page_offset(page, limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn count_contact_messages(&self, status: Option<ContactStatus>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contact_messages WHERE $1::contact_status IS NULL OR status = $1",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_recent_contact_messages(&self, limit: i64) -> Result<Vec<ContactMeMessage>, AppError> {
        let messages = sqlx::query_as::<_, ContactMeMessage>(
            r#"
            SELECT id, name, email, subject, message, status, created_at
            FROM contact_messages
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn update_contact_status(&self, id: &Uuid, status: ContactStatus) -> Result<ContactMeMessage, AppError> {
        sqlx::query_as::<_, ContactMeMessage>(
            r#"
            UPDATE contact_messages SET status = $1
            WHERE id = $2
            RETURNING id, name, email, subject, message, status, created_at
            "#,
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact message not found".into()))
    }

    async fn delete_contact_message(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|result| {
                if result.rows_affected() == 0 {
                    Err(AppError::NotFound("Contact message not found".into()))
                } else {
                    Ok(())
                }
            })?
    }
}
