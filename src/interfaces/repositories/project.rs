use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    entities::project::{Project, ProjectInsert, ProjectPatch, ProjectRow},
    errors::AppError,
    repositories::sqlx_repo::SqlxProjectRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create_project(&self, project: &ProjectInsert) -> Result<Project, AppError>;
    async fn get_project_by_id(&self, id: &Uuid) -> Result<Option<Project>, AppError>;
    /// Applies the supplied fields only. A vanished record yields `AppError::NotFound`.
    async fn update_project(&self, id: &Uuid, patch: &ProjectPatch) -> Result<Project, AppError>;
    async fn delete_project(&self, id: &Uuid) -> Result<(), AppError>;
    async fn list_projects(&self, search: Option<String>) -> Result<Vec<Project>, AppError>;
    async fn list_featured_projects(&self, limit: i64) -> Result<Vec<Project>, AppError>;
    async fn list_recent_projects(&self, limit: i64) -> Result<Vec<Project>, AppError>;
    async fn count_projects(&self) -> Result<i64, AppError>;
    async fn check_connection(&self) -> Result<(), AppError>;
}

impl SqlxProjectRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxProjectRepo { pool }
    }
}

/// Escapes LIKE wildcards so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepo {
    async fn create_project(&self, project: &ProjectInsert) -> Result<Project, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO projects (
                title, description, image, technologies, github_url, live_url,
                featured, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.image.clone().map(Json))
        .bind(&project.technologies)
        .bind(&project.github_url)
        .bind(&project.live_url)
        .bind(project.featured)
        .bind(project.created_at)
        .bind(project.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_project_by_id(&self, id: &Uuid) -> Result<Option<Project>, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Project::from))
    }

    async fn update_project(&self, id: &Uuid, patch: &ProjectPatch) -> Result<Project, AppError> {
        // COALESCE keeps the stored value wherever the patch has no entry
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            UPDATE projects SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                image = COALESCE($3, image),
                technologies = COALESCE($4, technologies),
                github_url = COALESCE($5, github_url),
                live_url = COALESCE($6, live_url),
                featured = COALESCE($7, featured),
                updated_at = $8
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.image.clone().map(Json))
        .bind(patch.technologies.as_deref())
        .bind(patch.github_url.as_deref())
        .bind(patch.live_url.as_deref())
        .bind(patch.featured)
        .bind(patch.updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Project::from)
            .ok_or_else(|| AppError::NotFound("Project not found".into()))
    }

    async fn delete_project(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Project not found".into()));
        }
        Ok(())
    }

    async fn list_projects(&self, search: Option<String>) -> Result<Vec<Project>, AppError> {
        let pattern = search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT * FROM projects
            WHERE $1::TEXT IS NULL
               OR title ILIKE $1
               OR description ILIKE $1
               OR EXISTS (SELECT 1 FROM unnest(technologies) AS tech WHERE tech ILIKE $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn list_featured_projects(&self, limit: i64) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects WHERE featured ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn list_recent_projects(&self, limit: i64) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn count_projects(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
