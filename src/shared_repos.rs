use crate::repositories::sqlx_repo::{SqlxContactRepo, SqlxProjectRepo};

#[derive(Clone)]
pub struct SharedRepositories {
    pub project_repo: SqlxProjectRepo,
    pub contact_repo: SqlxContactRepo,
}

impl SharedRepositories {
    pub fn new(pool: sqlx::PgPool) -> Self {
        let project_repo = SqlxProjectRepo::new(pool.clone());
        let contact_repo = SqlxContactRepo::new(pool);

        SharedRepositories {
            project_repo,
            contact_repo,
        }
    }
}
