use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::AppResult;

/// Maps identities and resources to their owning records for scope checks.
#[async_trait]
pub trait OwnershipResolver: Send + Sync {
    /// The company record a user acts through, if any.
    async fn company_of_user(&self, user_id: Uuid) -> AppResult<Option<Uuid>>;

    /// The company that owns a job, if the job exists.
    async fn owner_of_job(&self, job_id: Uuid) -> AppResult<Option<Uuid>>;

    /// The profile record belonging to a user, if one exists yet.
    async fn profile_of_user(&self, user_id: Uuid) -> AppResult<Option<Uuid>>;
}

#[derive(Debug, Clone)]
pub struct SqlOwnership {
    pool: SqlitePool,
}

impl SqlOwnership {
    pub fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }
}

#[async_trait]
impl OwnershipResolver for SqlOwnership {
    async fn company_of_user(&self, user_id: Uuid) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM companies WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn owner_of_job(&self, job_id: Uuid) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT company_id FROM jobs WHERE id = ?")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn profile_of_user(&self, user_id: Uuid) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }
}
