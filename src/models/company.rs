use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Company {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbCompany {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbCompany> for Company {
    type Error = AppError;

    fn try_from(value: DbCompany) -> Result<Self, Self::Error> {
        Ok(Company {
            id: value.id,
            user_id: value.user_id,
            name: value.name,
            description: value.description,
            website: value.website,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Public company fields exposed on job detail pages.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanyPublic {
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
}

/// The minimal company view attached to listing cards.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanyName {
    pub name: String,
}
