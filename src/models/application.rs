use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::company::CompanyName;
use crate::models::user::Applicant;

/// The only status ever written; the stored set is open on purpose — no
/// transition endpoint exists.
pub const STATUS_PENDING: &str = "PENDING";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub cover_letter: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl crate::events::Loggable for Application {
    fn entity_type() -> &'static str {
        "application"
    }
    fn subject_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub cover_letter: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbApplication> for Application {
    type Error = AppError;

    fn try_from(value: DbApplication) -> Result<Self, Self::Error> {
        Ok(Application {
            id: value.id,
            user_id: value.user_id,
            job_id: value.job_id,
            status: value.status,
            cover_letter: value.cover_letter,
            created_at: value.created_at,
        })
    }
}

/// Application row joined with the applicant user.
#[derive(Debug, Clone, FromRow)]
pub struct DbApplicationWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub cover_letter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub applicant_name: String,
    pub applicant_email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApplicationWithApplicant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub cover_letter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub applicant: Applicant,
}

impl From<DbApplicationWithUser> for ApplicationWithApplicant {
    fn from(row: DbApplicationWithUser) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            job_id: row.job_id,
            status: row.status,
            cover_letter: row.cover_letter,
            created_at: row.created_at,
            applicant: Applicant {
                id: row.user_id,
                name: row.applicant_name,
                email: row.applicant_email,
            },
        }
    }
}

/// Application row joined with its job and the job's company name.
#[derive(Debug, Clone, FromRow)]
pub struct DbApplicationWithJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub cover_letter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub job_title: String,
    pub job_description: String,
    pub job_location: String,
    pub job_type: String,
    pub job_salary: Option<String>,
    pub job_created_at: DateTime<Utc>,
    pub company_name: String,
}

/// Seeker dashboard row: an application with the job it targets.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApplicationWithJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub cover_letter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub job: crate::models::job::JobSummary,
}

impl TryFrom<DbApplicationWithJob> for ApplicationWithJob {
    type Error = AppError;

    fn try_from(row: DbApplicationWithJob) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            job_id: row.job_id,
            status: row.status,
            cover_letter: row.cover_letter,
            created_at: row.created_at,
            job: crate::models::job::JobSummary {
                id: row.job_id,
                title: row.job_title,
                description: row.job_description,
                location: row.job_location,
                job_type: row.job_type.parse()?,
                salary: row.job_salary,
                created_at: row.job_created_at,
                company: CompanyName {
                    name: row.company_name,
                },
            },
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplicationCreateRequest {
    pub job_id: Uuid,
    pub cover_letter: Option<String>,
}
