use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{Application, ApplicationWithApplicant};
use crate::models::company::{CompanyName, CompanyPublic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "FULL_TIME",
            JobType::PartTime => "PART_TIME",
            JobType::Contract => "CONTRACT",
            JobType::Internship => "INTERNSHIP",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "FULL_TIME" => Ok(JobType::FullTime),
            "PART_TIME" => Ok(JobType::PartTime),
            "CONTRACT" => Ok(JobType::Contract),
            "INTERNSHIP" => Ok(JobType::Internship),
            other => Err(AppError::internal(format!("unknown job type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Job {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl crate::events::Loggable for Job {
    fn entity_type() -> &'static str {
        "job"
    }
    fn subject_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbJob {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: String,
    pub salary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbJob> for Job {
    type Error = AppError;

    fn try_from(value: DbJob) -> Result<Self, Self::Error> {
        Ok(Job {
            id: value.id,
            company_id: value.company_id,
            title: value.title,
            description: value.description,
            location: value.location,
            job_type: value.job_type.parse()?,
            salary: value.salary,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Job row joined with its company's public fields.
#[derive(Debug, Clone, FromRow)]
pub struct DbJobJoined {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: String,
    pub salary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub company_name: String,
    pub company_description: Option<String>,
    pub company_website: Option<String>,
}

impl DbJobJoined {
    pub fn into_summary(self) -> Result<JobSummary, AppError> {
        Ok(JobSummary {
            id: self.id,
            title: self.title,
            description: self.description,
            location: self.location,
            job_type: self.job_type.parse()?,
            salary: self.salary,
            created_at: self.created_at,
            company: CompanyName {
                name: self.company_name,
            },
        })
    }

    pub fn into_detail(self) -> Result<JobDetail, AppError> {
        Ok(JobDetail {
            id: self.id,
            company_id: self.company_id,
            title: self.title,
            description: self.description,
            location: self.location,
            job_type: self.job_type.parse()?,
            salary: self.salary,
            created_at: self.created_at,
            updated_at: self.updated_at,
            company: CompanyPublic {
                name: self.company_name,
                description: self.company_description,
                website: self.company_website,
            },
        })
    }
}

/// Listing card: job plus the posting company's name.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub company: CompanyName,
}

/// Full job view with the company's public fields.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobDetail {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub company: CompanyPublic,
}

/// Company dashboard row: a posting with its applications.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobWithApplications {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub applications: Vec<Application>,
}

impl JobWithApplications {
    pub fn from_parts(job: Job, applications: Vec<Application>) -> Self {
        Self {
            id: job.id,
            company_id: job.company_id,
            title: job.title,
            description: job.description,
            location: job.location,
            job_type: job.job_type,
            salary: job.salary,
            created_at: job.created_at,
            updated_at: job.updated_at,
            applications,
        }
    }
}

/// Applicant-review view of a single posting.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobWithApplicants {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub applications: Vec<ApplicationWithApplicant>,
}

impl JobWithApplicants {
    pub fn from_parts(job: Job, applications: Vec<ApplicationWithApplicant>) -> Self {
        Self {
            id: job.id,
            company_id: job.company_id,
            title: job.title,
            description: job.description,
            location: job.location,
            job_type: job.job_type,
            salary: job.salary,
            created_at: job.created_at,
            updated_at: job.updated_at,
            applications,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JobCreateRequest {
    #[schema(example = "Backend Engineer")]
    pub title: String,
    #[schema(example = "Own the ingestion pipeline.")]
    pub description: String,
    #[schema(example = "Berlin / remote")]
    pub location: String,
    pub job_type: JobType,
    #[schema(example = "70k-90k EUR")]
    pub salary: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JobUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub salary: Option<String>,
}
