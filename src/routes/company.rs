use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{self, Deny, Identity, OwnershipCheck, OwnershipResolver, Role, SqlOwnership};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::extract::ValidJson;
use crate::jwt::AuthUser;
use crate::models::application::{
    Application, ApplicationWithApplicant, DbApplication, DbApplicationWithUser,
};
use crate::models::job::{
    DbJob, Job, JobCreateRequest, JobUpdateRequest, JobWithApplicants, JobWithApplications,
};
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/company/jobs",
    tag = "Company",
    responses(
        (status = 200, description = "Company postings with applications", body = [JobWithApplications]),
        (status = 401, description = "Not a company session"),
        (status = 404, description = "No company record")
    )
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<JobWithApplications>>> {
    let company_id = require_company(&state.pool, &auth).await?;

    let jobs = sqlx::query_as::<_, DbJob>(
        "SELECT id, company_id, title, description, location, job_type, salary, created_at, updated_at \
         FROM jobs WHERE company_id = ? ORDER BY created_at DESC",
    )
    .bind(company_id)
    .fetch_all(&state.pool)
    .await?;

    let applications = sqlx::query_as::<_, DbApplication>(
        "SELECT a.id, a.user_id, a.job_id, a.status, a.cover_letter, a.created_at \
         FROM applications a JOIN jobs j ON j.id = a.job_id \
         WHERE j.company_id = ? ORDER BY a.created_at DESC",
    )
    .bind(company_id)
    .fetch_all(&state.pool)
    .await?;

    let mut by_job: HashMap<Uuid, Vec<Application>> = HashMap::new();
    for row in applications {
        let application: Application = row.try_into()?;
        by_job.entry(application.job_id).or_default().push(application);
    }

    let mut result = Vec::with_capacity(jobs.len());
    for row in jobs {
        let job: Job = row.try_into()?;
        let applications = by_job.remove(&job.id).unwrap_or_default();
        result.push(JobWithApplications::from_parts(job, applications));
    }

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/company/jobs",
    tag = "Company",
    request_body = JobCreateRequest,
    responses(
        (status = 201, description = "Job posted", body = Job),
        (status = 401, description = "Not a company session"),
        (status = 404, description = "No company record")
    )
)]
pub async fn create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<JobCreateRequest>,
) -> AppResult<(StatusCode, Json<Job>)> {
    let company_id = require_company(&state.pool, &auth).await?;

    let now = utc_now();
    let job_id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO jobs (id, company_id, title, description, location, job_type, salary, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(job_id)
    .bind(company_id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.location)
    .bind(payload.job_type.as_str())
    .bind(&payload.salary)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let job: Job = fetch_job(&state.pool, job_id, company_id).await?.try_into()?;

    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(auth.user_id),
        &job,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    get,
    path = "/company/jobs/{id}",
    tag = "Company",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Posting with applicants", body = JobWithApplicants),
        (status = 404, description = "Job missing or not owned")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<JobWithApplicants>> {
    let (_, db_job) = require_owned_job(&state.pool, &auth, id).await?;
    let job: Job = db_job.try_into()?;

    let applications = sqlx::query_as::<_, DbApplicationWithUser>(
        "SELECT a.id, a.user_id, a.job_id, a.status, a.cover_letter, a.created_at, \
                u.name AS applicant_name, u.email AS applicant_email \
         FROM applications a JOIN users u ON u.id = a.user_id \
         WHERE a.job_id = ? ORDER BY a.created_at DESC",
    )
    .bind(job.id)
    .fetch_all(&state.pool)
    .await?;

    let applications = applications
        .into_iter()
        .map(ApplicationWithApplicant::from)
        .collect();

    Ok(Json(JobWithApplicants::from_parts(job, applications)))
}

#[utoipa::path(
    patch,
    path = "/company/jobs/{id}",
    tag = "Company",
    params(("id" = Uuid, Path, description = "Job id")),
    request_body = JobUpdateRequest,
    responses(
        (status = 200, description = "Job updated", body = Job),
        (status = 404, description = "Job missing or not owned")
    )
)]
pub async fn update_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<JobUpdateRequest>,
) -> AppResult<Json<Job>> {
    let (company_id, mut db_job) = require_owned_job(&state.pool, &auth, id).await?;
    let old: Job = db_job.clone().try_into()?;

    if let Some(title) = payload.title.as_ref() {
        db_job.title = title.clone();
    }
    if let Some(description) = payload.description.as_ref() {
        db_job.description = description.clone();
    }
    if let Some(location) = payload.location.as_ref() {
        db_job.location = location.clone();
    }
    if let Some(job_type) = payload.job_type {
        db_job.job_type = job_type.as_str().to_string();
    }
    if payload.salary.is_some() {
        db_job.salary = payload.salary.clone();
    }

    let now = utc_now();

    sqlx::query(
        "UPDATE jobs SET title = ?, description = ?, location = ?, job_type = ?, salary = ?, updated_at = ? \
         WHERE id = ? AND company_id = ?",
    )
    .bind(&db_job.title)
    .bind(&db_job.description)
    .bind(&db_job.location)
    .bind(&db_job.job_type)
    .bind(&db_job.salary)
    .bind(now)
    .bind(db_job.id)
    .bind(company_id)
    .execute(&state.pool)
    .await?;

    db_job.updated_at = now;
    let job: Job = db_job.try_into()?;

    log_activity_with_context(
        &state.event_bus,
        "updated",
        Some(auth.user_id),
        &job,
        Some(&old),
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(job))
}

#[utoipa::path(
    delete,
    path = "/company/jobs/{id}",
    tag = "Company",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 404, description = "Job missing or not owned")
    )
)]
pub async fn delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    let (company_id, db_job) = require_owned_job(&state.pool, &auth, id).await?;
    let job: Job = db_job.try_into()?;

    // Applications go with the posting via the FK cascade.
    let affected = sqlx::query("DELETE FROM jobs WHERE id = ? AND company_id = ?")
        .bind(id)
        .bind(company_id)
        .execute(&state.pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("job not found"));
    }

    log_activity_with_context(
        &state.event_bus,
        "deleted",
        Some(auth.user_id),
        &job,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Role gate plus the company record the caller acts through.
async fn require_company(pool: &SqlitePool, auth: &AuthUser) -> AppResult<Uuid> {
    authz::authorize(&Identity::from(auth), Some(Role::Company), None)
        .map_err(|deny| deny.into_error())?;

    SqlOwnership::new(pool)
        .company_of_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("company not found"))
}

/// Full gate for job-scoped mutations: role, then ownership. A missing job
/// and a foreign job produce the same 404.
async fn require_owned_job(
    pool: &SqlitePool,
    auth: &AuthUser,
    job_id: Uuid,
) -> AppResult<(Uuid, DbJob)> {
    let company_id = require_company(pool, auth).await?;

    let owner = SqlOwnership::new(pool).owner_of_job(job_id).await?;
    let check = OwnershipCheck {
        resource_owner: owner,
        caller_owner: Some(company_id),
    };

    authz::authorize(&Identity::from(auth), Some(Role::Company), Some(&check)).map_err(
        |deny| match deny {
            Deny::NotOwner => AppError::not_found("job not found"),
            other => other.into_error(),
        },
    )?;

    let job = fetch_job(pool, job_id, company_id).await?;
    Ok((company_id, job))
}

async fn fetch_job(pool: &SqlitePool, job_id: Uuid, company_id: Uuid) -> AppResult<DbJob> {
    sqlx::query_as::<_, DbJob>(
        "SELECT id, company_id, title, description, location, job_type, salary, created_at, updated_at \
         FROM jobs WHERE id = ? AND company_id = ?",
    )
    .bind(job_id)
    .bind(company_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("job not found"))
}
