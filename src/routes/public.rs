use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{self, Identity};
use crate::errors::{AppError, AppResult};
use crate::models::job::{DbJobJoined, JobDetail, JobSummary};

const DEFAULT_LISTING_LIMIT: i64 = 6;
const MAX_LISTING_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/jobs",
    tag = "Jobs",
    params(("limit" = Option<i64>, Query, description = "Max postings to return")),
    responses((status = 200, description = "Latest postings", body = [JobSummary]))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<ListingQuery>,
) -> AppResult<Json<Vec<JobSummary>>> {
    authz::authorize(&identity, None, None).map_err(|deny| deny.into_error())?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_LISTING_LIMIT)
        .clamp(1, MAX_LISTING_LIMIT);

    let rows = sqlx::query_as::<_, DbJobJoined>(
        "SELECT j.id, j.company_id, j.title, j.description, j.location, j.job_type, j.salary, j.created_at, j.updated_at, \
                c.name AS company_name, c.description AS company_description, c.website AS company_website \
         FROM jobs j JOIN companies c ON c.id = j.company_id \
         ORDER BY j.created_at DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    let jobs = rows
        .into_iter()
        .map(DbJobJoined::into_summary)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(jobs))
}

#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "Jobs",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job detail", body = JobDetail),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<JobDetail>> {
    authz::authorize(&identity, None, None).map_err(|deny| deny.into_error())?;

    let job = fetch_job_detail(&state.pool, id).await?;
    Ok(Json(job))
}

pub(crate) async fn fetch_job_detail(pool: &SqlitePool, job_id: Uuid) -> AppResult<JobDetail> {
    sqlx::query_as::<_, DbJobJoined>(
        "SELECT j.id, j.company_id, j.title, j.description, j.location, j.job_type, j.salary, j.created_at, j.updated_at, \
                c.name AS company_name, c.description AS company_description, c.website AS company_website \
         FROM jobs j JOIN companies c ON c.id = j.company_id \
         WHERE j.id = ?",
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("job not found"))?
    .into_detail()
}
