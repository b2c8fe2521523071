use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{self, Deny, Identity, OwnershipResolver, Role, SqlOwnership};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity_with_context, RequestContext};
use crate::extract::ValidJson;
use crate::jwt::AuthUser;
use crate::models::application::{
    Application, ApplicationCreateRequest, ApplicationWithJob, DbApplication,
    DbApplicationWithJob, STATUS_PENDING,
};
use crate::models::job::{DbJobJoined, JobDetail, JobSummary};
use crate::models::profile::{DbProfile, Profile, ProfileUpdateRequest, SkillsInput};
use crate::routes::public::fetch_job_detail;
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/seeker/jobs",
    tag = "Seeker",
    responses(
        (status = 200, description = "All postings, newest first", body = [JobSummary]),
        (status = 401, description = "Not a seeker session")
    )
)]
pub async fn browse_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<JobSummary>>> {
    require_seeker(&auth)?;

    let rows = sqlx::query_as::<_, DbJobJoined>(
        "SELECT j.id, j.company_id, j.title, j.description, j.location, j.job_type, j.salary, j.created_at, j.updated_at, \
                c.name AS company_name, c.description AS company_description, c.website AS company_website \
         FROM jobs j JOIN companies c ON c.id = j.company_id \
         ORDER BY j.created_at DESC",
    )
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
    path = "/seeker/jobs/{id}",
    tag = "Seeker",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job detail with company", body = JobDetail),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<JobDetail>> {
    require_seeker(&auth)?;

    let job = fetch_job_detail(&state.pool, id).await?;
    Ok(Json(job))
}

#[utoipa::path(
    post,
    path = "/seeker/applications",
    tag = "Seeker",
    request_body = ApplicationCreateRequest,
    responses(
        (status = 201, description = "Application submitted", body = Application),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already applied")
    )
)]
pub async fn create_application(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<ApplicationCreateRequest>,
) -> AppResult<(StatusCode, Json<Application>)> {
    require_seeker(&auth)?;

    let job_exists = SqlOwnership::new(&state.pool)
        .owner_of_job(payload.job_id)
        .await?
        .is_some();
    if !job_exists {
        return Err(AppError::not_found("job not found"));
    }

    // Pre-check buys the friendlier message; the UNIQUE(user_id, job_id)
    // constraint below is what actually holds under concurrent submissions.
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(1) FROM applications WHERE user_id = ? AND job_id = ?")
            .bind(auth.user_id)
            .bind(payload.job_id)
            .fetch_one(&state.pool)
            .await?;
    if count > 0 {
        return Err(AppError::conflict("already applied to this job"));
    }

    let now = utc_now();
    let application_id = Uuid::new_v4();

    let insert = sqlx::query(
        "INSERT INTO applications (id, user_id, job_id, status, cover_letter, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(application_id)
    .bind(auth.user_id)
    .bind(payload.job_id)
    .bind(STATUS_PENDING)
    .bind(&payload.cover_letter)
    .bind(now)
    .execute(&state.pool)
    .await;

    if let Err(err) = insert {
        if is_unique_violation(&err) {
            return Err(AppError::conflict("already applied to this job"));
        }
        return Err(err.into());
    }

    let application: Application = sqlx::query_as::<_, DbApplication>(
        "SELECT id, user_id, job_id, status, cover_letter, created_at FROM applications WHERE id = ?",
    )
    .bind(application_id)
    .fetch_one(&state.pool)
    .await?
    .try_into()?;

    log_activity_with_context(
        &state.event_bus,
        "created",
        Some(auth.user_id),
        &application,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    get,
    path = "/seeker/applications",
    tag = "Seeker",
    responses(
        (status = 200, description = "Caller's applications with jobs", body = [ApplicationWithJob]),
        (status = 401, description = "Not a seeker session")
    )
)]
pub async fn list_applications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<ApplicationWithJob>>> {
    require_seeker(&auth)?;

    let rows = sqlx::query_as::<_, DbApplicationWithJob>(
        "SELECT a.id, a.user_id, a.job_id, a.status, a.cover_letter, a.created_at, \
                j.title AS job_title, j.description AS job_description, j.location AS job_location, \
                j.job_type AS job_type, j.salary AS job_salary, j.created_at AS job_created_at, \
                c.name AS company_name \
         FROM applications a \
         JOIN jobs j ON j.id = a.job_id \
         JOIN companies c ON c.id = j.company_id \
         WHERE a.user_id = ? ORDER BY a.created_at DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    let applications = rows
        .into_iter()
        .map(ApplicationWithJob::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/seeker/profile",
    tag = "Seeker",
    responses(
        (status = 200, description = "Profile, created empty on first read", body = Profile),
        (status = 403, description = "Not a seeker account")
    )
)]
pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Profile>> {
    require_seeker_strict(&auth)?;

    if let Some(existing) = fetch_profile(&state.pool, auth.user_id).await? {
        return Ok(Json(existing.try_into()?));
    }

    let now = utc_now();
    let insert = sqlx::query(
        "INSERT INTO profiles (id, user_id, bio, skills, experience, education, created_at, updated_at) \
         VALUES (?, ?, NULL, '[]', NULL, NULL, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await;

    if let Err(err) = insert {
        // Lost the creation race: the winner's row is the profile.
        if !is_unique_violation(&err) {
            return Err(err.into());
        }
    }

    let profile = fetch_profile(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::internal("profile vanished after creation"))?;

    Ok(Json(profile.try_into()?))
}

#[utoipa::path(
    put,
    path = "/seeker/profile",
    tag = "Seeker",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile upserted", body = Profile),
        (status = 403, description = "Not a seeker account")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<ProfileUpdateRequest>,
) -> AppResult<Json<Profile>> {
    require_seeker_strict(&auth)?;

    let skills = payload.skills.map(SkillsInput::normalize);
    let existing = fetch_profile(&state.pool, auth.user_id).await?;

    let existing = match existing {
        Some(row) => Some(row),
        None => {
            let now = utc_now();
            let insert = sqlx::query(
                "INSERT INTO profiles (id, user_id, bio, skills, experience, education, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(auth.user_id)
            .bind(payload.bio.clone().unwrap_or_default())
            .bind(encode_skills(skills.clone().unwrap_or_default())?)
            .bind(payload.experience.clone().unwrap_or_default())
            .bind(payload.education.clone().unwrap_or_default())
            .bind(now)
            .bind(now)
            .execute(&state.pool)
            .await;

            match insert {
                Ok(_) => None,
                // Lost the upsert race: merge into the winner's row instead.
                Err(err) if is_unique_violation(&err) => {
                    fetch_profile(&state.pool, auth.user_id).await?
                }
                Err(err) => return Err(err.into()),
            }
        }
    };

    if let Some(mut row) = existing {
        if let Some(bio) = payload.bio.as_ref() {
            row.bio = Some(bio.clone());
        }
        if let Some(skills) = skills.as_ref() {
            row.skills = encode_skills(skills.clone())?;
        }
        if let Some(experience) = payload.experience.as_ref() {
            row.experience = Some(experience.clone());
        }
        if let Some(education) = payload.education.as_ref() {
            row.education = Some(education.clone());
        }

        let now = utc_now();
        sqlx::query(
            "UPDATE profiles SET bio = ?, skills = ?, experience = ?, education = ?, updated_at = ? \
             WHERE user_id = ?",
        )
        .bind(&row.bio)
        .bind(&row.skills)
        .bind(&row.experience)
        .bind(&row.education)
        .bind(now)
        .bind(auth.user_id)
        .execute(&state.pool)
        .await?;
    }

    let profile: Profile = fetch_profile(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::internal("profile vanished after upsert"))?
        .try_into()?;

    log_activity_with_context(
        &state.event_bus,
        "updated",
        Some(auth.user_id),
        &profile,
        None,
        Some(RequestContext::from_headers(&headers)),
    );

    Ok(Json(profile))
}

/// Seeker gate with the merged 401 mapping used across the API.
fn require_seeker(auth: &AuthUser) -> AppResult<()> {
    authz::authorize(&Identity::from(auth), Some(Role::Seeker), None)
        .map_err(|deny| deny.into_error())
}

/// Profile variant: a wrong role is 403, distinct from a missing session.
fn require_seeker_strict(auth: &AuthUser) -> AppResult<()> {
    authz::authorize(&Identity::from(auth), Some(Role::Seeker), None).map_err(|deny| match deny {
        Deny::WrongRole { .. } => AppError::forbidden("profile is seeker-scoped"),
        other => other.into_error(),
    })
}

async fn fetch_profile(pool: &SqlitePool, user_id: Uuid) -> AppResult<Option<DbProfile>> {
    let profile = sqlx::query_as::<_, DbProfile>(
        "SELECT id, user_id, bio, skills, experience, education, created_at, updated_at \
         FROM profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(profile)
}

fn encode_skills(skills: Vec<String>) -> AppResult<String> {
    serde_json::to_string(&skills)
        .map_err(|err| AppError::internal(format!("failed to encode skills: {err}")))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
