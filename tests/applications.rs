use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::tempdir;
use tower::util::ServiceExt;

use jobdesk::create_app;

async fn setup() -> Result<(Router, SqlitePool, tempfile::TempDir)> {
    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test_applications.db");
    use sqlx::sqlite::SqliteConnectOptions;
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
        .await?;
    migrator.run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    let app = create_app(pool.clone()).await?;
    Ok((app, pool, dir))
}

async fn register(app: &Router, body: Value) -> Result<(String, String)> {
    let req = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))?;
    let resp: Response = app.clone().oneshot(req).await?;
    let status = resp.status();
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    if status != StatusCode::CREATED {
        panic!("register failed: {} - {}", status, String::from_utf8_lossy(&body_bytes));
    }
    let v: Value = serde_json::from_slice(&body_bytes)?;
    let token = v.get("token").and_then(|t| t.as_str()).context("missing token")?.to_string();
    let user_id = v
        .pointer("/user/id")
        .and_then(|t| t.as_str())
        .context("missing user id")?
        .to_string();
    Ok((token, user_id))
}

async fn seed_job(app: &Router) -> Result<String> {
    let (company_token, _) = register(
        app,
        json!({
            "name": "Hiring Co Owner",
            "email": "hiring@example.com",
            "password": "password123",
            "role": "COMPANY",
            "company_name": "Hiring Co"
        }),
    )
    .await?;

    let req = Request::builder()
        .method("POST")
        .uri("/company/jobs")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", company_token))
        .body(Body::from(
            json!({
                "title": "Engineer",
                "description": "desc",
                "location": "Remote",
                "job_type": "FULL_TIME"
            })
            .to_string(),
        ))?;
    let resp: Response = app.clone().oneshot(req).await?;
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let v: Value = serde_json::from_slice(&body_bytes)?;
    Ok(v.get("id").and_then(|t| t.as_str()).context("missing job id")?.to_string())
}

#[tokio::test]
async fn duplicate_application_is_a_conflict() -> Result<()> {
    let (app, pool, _dir) = setup().await?;
    let job_id = seed_job(&app).await?;
    let (seeker_token, seeker_id) = register(
        &app,
        json!({
            "name": "Applicant",
            "email": "applicant@example.com",
            "password": "password123",
            "role": "SEEKER"
        }),
    )
    .await?;

    // first application lands with status PENDING
    let req = Request::builder()
        .method("POST")
        .uri("/seeker/applications")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", seeker_token))
        .body(Body::from(json!({"job_id": job_id, "cover_letter": "hi"}).to_string()))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let created: Value = serde_json::from_slice(&body_bytes)?;
    assert_eq!(created["status"], "PENDING");

    // the second identical application must conflict
    let req = Request::builder()
        .method("POST")
        .uri("/seeker/applications")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", seeker_token))
        .body(Body::from(json!({"job_id": job_id}).to_string()))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT, "second application should conflict");

    // and exactly one row exists for the pair
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(1) FROM applications WHERE user_id = ? AND job_id = ?")
            .bind(uuid::Uuid::parse_str(&seeker_id)?)
            .bind(uuid::Uuid::parse_str(&job_id)?)
            .fetch_one(&pool)
            .await?;
    assert_eq!(count, 1);

    Ok(())
}

#[tokio::test]
async fn application_validation_and_roles() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;
    let _job_id = seed_job(&app).await?;
    let (seeker_token, _) = register(
        &app,
        json!({
            "name": "Applicant",
            "email": "applicant2@example.com",
            "password": "password123",
            "role": "SEEKER"
        }),
    )
    .await?;

    // missing job_id is rejected before any write
    let req = Request::builder()
        .method("POST")
        .uri("/seeker/applications")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", seeker_token))
        .body(Body::from(json!({"cover_letter": "hi"}).to_string()))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "missing job_id should be a 400");

    // applying to a job that does not exist is a 404
    let req = Request::builder()
        .method("POST")
        .uri("/seeker/applications")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", seeker_token))
        .body(Body::from(
            json!({"job_id": "00000000-0000-0000-0000-000000000000"}).to_string(),
        ))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // a company session cannot apply
    let (company_token, _) = register(
        &app,
        json!({
            "name": "Other Co Owner",
            "email": "other@example.com",
            "password": "password123",
            "role": "COMPANY",
            "company_name": "Other Co"
        }),
    )
    .await?;
    let req = Request::builder()
        .method("GET")
        .uri("/seeker/applications")
        .header("authorization", format!("Bearer {}", company_token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "company must not read seeker applications");

    Ok(())
}

#[tokio::test]
async fn seeker_sees_applications_with_job_and_company() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;
    let job_id = seed_job(&app).await?;
    let (seeker_token, _) = register(
        &app,
        json!({
            "name": "Applicant",
            "email": "applicant3@example.com",
            "password": "password123",
            "role": "SEEKER"
        }),
    )
    .await?;

    let req = Request::builder()
        .method("POST")
        .uri("/seeker/applications")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", seeker_token))
        .body(Body::from(json!({"job_id": job_id}).to_string()))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = Request::builder()
        .method("GET")
        .uri("/seeker/applications")
        .header("authorization", format!("Bearer {}", seeker_token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let list: Value = serde_json::from_slice(&body_bytes)?;
    let list = list.as_array().context("expected array")?;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["job"]["title"], "Engineer");
    assert_eq!(list[0]["job"]["company"]["name"], "Hiring Co");

    Ok(())
}
