use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use sqlx::{Row, SqlitePool};
use tempfile::tempdir;
use tower::util::ServiceExt;

use jobdesk::create_app;

#[tokio::test]
async fn activity_log_records_job_posting() -> Result<()> {
    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test_activity.db");

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

    // register a company (emits user.registered)
    let req = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": "Audit Owner",
                "email": "audit@example.com",
                "password": "password123",
                "role": "COMPANY",
                "company_name": "Audit Co"
            })
            .to_string(),
        ))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let v: Value = serde_json::from_slice(&body_bytes)?;
    let token = v.get("token").and_then(|t| t.as_str()).context("missing token")?.to_string();

    // post a job (emits job.created)
    let req = Request::builder()
        .method("POST")
        .uri("/company/jobs")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(
            json!({
                "title": "Audit This Job",
                "description": "desc",
                "location": "Remote",
                "job_type": "PART_TIME"
            })
            .to_string(),
        ))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // the listener runs on its own task; poll until both projections landed
    let mut names: Vec<String> = Vec::new();
    for _ in 0..50 {
        names = sqlx::query_scalar("SELECT event_name FROM activity_log ORDER BY occurred_at")
            .fetch_all(&pool)
            .await?;
        let stored: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM event_store")
            .fetch_one(&pool)
            .await?;
        if names.iter().any(|n| n == "job.created") && stored >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert!(
        names.iter().any(|n| n == "user.registered"),
        "expected user.registered in {:?}",
        names
    );
    assert!(
        names.iter().any(|n| n == "job.created"),
        "expected job.created in {:?}",
        names
    );

    // the event store carries the same events chained by hash
    let rows = sqlx::query("SELECT prev_hash, hash FROM event_store ORDER BY seq")
        .fetch_all(&pool)
        .await?;
    assert!(rows.len() >= 2, "expected at least two stored events");

    let mut prev: Option<String> = None;
    for row in &rows {
        let prev_hash: Option<String> = row.try_get("prev_hash")?;
        let hash: String = row.try_get("hash")?;
        assert!(!hash.is_empty());
        assert_eq!(prev_hash, prev, "hash chain must link consecutive events");
        prev = Some(hash);
    }

    Ok(())
}
