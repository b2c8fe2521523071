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
    let db_path = dir.path().join("test_nav.db");
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

async fn register_seeker(app: &Router) -> Result<String> {
    let req = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": "Browser User",
                "email": "browser@example.com",
                "password": "password123",
                "role": "SEEKER"
            })
            .to_string(),
        ))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let v: Value = serde_json::from_slice(&body_bytes)?;
    Ok(v.get("token").and_then(|t| t.as_str()).context("missing token")?.to_string())
}

fn location(resp: &Response) -> Option<String> {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[tokio::test]
async fn anonymous_browser_navigation_redirects_to_login_with_return_path() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;

    let req = Request::builder()
        .method("GET")
        .uri("/seeker/dashboard")
        .header("accept", "text/html")
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&resp).as_deref(),
        Some("/login?from=%2Fseeker%2Fdashboard")
    );

    Ok(())
}

#[tokio::test]
async fn authenticated_browser_is_bounced_off_auth_pages() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;
    let token = register_seeker(&app).await?;

    // via bearer header
    let req = Request::builder()
        .method("GET")
        .uri("/login")
        .header("accept", "text/html")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp).as_deref(), Some("/seeker/dashboard"));

    // via the token cookie a browser would carry
    let req = Request::builder()
        .method("GET")
        .uri("/register")
        .header("accept", "text/html")
        .header("cookie", format!("theme=dark; token={}", token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp).as_deref(), Some("/seeker/dashboard"));

    Ok(())
}

#[tokio::test]
async fn wrong_role_section_redirects_home() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;
    let token = register_seeker(&app).await?;

    let req = Request::builder()
        .method("GET")
        .uri("/company/dashboard")
        .header("accept", "text/html")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp).as_deref(), Some("/"));

    Ok(())
}

#[tokio::test]
async fn api_requests_keep_their_json_statuses() -> Result<()> {
    let (app, _pool, _dir) = setup().await?;

    // no Accept: text/html, so the guard stays out of the way and the API
    // answers with its own 401
    let req = Request::builder()
        .method("GET")
        .uri("/seeker/applications")
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
