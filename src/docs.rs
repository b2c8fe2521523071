use std::sync::Arc;

use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::auth::register,
        routes::auth::login,
        routes::auth::me,
        routes::auth::logout,
        routes::public::list_jobs,
        routes::public::get_job,
        routes::company::list_jobs,
        routes::company::create_job,
        routes::company::get_job,
        routes::company::update_job,
        routes::company::delete_job,
        routes::seeker::browse_jobs,
        routes::seeker::get_job,
        routes::seeker::create_application,
        routes::seeker::list_applications,
        routes::seeker::get_profile,
        routes::seeker::update_profile
    ),
    components(
        schemas(
            crate::authz::Role,
            models::user::User,
            models::user::Applicant,
            models::user::AuthResponse,
            models::user::LoginRequest,
            models::user::RegisterRequest,
            models::company::Company,
            models::company::CompanyPublic,
            models::company::CompanyName,
            models::job::JobType,
            models::job::Job,
            models::job::JobSummary,
            models::job::JobDetail,
            models::job::JobWithApplications,
            models::job::JobWithApplicants,
            models::job::JobCreateRequest,
            models::job::JobUpdateRequest,
            models::application::Application,
            models::application::ApplicationWithApplicant,
            models::application::ApplicationWithJob,
            models::application::ApplicationCreateRequest,
            models::profile::Profile,
            models::profile::ProfileUpdateRequest,
            routes::health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Authentication and onboarding"),
        (name = "Jobs", description = "Public job listings"),
        (name = "Company", description = "Company postings and applicant review"),
        (name = "Seeker", description = "Job search, applications and profile"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Generated document plus the bearer scheme and a default server entry so
/// Swagger UI's Authorize dialog and Try-it-out work against a local run.
pub fn build_openapi(port: u16) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    if let Some(components) = doc.components.as_mut() {
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }

    doc.servers = Some(vec![Server::new(format!("http://localhost:{port}"))]);

    doc
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
    let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
        .try_it_out_enabled(true)
        .with_credentials(true)
        .persist_authorization(true);

    let doc_json =
        Arc::new(serde_json::to_value(&doc).expect("OpenAPI serialization must succeed"));

    let json_route = {
        let doc_json = Arc::clone(&doc_json);
        get(move || {
            let doc_json = Arc::clone(&doc_json);
            async move { Json((*doc_json).clone()) }
        })
    };

    Router::new()
        .route("/api-docs/openapi.json", json_route)
        .merge(SwaggerUi::new("/docs").config(swagger_config))
}
