use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::app::AppState;
use crate::authz::{Identity, Role};
use crate::jwt::resolve_identity;
use crate::utils::encode_return_path;

/// Browser-navigation guard, evaluated ahead of route matching.
///
/// Only requests that ask for text/html are touched; API traffic keeps its
/// JSON status codes. Mirrors three rules: authenticated users are bounced
/// off the auth pages to their dashboard, anonymous users are bounced off
/// role sections to /login with a `from` return path, and a session in the
/// wrong role section goes back to the landing page.
pub async fn navigation_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let accepts_html = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false);

    if !accepts_html {
        return next.run(req).await;
    }

    let path = req.uri().path().to_string();
    let identity = resolve_identity(req.headers(), &state.jwt);

    let is_auth_page = path.starts_with("/login") || path.starts_with("/register");
    if is_auth_page {
        if let Identity::Authenticated { role, .. } = identity {
            return Redirect::temporary(dashboard_path(role)).into_response();
        }
        return next.run(req).await;
    }

    if path.starts_with("/seeker") || path.starts_with("/company") {
        match identity {
            Identity::Anonymous => {
                let target = format!("/login?from={}", encode_return_path(&path));
                return Redirect::temporary(&target).into_response();
            }
            Identity::Authenticated { role, .. } => {
                let section_role = if path.starts_with("/seeker") {
                    Role::Seeker
                } else {
                    Role::Company
                };
                if role != section_role {
                    return Redirect::temporary("/").into_response();
                }
            }
        }
    }

    next.run(req).await
}

fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Seeker => "/seeker/dashboard",
        Role::Company => "/company/dashboard",
    }
}
