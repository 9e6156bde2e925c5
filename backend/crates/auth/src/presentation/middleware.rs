//! Auth Middleware
//!
//! Session enforcement for protected routes. A valid session cookie puts a
//! [`Principal`] into the request extensions; anything else is turned away
//! with a 401 (the JSON API's redirect-to-login). Public routes (login,
//! MFA verification, health checks) are simply never behind this layer.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::principal::Principal;
use std::sync::Arc;

use platform::cookie::extract_cookie;

use crate::application::CheckSessionUseCase;
use crate::application::config::AuthConfig;
use crate::domain::repository::{SessionRepository, UserRepository};

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState<R>
where
    R: UserRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

/// Middleware that requires a valid session.
///
/// On success the caller's [`Principal`] is attached to the request for
/// downstream handlers (superadmin gates read it from there).
pub async fn require_session<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: UserRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    let token = extract_cookie(req.headers(), &state.config.session_cookie_name);

    let Some(token) = token else {
        return Err(unauthorized());
    };

    let use_case = CheckSessionUseCase::new(state.repo.clone(), state.repo.clone());

    let principal = match use_case.enforce(&token).await {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(error = %e, "Session enforcement rejected request");
            return Err(unauthorized());
        }
    };

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, [("X-Auth-Required", "true")]).into_response()
}
