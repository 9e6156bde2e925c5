//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState, AuthStore};
use crate::presentation::middleware::{AuthMiddlewareState, require_session};

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(repo, config)
}

/// Create a generic Auth router for any repository implementation.
///
/// Login, MFA verification, logout and the status probe are public; the
/// enrollment endpoints sit behind session enforcement.
pub fn auth_router_generic<R: AuthStore>(repo: R, config: AuthConfig) -> Router {
    let state = AuthAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };

    let middleware_state = AuthMiddlewareState {
        repo: state.repo.clone(),
        config: state.config.clone(),
    };

    let protected = Router::new()
        .route("/mfa/enroll", get(handlers::mfa_enroll::<R>))
        .route("/mfa/confirm", post(handlers::mfa_confirm::<R>))
        .route("/mfa/disable", post(handlers::mfa_disable::<R>))
        .route_layer(axum::middleware::from_fn_with_state(
            middleware_state,
            require_session::<R>,
        ));

    Router::new()
        .route("/login", post(handlers::login::<R>))
        .route("/mfa/verify", post(handlers::mfa_verify::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .route("/session", get(handlers::session_status::<R>))
        .merge(protected)
        .with_state(state)
}

/// Wrap `router` with session enforcement backed by `repo`.
///
/// Used by the composition root to guard the peer-administration routes.
pub fn with_session_guard(router: Router, repo: PgAuthRepository, config: AuthConfig) -> Router {
    let state = AuthMiddlewareState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };

    router.layer(axum::middleware::from_fn_with_state(
        state,
        require_session::<PgAuthRepository>,
    ))
}
