//! Peer Administration Router
//!
//! The composition root wraps this router with the auth crate's session
//! guard; the superadmin check happens per-operation in the use cases.

use axum::{
    Router,
    routing::{delete, get},
};
use std::sync::Arc;

use crate::application::config::WgConfig;
use crate::infra::control::WgControl;
use crate::infra::postgres::PgWgRepository;
use crate::presentation::handlers::{self, WgAppState, WgControlSurface, WgStore};

/// Create the peer-administration router with the live control surface
pub fn wg_router(repo: PgWgRepository, config: WgConfig) -> Router {
    let config = Arc::new(config);
    let control = WgControl::new(config.clone());
    wg_router_generic(repo, control, config)
}

/// Create a generic router for any repository/control implementation
pub fn wg_router_generic<R: WgStore, C: WgControlSurface>(
    repo: R,
    control: C,
    config: Arc<WgConfig>,
) -> Router {
    let state = WgAppState {
        repo: Arc::new(repo),
        control: Arc::new(control),
        config,
    };

    Router::new()
        .route(
            "/",
            get(handlers::list_peers::<R, C>).post(handlers::create_peer::<R, C>),
        )
        .route("/{id}", delete(handlers::delete_peer::<R, C>))
        .with_state(state)
}
