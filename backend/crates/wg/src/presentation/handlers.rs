//! HTTP Handlers
//!
//! All three operations mutate or expose network state, so every handler
//! runs behind the session-enforcement layer and additionally requires
//! the superadmin flag (checked inside the use cases).

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use kernel::id::PeerId;
use kernel::principal::Principal;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::config::WgConfig;
use crate::application::{CreatePeerInput, CreatePeerUseCase, DeletePeerUseCase, ListPeersUseCase};
use crate::domain::repository::{PeerControl, PeerRepository, SiteRepository};
use crate::error::WgResult;
use crate::presentation::dto::{CreatePeerRequest, PeerResponse};

/// Bound required of the repository behind the peer handlers
pub trait WgStore: SiteRepository + PeerRepository + Clone + Send + Sync + 'static {}
impl<T> WgStore for T where T: SiteRepository + PeerRepository + Clone + Send + Sync + 'static {}

/// Bound required of the control surface behind the peer handlers
pub trait WgControlSurface: PeerControl + Clone + Send + Sync + 'static {}
impl<T> WgControlSurface for T where T: PeerControl + Clone + Send + Sync + 'static {}

/// Shared state for peer handlers
#[derive(Clone)]
pub struct WgAppState<R: WgStore, C: WgControlSurface> {
    pub repo: Arc<R>,
    pub control: Arc<C>,
    pub config: Arc<WgConfig>,
}

/// GET /api/peers
pub async fn list_peers<R: WgStore, C: WgControlSurface>(
    State(state): State<WgAppState<R, C>>,
    axum::Extension(principal): axum::Extension<Principal>,
) -> WgResult<Json<Vec<PeerResponse>>> {
    let use_case = ListPeersUseCase::new(state.repo.clone(), state.control.clone());

    let views = use_case.execute(&principal).await?;

    Ok(Json(views.into_iter().map(PeerResponse::from).collect()))
}

/// POST /api/peers
pub async fn create_peer<R: WgStore, C: WgControlSurface>(
    State(state): State<WgAppState<R, C>>,
    axum::Extension(principal): axum::Extension<Principal>,
    Json(req): Json<CreatePeerRequest>,
) -> WgResult<(StatusCode, Json<PeerResponse>)> {
    let use_case = CreatePeerUseCase::new(
        state.repo.clone(),
        state.control.clone(),
        state.config.clone(),
    );

    let input = CreatePeerInput {
        label: req.label,
        allowed_ips: req.allowed_ips,
        keepalive: req.keepalive,
    };

    let peer = use_case.execute(&principal, input).await?;

    let response = PeerResponse {
        id: *peer.peer_id.as_uuid(),
        label: peer.label,
        public_key: peer.public_key,
        address_cidr: peer.address_cidr,
        allowed_ips: peer.allowed_ips,
        keepalive: peer.persistent_keepalive_s,
        enabled: peer.enabled,
        owner: None,
        live: None,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// DELETE /api/peers/{id}
pub async fn delete_peer<R: WgStore, C: WgControlSurface>(
    State(state): State<WgAppState<R, C>>,
    axum::Extension(principal): axum::Extension<Principal>,
    Path(peer_id): Path<Uuid>,
) -> WgResult<StatusCode> {
    let use_case = DeletePeerUseCase::new(state.repo.clone(), state.control.clone());

    use_case
        .execute(&principal, &PeerId::from_uuid(peer_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
