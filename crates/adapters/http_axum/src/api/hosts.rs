//! JSON REST handlers for hosts.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use homerc_domain::error::RcError;
use homerc_domain::host::HostEntry;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for changing a host's reachability.
#[derive(Deserialize)]
pub struct ReachabilityRequest {
    pub reachable: bool,
}

/// `GET /api/hosts`
pub async fn list(State(state): State<AppState>) -> Json<Vec<HostEntry>> {
    Json(state.directory.hosts())
}

/// `GET /api/hosts/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HostEntry>, ApiError> {
    let host = state
        .directory
        .host(&id)
        .ok_or(RcError::UnknownHost { id })?;
    Ok(Json(host))
}

/// `PUT /api/hosts/{id}/reachability`
pub async fn set_reachability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReachabilityRequest>,
) -> Result<Json<HostEntry>, ApiError> {
    state.directory.set_reachable(&id, req.reachable)?;
    let host = state
        .directory
        .host(&id)
        .ok_or(RcError::UnknownHost { id })?;
    Ok(Json(host))
}
