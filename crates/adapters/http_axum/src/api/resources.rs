//! JSON REST handlers for resources and garbage collection.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use homerc_app::{GcReport, ResourceDetail};
use homerc_domain::id::ResourceId;
use homerc_domain::pattern::UriPattern;
use homerc_domain::uri::ResourceUri;
use homerc_domain::value::ValueType;
use homerc_domain::value_state::ValueState;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the list endpoint: a comma-separated pattern list.
#[derive(Deserialize)]
pub struct ListQuery {
    pub pattern: Option<String>,
}

/// JSON view of a resource.
#[derive(Debug, Serialize)]
pub struct ResourceBody {
    pub id: ResourceId,
    pub uri: ResourceUri,
    pub value_type: ValueType,
    pub writable: bool,
    pub reachable: bool,
    pub value_state: ValueState,
    /// Value-state rendered for the resource's type, e.g. `"21.5 °C"`.
    pub display: String,
    /// Requests in textual form, winner candidates first.
    pub requests: Vec<String>,
}

impl From<ResourceDetail> for ResourceBody {
    fn from(detail: ResourceDetail) -> Self {
        Self {
            display: detail.value_state.display_as(detail.value_type),
            requests: detail.requests.iter().map(ToString::to_string).collect(),
            id: detail.id,
            uri: detail.uri,
            value_type: detail.value_type,
            writable: detail.writable,
            reachable: detail.reachable,
            value_state: detail.value_state,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GcBody {
    pub resources: usize,
    pub purged: usize,
    pub reevaluated: usize,
}

impl From<GcReport> for GcBody {
    fn from(report: GcReport) -> Self {
        Self {
            resources: report.resources,
            purged: report.purged,
            reevaluated: report.reevaluated,
        }
    }
}

/// `GET /api/resources[?pattern=…]`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ResourceBody>>, ApiError> {
    let patterns = match query.pattern.as_deref() {
        Some(text) if !text.trim().is_empty() => UriPattern::parse_list(text)?,
        _ => Vec::new(),
    };
    let resources = state
        .directory
        .list_resources(&patterns)
        .into_iter()
        .map(ResourceBody::from)
        .collect();
    Ok(Json(resources))
}

/// `GET /api/resources/{host}/{driver}/{*lid}`
pub async fn get(
    State(state): State<AppState>,
    Path(segments): Path<(String, String, String)>,
) -> Result<Json<ResourceBody>, ApiError> {
    let uri = super::resource_uri(segments)?;
    let detail = state.directory.resource_detail(&uri)?;
    Ok(Json(detail.into()))
}

/// `POST /api/gc`
pub async fn collect(State(state): State<AppState>) -> Json<GcBody> {
    Json(state.directory.garbage_collection().into())
}
