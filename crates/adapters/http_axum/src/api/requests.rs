//! JSON REST handlers for submitting and withdrawing requests.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use homerc_app::Arbitration;
use homerc_app::ports::DriveOutcome;
use homerc_domain::request::{DEFAULT_GID, Request};
use homerc_domain::time::Timestamp;
use homerc_domain::value::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for submitting a request in textual form.
#[derive(Deserialize)]
pub struct SetRequestBody {
    pub request: String,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub gid: Option<String>,
}

/// JSON view of an [`Arbitration`].
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ArbitrationBody {
    Idle,
    Unchanged,
    Realized,
    Reported { value: Value },
    Busy,
    Failed,
    Silent,
    Deferred { until: Timestamp },
    Queued,
}

impl From<Arbitration> for ArbitrationBody {
    fn from(arbitration: Arbitration) -> Self {
        match arbitration {
            Arbitration::Idle => Self::Idle,
            Arbitration::Unchanged => Self::Unchanged,
            Arbitration::Driven(DriveOutcome::Realized) => Self::Realized,
            Arbitration::Driven(DriveOutcome::Reported(value)) => Self::Reported { value },
            Arbitration::Driven(DriveOutcome::Busy) => Self::Busy,
            Arbitration::Driven(DriveOutcome::Failed) => Self::Failed,
            Arbitration::Driven(DriveOutcome::Silent) => Self::Silent,
            Arbitration::Deferred { until } => Self::Deferred { until },
            Arbitration::Queued => Self::Queued,
        }
    }
}

/// `PUT /api/requests/{host}/{driver}/{*lid}`
pub async fn set(
    State(state): State<AppState>,
    Path(segments): Path<(String, String, String)>,
    Json(body): Json<SetRequestBody>,
) -> Result<Json<ArbitrationBody>, ApiError> {
    let uri = super::resource_uri(segments)?;
    let request = Request::parse(&body.request, state.directory.now())?;
    let outcome = state.directory.set_request(&uri, request)?;
    Ok(Json(outcome.into()))
}

/// `DELETE /api/requests/{host}/{driver}/{*lid}[?gid=…]`
pub async fn delete(
    State(state): State<AppState>,
    Path(segments): Path<(String, String, String)>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ArbitrationBody>, ApiError> {
    let uri = super::resource_uri(segments)?;
    let gid = query.gid.as_deref().unwrap_or(DEFAULT_GID);
    let outcome = state.directory.del_request(&uri, gid)?;
    Ok(Json(outcome.into()))
}
