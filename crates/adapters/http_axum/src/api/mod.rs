//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod hosts;
#[allow(clippy::missing_errors_doc)]
pub mod requests;
#[allow(clippy::missing_errors_doc)]
pub mod resources;
pub mod sse;

use axum::Router;
use axum::routing::{get, post, put};

use homerc_domain::error::RcError;
use homerc_domain::uri::ResourceUri;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Hosts
        .route("/hosts", get(hosts::list))
        .route("/hosts/{id}", get(hosts::get))
        .route("/hosts/{id}/reachability", put(hosts::set_reachability))
        // Resources
        .route("/resources", get(resources::list))
        .route("/resources/{host}/{driver}/{*lid}", get(resources::get))
        // Requests
        .route(
            "/requests/{host}/{driver}/{*lid}",
            put(requests::set).delete(requests::delete),
        )
        .route("/gc", post(resources::collect))
        // Events
        .route("/events/stream", get(sse::stream))
}

/// Rebuild a resource URI from the `{host}/{driver}/{*lid}` path segments.
fn resource_uri((host, driver, lid): (String, String, String)) -> Result<ResourceUri, RcError> {
    Ok(ResourceUri::new(&host, &driver, &lid)?)
}
