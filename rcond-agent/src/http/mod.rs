//! The token-gated HTTP API.
//!
//! Every route except `GET /health` sits behind [`require_token`], which
//! compares the `X-API-Token` header against the configured token before
//! the handler runs.

mod cluster;
mod network;
mod system;
mod users;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use rcond::{NetworkManager, WifiCredentials};
use serde::Serialize;

use crate::cluster::ClusterAgent;
use crate::error::ApiError;
use crate::system::SystemControl;
use crate::users::AuthorizedKeys;

/// Header carrying the API token.
pub const TOKEN_HEADER: &str = "X-API-Token";

/// Shared handler state. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub network: NetworkManager,
    pub system: Arc<dyn SystemControl>,
    pub keys: Arc<AuthorizedKeys>,
    /// `None` when clustering is disabled.
    pub cluster: Option<Arc<dyn ClusterAgent>>,
    pub defaults: WifiCredentials,
    pub api_token: Arc<str>,
}

impl AppState {
    fn cluster(&self) -> Result<&Arc<dyn ClusterAgent>, ApiError> {
        self.cluster
            .as_ref()
            .ok_or(ApiError::Unavailable("cluster agent is not initialized"))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Status {
    status: &'static str,
}

pub(crate) fn success() -> Json<Status> {
    Json(Status { status: "success" })
}

async fn health() -> Json<Status> {
    Json(Status { status: "healthy" })
}

/// Rejects requests whose token does not match byte for byte.
async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(TOKEN_HEADER)
        .map(|value| value.as_bytes());

    if presented != Some(state.api_token.as_bytes()) {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "rejected request with missing or invalid token"
        );
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// Builds the full router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/network/ap", post(network::configure_ap))
        .route("/network/sta", post(network::configure_sta))
        .route(
            "/network/interface/{interface}",
            put(network::up).delete(network::down),
        )
        .route("/network/connection/{uuid}", delete(network::remove))
        .route(
            "/hostname",
            get(system::get_hostname).post(system::set_hostname),
        )
        .route("/users/{user}/keys", post(users::add_key))
        .route("/users/{user}/keys/{key}", delete(users::remove_key))
        .route("/system/file", post(system::store_file))
        .route("/system/restart", post(system::restart))
        .route("/system/shutdown", post(system::shutdown))
        .route("/cluster/members", get(cluster::members))
        .route("/cluster/join", post(cluster::join))
        .route("/cluster/leave", post(cluster::leave))
        .route("/cluster/event", post(cluster::event))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .route("/health", get(health))
        .with_state(state)
}
