use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use super::{AppState, Status, success};
use crate::cluster::{ClusterEvent, ClusterEventKind, Member};
use crate::config::split_addresses;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct JoinRequest {
    #[serde(default)]
    join: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Joined {
    joined: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventRequest {
    name: String,
    #[serde(default)]
    payload: String,
}

pub(crate) async fn members(State(state): State<AppState>) -> Result<Json<Vec<Member>>, ApiError> {
    let members = state.cluster()?.members().await?;
    Ok(Json(members))
}

pub(crate) async fn join(
    State(state): State<AppState>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<Joined>, ApiError> {
    let agent = state.cluster()?;
    let Json(req) = payload?;

    let addrs = split_addresses(&req.join);
    if addrs.is_empty() {
        return Err(ApiError::Validation("no join addresses provided".into()));
    }
    let joined = agent.join(&addrs).await?;
    Ok(Json(Joined { joined }))
}

pub(crate) async fn leave(State(state): State<AppState>) -> Result<Json<Status>, ApiError> {
    state.cluster()?.leave().await?;
    Ok(success())
}

pub(crate) async fn event(
    State(state): State<AppState>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<Status>, ApiError> {
    let agent = state.cluster()?;
    let Json(req) = payload?;

    let kind: ClusterEventKind = req
        .name
        .parse()
        .map_err(|e: crate::cluster::ClusterError| ApiError::Validation(e.to_string()))?;
    agent
        .event(ClusterEvent {
            kind,
            payload: req.payload.into_bytes(),
        })
        .await?;
    Ok(success())
}
