use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use super::{AppState, Status, success};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigureRequest {
    #[serde(default)]
    interface: String,
    #[serde(default)]
    ssid: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    autoconnect: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct Configured {
    uuid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpRequest {
    uuid: String,
}

pub(crate) async fn configure_ap(
    State(state): State<AppState>,
    payload: Result<Json<ConfigureRequest>, JsonRejection>,
) -> Result<Json<Configured>, ApiError> {
    let Json(req) = payload?;
    let (ssid, password) = state.defaults.fill(&req.ssid, &req.password);
    tracing::info!(interface = %req.interface, ssid, "configuring access point");

    let uuid = state
        .network
        .configure_ap(ssid, password, req.autoconnect)
        .await?;
    tracing::info!(interface = %req.interface, %uuid, "access point configured");
    Ok(Json(Configured { uuid }))
}

pub(crate) async fn configure_sta(
    State(state): State<AppState>,
    payload: Result<Json<ConfigureRequest>, JsonRejection>,
) -> Result<Json<Configured>, ApiError> {
    let Json(req) = payload?;
    let (ssid, password) = state.defaults.fill(&req.ssid, &req.password);
    tracing::info!(interface = %req.interface, ssid, "configuring station");

    let uuid = state
        .network
        .configure_sta(ssid, password, req.autoconnect)
        .await?;
    Ok(Json(Configured { uuid }))
}

pub(crate) async fn up(
    State(state): State<AppState>,
    Path(interface): Path<String>,
    payload: Result<Json<UpRequest>, JsonRejection>,
) -> Result<Json<Status>, ApiError> {
    let Json(req) = payload?;
    if req.uuid.is_empty() {
        return Err(ApiError::Validation("uuid is required".into()));
    }

    tracing::info!(%interface, uuid = %req.uuid, "bringing up connection");
    state.network.up(&interface, &req.uuid).await?;
    tracing::info!(%interface, "connection activated");
    Ok(success())
}

pub(crate) async fn down(
    State(state): State<AppState>,
    Path(interface): Path<String>,
) -> Result<Json<Status>, ApiError> {
    state.network.down(&interface).await?;
    Ok(success())
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<Status>, ApiError> {
    state.network.remove(&uuid).await?;
    Ok(success())
}
