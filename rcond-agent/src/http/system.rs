use std::path::PathBuf;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::{AppState, Status, success};
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Hostname {
    hostname: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileUpload {
    path: PathBuf,
    /// Base64 encoded file content.
    content: String,
}

pub(crate) async fn get_hostname(
    State(state): State<AppState>,
) -> Result<Json<Hostname>, ApiError> {
    let hostname = state.system.hostname().await?;
    Ok(Json(Hostname { hostname }))
}

pub(crate) async fn set_hostname(
    State(state): State<AppState>,
    payload: Result<Json<Hostname>, JsonRejection>,
) -> Result<Json<Status>, ApiError> {
    let Json(req) = payload?;
    state.system.set_hostname(&req.hostname).await?;
    Ok(success())
}

pub(crate) async fn store_file(
    payload: Result<Json<FileUpload>, JsonRejection>,
) -> Result<Json<Status>, ApiError> {
    let Json(upload) = payload?;
    if !upload.path.is_absolute() {
        return Err(ApiError::Validation("path must be absolute".into()));
    }
    let content = STANDARD
        .decode(upload.content.as_bytes())
        .map_err(|e| ApiError::Validation(format!("content is not base64: {e}")))?;

    crate::system::store_file(&upload.path, &content).await?;
    Ok(success())
}

pub(crate) async fn restart(State(state): State<AppState>) -> Result<Json<Status>, ApiError> {
    state.system.restart().await?;
    Ok(success())
}

pub(crate) async fn shutdown(State(state): State<AppState>) -> Result<Json<Status>, ApiError> {
    state.system.shutdown().await?;
    Ok(success())
}
