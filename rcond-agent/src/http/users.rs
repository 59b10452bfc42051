use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use super::{AppState, Status, success};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct AddKey {
    pubkey: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Added {
    fingerprint: String,
}

pub(crate) async fn add_key(
    State(state): State<AppState>,
    Path(user): Path<String>,
    payload: Result<Json<AddKey>, JsonRejection>,
) -> Result<Json<Added>, ApiError> {
    let Json(req) = payload?;
    let fingerprint = state.keys.add(&user, &req.pubkey).await?;
    Ok(Json(Added { fingerprint }))
}

/// `key` is the whole key line, base64url encoded without padding.
pub(crate) async fn remove_key(
    State(state): State<AppState>,
    Path((user, key)): Path<(String, String)>,
) -> Result<Json<Status>, ApiError> {
    let line = URL_SAFE_NO_PAD
        .decode(key.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| ApiError::Validation("key is not base64url".into()))?;

    state.keys.remove(&user, &line).await?;
    Ok(success())
}
