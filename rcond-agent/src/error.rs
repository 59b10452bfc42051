//! HTTP error mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rcond::ConnectionError;
use serde::Serialize;
use thiserror::Error;

use crate::cluster::ClusterError;
use crate::system::SystemError;
use crate::users::KeyError;

/// Every failure a handler can report. Rendered as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Unavailable(&'static str),

    #[error(transparent)]
    Network(#[from] ConnectionError),

    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    Keys(#[from] KeyError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::Network(ConnectionError::InvalidSpec(_))
            | Self::Keys(KeyError::InvalidKey(_) | KeyError::InvalidUser(_))
            | Self::System(SystemError::InvalidHostname(_)) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
