use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::search::EutilsError;

/// Failure of a gateway request, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Eutils(#[from] EutilsError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // Upstream status passes through so clients can tell a quota hit
            // (429) from a genuine server fault.
            GatewayError::Eutils(EutilsError::Status { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Eutils(EutilsError::Request { .. }) => StatusCode::BAD_GATEWAY,
            GatewayError::Eutils(EutilsError::Parse { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Gateway request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
