// Service error taxonomy
//
// Client input errors carry a field-specific message. Backend errors keep the
// full `anyhow` chain for the log and expose only a fixed generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::server::ApiResponse;

pub const MSG_LOAD_FAILED: &str = "Error loading model";
pub const MSG_ANALYSIS_FAILED: &str = "Error processing object";

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Required JSON field absent, empty, or body not parseable
    #[error("Missing or empty parameter: \"{0}\"")]
    MissingParameter(&'static str),

    /// Analysis requested before any model was loaded
    #[error("No model loaded")]
    ModelNotLoaded,

    /// Download, quantization or model construction failed
    #[error("Error loading model")]
    ModelLoad(anyhow::Error),

    /// A generation turn failed
    #[error("Error processing object")]
    Analysis(anyhow::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ServiceError::ModelNotLoaded
            | ServiceError::ModelLoad(_)
            | ServiceError::Analysis(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text returned to the caller
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::ModelNotLoaded => MSG_ANALYSIS_FAILED.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match &self {
            ServiceError::MissingParameter(field) => {
                tracing::warn!("Rejected request: missing or empty \"{}\"", field);
            }
            ServiceError::ModelNotLoaded => {
                tracing::error!("Analysis requested but no model is loaded; call /load first");
            }
            ServiceError::ModelLoad(e) => {
                tracing::error!("Failed to load model: {:?}", e);
            }
            ServiceError::Analysis(e) => {
                tracing::error!("Failed to analyse object: {:?}", e);
            }
        }

        let body = ApiResponse::failure(self.public_message());
        (self.status_code(), Json(body)).into_response()
    }
}
