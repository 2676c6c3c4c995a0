// Route handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::types::{
    AnalysisRequest, ApiResponse, LoadRequest, MSG_INDEX, MSG_MODEL_LOADED, MSG_SUCCESS,
};
use super::AppState;
use crate::errors::ServiceError;

/// `GET /` - liveness
pub async fn index() -> Json<ApiResponse> {
    Json(ApiResponse::success(MSG_INDEX))
}

/// `GET /status` - health
pub async fn status() -> Json<ApiResponse> {
    Json(ApiResponse::success(MSG_SUCCESS))
}

/// `POST /load` - replace the local model (local backend only)
pub async fn load_model(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoadRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, ServiceError> {
    let model_id = required_field(body.ok().and_then(|Json(b)| b.model), "model")?;

    let (handle, loader) = state
        .local_backend()
        .ok_or_else(|| ServiceError::ModelLoad(anyhow::anyhow!("backend does not load models")))?;

    handle
        .load_with(loader, &model_id)
        .await
        .map_err(ServiceError::ModelLoad)?;

    tracing::info!("Model and tokenizer loaded: {}", model_id);
    Ok(Json(ApiResponse::success(MSG_MODEL_LOADED)))
}

/// `POST /object_analysis` - classify and justify an objeto's readability
pub async fn object_analysis(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, ServiceError> {
    let objeto = required_field(body.ok().and_then(|Json(b)| b.objeto), "objeto")?;

    let span = tracing::info_span!("object_analysis", request_id = %Uuid::new_v4());
    async move {
        let llm = state.current_llm().await?;
        tracing::info!(
            backend = llm.name(),
            chars = objeto.chars().count(),
            "Checking object readability"
        );

        let result = state
            .analyzer()
            .analyze(llm.as_ref(), &objeto)
            .await
            .map_err(ServiceError::Analysis)?;

        tracing::info!(clf_legibilidade = %result.clf_legibilidade.trim(), "Analysis complete");
        Ok::<_, ServiceError>(Json(ApiResponse::success(MSG_SUCCESS).with_output(result)))
    }
    .instrument(span)
    .await
}

/// Present and non-empty, or a 400
fn required_field(value: Option<String>, field: &'static str) -> Result<String, ServiceError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ServiceError::MissingParameter(field)),
    }
}
