use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use contracts::{BulkInserter, DataBatch, MessagePublisher};
use tracing::{error, instrument, warn};

use crate::error::{ApiError, Result};
use crate::types::{ProcessResponse, RootResponse};
use crate::ApiState;

/// Handler for `GET /`.
pub async fn root_handler<P, I>(State(state): State<ApiState<P, I>>) -> Json<RootResponse>
where
    P: MessagePublisher + Send + Sync + 'static,
    I: BulkInserter + Send + Sync + 'static,
{
    Json(RootResponse::for_project(&state.project_id))
}

/// Handler for `POST /pipeline/process`.
#[instrument(name = "http_process", skip_all)]
pub async fn process_handler<P, I>(
    State(state): State<ApiState<P, I>>,
    payload: std::result::Result<Json<DataBatch>, JsonRejection>,
) -> Result<Json<ProcessResponse>>
where
    P: MessagePublisher + Send + Sync + 'static,
    I: BulkInserter + Send + Sync + 'static,
{
    let Json(batch) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected request body");
        ApiError::from(rejection)
    })?;

    match state.coordinator.process(&batch).await {
        Ok(result) => Ok(Json(result.into())),
        Err(err) => {
            let err = ApiError::from(err);
            if err.status_code().is_server_error() {
                error!(error = %err, "Batch processing failed");
            }
            Err(err)
        }
    }
}
