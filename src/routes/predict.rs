use crate::{
    inference_service::Prediction,
    model_service::{InferenceError, ModelService},
    server::SharedState,
};
use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

pub const MODEL_NOT_LOADED: &str = "Model not loaded";
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Missing multipart field `file`")]
    MissingFile,
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("Inference task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = match &self {
            PredictError::Multipart(err) => err.status(),
            PredictError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            PredictError::Inference(InferenceError::Decode(_)) => StatusCode::BAD_REQUEST,
            PredictError::Inference(_) | PredictError::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!("Prediction failed: {}", self);
        } else {
            tracing::warn!("Rejected prediction request: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[instrument(skip(state, multipart))]
pub async fn predict<M: ModelService>(
    State(state): State<SharedState<M>>,
    mut multipart: Multipart,
) -> Result<Response, PredictError> {
    let Some(inference_engine) = state.inference_engine.clone() else {
        return Ok(Json(ErrorResponse {
            error: MODEL_NOT_LOADED.into(),
        })
        .into_response());
    };

    let image_data = loop {
        match multipart.next_field().await? {
            Some(field) if field.name() == Some(FILE_FIELD) => break field.bytes().await?,
            Some(_) => continue,
            None => return Err(PredictError::MissingFile),
        }
    };

    let prediction: Prediction =
        tokio::task::spawn_blocking(move || inference_engine.predict(&image_data)).await??;
    tracing::info!(
        "Prediction result: {} ({:.2})",
        prediction.label.as_str(),
        prediction.confidence
    );

    Ok(Json(prediction).into_response())
}
