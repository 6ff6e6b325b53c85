use crate::{model_service::ModelService, server::SharedState};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
}

pub async fn healthcheck<M: ModelService>(State(state): State<SharedState<M>>) -> impl IntoResponse {
    Json(HealthStatus {
        status: "healthy".into(),
        model_loaded: state.inference_engine.is_some(),
    })
}
