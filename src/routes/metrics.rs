use crate::{model_service::ModelService, server::SharedState};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct MetricsReport {
    pub status: String,
    pub request_count_total: u64,
    pub latency_seconds_sum: f64,
    pub latency_seconds_avg: f64,
    pub request_count_breakdown: BTreeMap<String, u64>,
}

pub async fn metrics_handler<M: ModelService>(
    State(state): State<SharedState<M>>,
) -> impl IntoResponse {
    let snapshot = state.metrics.snapshot();

    Json(MetricsReport {
        status: "up".into(),
        request_count_total: snapshot.total,
        latency_seconds_sum: snapshot.latency_sum,
        latency_seconds_avg: snapshot.latency_avg,
        request_count_breakdown: snapshot.breakdown,
    })
}

pub async fn prometheus_handler<M: ModelService>(State(state): State<SharedState<M>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
