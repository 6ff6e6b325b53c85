mod health;
mod metrics;
mod predict;

use crate::{model_service::ModelService, server::SharedState};
use axum::{
    routing::{get, post},
    Router,
};

pub use health::HealthStatus;
pub use metrics::MetricsReport;
pub use predict::{ErrorResponse, PredictError};

pub fn api_routes<M: ModelService>() -> Router<SharedState<M>> {
    Router::new()
        .route("/health", get(health::healthcheck::<M>))
        .route("/metrics", get(metrics::metrics_handler::<M>))
        .route("/metrics/prometheus", get(metrics::prometheus_handler::<M>))
        .route("/predict", post(predict::predict::<M>))
}
