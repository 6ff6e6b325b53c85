mod ort_service;
mod preprocessing;
mod routes;

pub mod app;
pub mod config;
pub mod inference_service;
pub mod model_service;
pub mod server;
pub mod telemetry;

pub use app::start_app;
pub use inference_service::{classify, InferenceEngine, Label, Prediction};
pub use model_service::{InferenceError, ModelLoadError, ModelService};
pub use ort_service::OrtModelService;
pub use preprocessing::{transform_image, DecodeError};
pub use routes::{ErrorResponse, HealthStatus, MetricsReport, PredictError};
pub use server::{build_router, HttpServer, SharedState};
pub use telemetry::{Metrics, MetricsSnapshot};
