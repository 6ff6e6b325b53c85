use crate::{
    config::Config,
    inference_service::InferenceEngine,
    ort_service::OrtModelService,
    server::{HttpServer, SharedState},
    telemetry::Metrics,
};
use std::sync::Arc;
use tokio::signal;

/// Loads the model if the artifact is usable; otherwise the service runs
/// without one and `/predict` answers with a "not loaded" payload.
pub fn load_inference_engine(config: &Config) -> Option<InferenceEngine<OrtModelService>> {
    match OrtModelService::new(&config.model) {
        Ok(model_service) => {
            tracing::info!("Model loaded from {:?}", config.model.get_path());
            Some(InferenceEngine::new(model_service))
        }
        Err(e) => {
            tracing::warn!("Model not loaded, starting in degraded mode: {}", e);
            None
        }
    }
}

pub async fn start_app(config: Config) -> anyhow::Result<()> {
    let inference_engine = load_inference_engine(&config);
    let metrics = Arc::new(Metrics::new(&config.metrics)?);
    let state = SharedState::new(inference_engine, metrics);

    let server = HttpServer::new(state, &config.server).await?;
    tracing::info!("Listening on {}", config.server.get_address());

    server
        .run(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown");
        })
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, MetricsConfig, ModelConfig, ServerConfig};
    use std::path::Path;

    fn config_for(model_dir: &Path) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                max_upload_bytes: 1024,
            },
            log_level: LogLevel::Info,
            model: ModelConfig {
                model_dir: model_dir.to_path_buf(),
                model_file: "model.onnx".into(),
                num_instances: 1,
            },
            metrics: MetricsConfig::default(),
        }
    }

    #[test]
    fn test_missing_artifact_starts_degraded() {
        let dir = tempfile::tempdir().unwrap();

        assert!(load_inference_engine(&config_for(dir.path())).is_none());
    }

    #[test]
    fn test_corrupt_artifact_starts_degraded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"not an onnx graph").unwrap();

        assert!(load_inference_engine(&config_for(dir.path())).is_none());
    }
}
