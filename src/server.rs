use crate::{
    config::ServerConfig, inference_service::InferenceEngine, model_service::ModelService,
    routes::api_routes, telemetry::Metrics,
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::{future::Future, sync::Arc, time::Instant};
use tokio::net::TcpListener;

pub struct SharedState<M: ModelService> {
    pub inference_engine: Option<Arc<InferenceEngine<M>>>,
    pub metrics: Arc<Metrics>,
}

impl<M: ModelService> Clone for SharedState<M> {
    fn clone(&self) -> Self {
        Self {
            inference_engine: self.inference_engine.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<M: ModelService> SharedState<M> {
    pub fn new(inference_engine: Option<InferenceEngine<M>>, metrics: Arc<Metrics>) -> Self {
        Self {
            inference_engine: inference_engine.map(Arc::new),
            metrics,
        }
    }
}

/// Times the routed handler and records the request once the response exists.
async fn track_requests<M: ModelService>(
    State(state): State<SharedState<M>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    state.metrics.record(&path, elapsed);
    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_s = elapsed,
        "request completed"
    );

    response
}

pub fn build_router<M: ModelService>(state: SharedState<M>, max_upload_bytes: usize) -> Router {
    api_routes::<M>()
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_requests::<M>,
        ))
        .with_state(state)
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<M: ModelService>(
        state: SharedState<M>,
        server_config: &ServerConfig,
    ) -> anyhow::Result<Self> {
        let addr = server_config.get_address();
        let router = build_router(state, server_config.max_upload_bytes);
        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        tracing::info!("Starting app on {}", self.listener.local_addr()?);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
