//! HTTP job trigger for bulk record generation.
//!
//! [`BatchService`] owns the store [`Backend`], the identifier source and the
//! batch orchestrator. `POST /api/products/batch` runs one job and only answers once
//! every admitted batch has finished.
//!
//! ## Responsibilities
//!
//! - Resolve `total` / `batchSize` against the configured defaults and limit.
//! - Run the job through [`BatchOrchestrator`].
//! - Map the outcome to `204`, or to an error status via [`ApiError`].
//! - On shutdown, stop jobs from admitting more batches.

use crate::server::{
    config::ServerConfig,
    service::{error::ApiError, store::Backend},
    telemetry::{
        increment_job_errors, increment_jobs, increment_records_written, record_job_duration,
    },
};
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    routing::post,
};
use oidbulk::{BatchOrchestrator, Error, ObjectIdGenerator};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

type Orchestrator = BatchOrchestrator<Backend, ObjectIdGenerator>;

/// Query parameters of the batch endpoint. Missing values fall back to the
/// server defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchParams {
    pub total: Option<usize>,
    pub batch_size: Option<usize>,
}

/// Shared state behind the HTTP routes.
#[derive(Clone)]
pub struct BatchService {
    config: ServerConfig,
    orchestrator: Arc<Orchestrator>,
    shutdown_token: CancellationToken,
}

impl BatchService {
    /// Creates the service writing to `store` with a freshly seeded
    /// [`ObjectIdGenerator`].
    pub fn new(config: ServerConfig, store: Backend) -> Self {
        let orchestrator = BatchOrchestrator::new(
            Arc::new(store),
            Arc::new(ObjectIdGenerator::new()),
            config.orchestrator(),
        );

        Self {
            config,
            orchestrator: Arc::new(orchestrator),
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> &Backend {
        self.orchestrator.writer()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/products/batch", post(start_batch))
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(self.clone())
    }

    /// Stops every running job from admitting further batches. Jobs drain
    /// their in-flight batches and answer `503`.
    pub fn shutdown(&self) {
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new batches");
        self.shutdown_token.cancel();
    }

    /// Resolves the request against the configured defaults and bounds.
    fn resolve(&self, params: &BatchParams) -> Result<(usize, usize), ApiError> {
        let total = params.total.unwrap_or(self.config.default_total);
        let batch_size = params.batch_size.unwrap_or(self.config.default_batch_size);

        if total > self.config.max_allowed_total {
            return Err(ApiError::invalid_request(format!(
                "total {} exceeds maximum allowed ({})",
                total, self.config.max_allowed_total
            )));
        }

        Ok((total, batch_size))
    }
}

/// Inserts all products using the batch process.
///
/// Returns `204 No Content` once every batch has been written.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
async fn start_batch(
    State(service): State<BatchService>,
    Query(params): Query<BatchParams>,
) -> Result<StatusCode, ApiError> {
    let (total, batch_size) = service.resolve(&params)?;
    let start = Instant::now();

    #[cfg(feature = "tracing")]
    tracing::info!("Starting batch insert of {} records (batch size {})", total, batch_size);

    increment_jobs();
    let outcome = service
        .orchestrator
        .run_until(total, batch_size, service.shutdown_token.child_token())
        .await;
    record_job_duration(start.elapsed().as_millis() as f64);

    match outcome {
        Ok(report) => {
            increment_records_written(report.written);
            #[cfg(feature = "tracing")]
            tracing::info!(
                "Batch insert completed: {} records in {} batches ({:.3}s) into {} collection {}",
                report.written,
                report.batches,
                report.elapsed.as_secs_f64(),
                service.store().kind(),
                service.store().collection()
            );
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            increment_job_errors();
            if let Error::JobFailed { written, .. } | Error::Interrupted { written, .. } = &err {
                increment_records_written(*written);
            }
            #[cfg(feature = "tracing")]
            tracing::error!("Batch insert failed: {}", err);
            Err(err.into())
        }
    }
}
