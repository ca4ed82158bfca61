//! Route registration for webhook pipelines.
//!
//! Each bound path gets its own pipeline and its own [`PipelineConfig`]. The
//! route accepts any method; the pipeline decides between query and body
//! decoding.
//!
//! [`PipelineConfig`]: crate::web::pipeline::PipelineConfig

use std::sync::Arc;

use axum::{
    extract::Request,
    handler::Handler,
    http::StatusCode,
    middleware::{self, Next},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;

use crate::config::{Config, HEALTH_PATH};
use crate::payload::{DeliveryReceipt, InboundSms, WebhookPayload};
use crate::web::pipeline::{WebhookHandler, WebhookPipeline};

/// Binds webhook pipelines onto an axum [`Router`].
pub trait WebhookRouterExt<S> {
    /// Bind `pipeline` at `path`. The chain ends after the pipeline.
    fn webhook<P: WebhookPayload>(self, path: &str, pipeline: WebhookPipeline<P>) -> Self;

    /// Bind `pipeline` at `path` with `next` as the following stage.
    ///
    /// `next` only runs when the pipeline's config has `invoke_next` set.
    fn webhook_then<P, H, T>(self, path: &str, pipeline: WebhookPipeline<P>, next: H) -> Self
    where
        P: WebhookPayload,
        H: Handler<T, S>,
        T: 'static;
}

impl<S> WebhookRouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn webhook<P: WebhookPayload>(self, path: &str, pipeline: WebhookPipeline<P>) -> Self {
        self.webhook_then(path, pipeline, end_of_chain)
    }

    fn webhook_then<P, H, T>(self, path: &str, pipeline: WebhookPipeline<P>, next: H) -> Self
    where
        P: WebhookPayload,
        H: Handler<T, S>,
        T: 'static,
    {
        let pipeline = Arc::new(pipeline);
        let stage = middleware::from_fn(move |request: Request, chain: Next| {
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.handle(request, chain).await }
        });

        self.route(path, any(next).layer(stage))
    }
}

/// Continuation used when a route has no further stage.
async fn end_of_chain() -> StatusCode {
    StatusCode::NO_CONTENT
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Application Router
// =============================================================================

/// Build the service router: health check, inbound SMS (signature-capable)
/// and delivery receipts (unverified), both on the paths from `config`.
pub fn build_router<A, B>(config: &Config, on_sms: A, on_receipt: B) -> Router
where
    A: WebhookHandler<InboundSms>,
    B: WebhookHandler<DeliveryReceipt>,
{
    let pipeline_config = config.pipeline_config();

    Router::new()
        .route(HEALTH_PATH, get(health))
        .webhook(
            &config.inbound_sms_path,
            WebhookPipeline::signed(on_sms, pipeline_config.clone()),
        )
        .webhook(
            &config.delivery_receipt_path,
            WebhookPipeline::new(on_receipt, pipeline_config),
        )
}
