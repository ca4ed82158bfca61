//! Web layer for inbound webhooks.
//!
//! This module provides:
//! - The dispatch pipeline that parses, verifies and hands off one payload
//! - Route registration binding pipelines to paths on an axum `Router`
//! - The health check endpoint

pub mod pipeline;
pub mod routes;

pub use pipeline::{
    PipelineConfig, WebhookHandler, WebhookOutcome, WebhookPipeline, DEFAULT_MAX_BODY_BYTES,
};
pub use routes::{build_router, health, HealthResponse, WebhookRouterExt};
