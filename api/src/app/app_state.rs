use std::time::Duration;

use rag_engine::{AppConfig, Pipeline};

/// Shared state for all HTTP handlers. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    /// Deadline applied to every request's pipeline call.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(pipeline: Pipeline, request_timeout: Duration) -> Self {
        Self {
            pipeline,
            request_timeout,
        }
    }

    pub fn from_config(cfg: &AppConfig, pipeline: Pipeline) -> Self {
        Self::new(pipeline, cfg.request_timeout)
    }
}
