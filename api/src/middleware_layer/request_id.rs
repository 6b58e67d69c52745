use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{Instrument, info, info_span};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn incoming_id(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn new_request_id() -> String {
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    format!("req-{nanos}")
}

/// Runs the request inside a span tagged with its id and echoes the id back.
pub async fn request_id(req: Request<Body>, next: Next) -> Response {
    let id = incoming_id(&req).unwrap_or_else(new_request_id);
    let span = info_span!(
        "request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path()
    );
    let started = Instant::now();

    let mut res = next.run(req).instrument(span.clone()).await;

    if let Ok(v) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, v);
    }
    span.in_scope(|| {
        info!(
            status = res.status().as_u16(),
            latency_ms = started.elapsed().as_millis(),
            "request finished"
        )
    });
    res
}
