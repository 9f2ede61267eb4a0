//! Per-request spans.

use axum::http::Request;
use tower_http::trace::{
    DefaultOnRequest, DefaultOnResponse, HttpMakeClassifier, MakeSpan, TraceLayer,
};
use tower_http::LatencyUnit;
use tracing::{info_span, Level, Span};
use uuid::Uuid;

/// Opens a `request` span tagged with method, path and a fresh correlation id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let correlation_id = Uuid::new_v4();
        info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            correlation_id = %correlation_id,
        )
    }
}

/// HTTP trace layer logging status and latency when each response is produced.
pub fn trace_layer(
) -> TraceLayer<HttpMakeClassifier, RequestSpan, DefaultOnRequest, DefaultOnResponse> {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
