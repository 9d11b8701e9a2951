//! Request tracing.
//!
//! Each request runs inside an `http_request` span carrying a request id
//! (taken from `x-request-id` or generated), and its status and latency are
//! recorded in the HTTP metrics.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use splice_telemetry::{HTTP_REQUESTS, HTTP_REQUEST_DURATION};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{debug, info_span, Instrument, Span};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService { inner }
    }
}

#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Swap in the clone that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let request_id = request_id(&req);
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let span = info_span!(
            "http_request",
            request_id = %request_id,
            http.method = %method,
            http.target = %path,
            http.status_code = tracing::field::Empty,
            otel.kind = "server",
            otel.status_code = tracing::field::Empty,
        );
        if let Some(parent) = extract_trace_context(&req) {
            span.follows_from(parent);
        }

        Box::pin(
            async move {
                let started = Instant::now();
                let result = inner.call(req).await;
                let elapsed = started.elapsed();
                HTTP_REQUEST_DURATION.observe(elapsed.as_secs_f64());

                let span = Span::current();
                match result {
                    Ok(mut response) => {
                        let status = response.status();
                        span.record("http.status_code", status.as_u16());
                        span.record(
                            "otel.status_code",
                            if status.is_server_error() { "ERROR" } else { "OK" },
                        );
                        HTTP_REQUESTS
                            .with_label_values(&[method.as_str(), status.as_str()])
                            .inc();
                        if let Ok(value) = HeaderValue::from_str(&request_id) {
                            response.headers_mut().insert(REQUEST_ID_HEADER, value);
                        }
                        debug!(status = status.as_u16(), elapsed_ms = elapsed.as_millis() as u64, "request completed");
                        Ok(response)
                    }
                    Err(e) => {
                        span.record("otel.status_code", "ERROR");
                        Err(e)
                    }
                }
            }
            .instrument(span),
        )
    }
}

/// Client-supplied request id, or a fresh UUIDv4.
fn request_id<B>(req: &Request<B>) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// W3C `traceparent`: `version-trace_id-parent_id-flags`.
fn extract_trace_context<B>(req: &Request<B>) -> Option<Span> {
    let traceparent = req.headers().get("traceparent")?.to_str().ok()?;
    let parts: Vec<&str> = traceparent.split('-').collect();
    if parts.len() != 4 {
        return None;
    }

    Some(info_span!(
        "parent_trace",
        trace_id = parts[1],
        parent_span_id = parts[2]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(TracingLayer::new())
    }

    #[tokio::test]
    async fn test_generates_request_id() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_propagates_client_request_id() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");
    }

    #[tokio::test]
    async fn test_counts_requests_by_status() {
        let before = HTTP_REQUESTS.with_label_values(&["GET", "404"]).get();
        let _ = app()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(HTTP_REQUESTS.with_label_values(&["GET", "404"]).get() > before);
    }

    #[test]
    fn test_traceparent_parsing() {
        let req = Request::builder()
            .header(
                "traceparent",
                "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            )
            .body(())
            .unwrap();
        assert!(extract_trace_context(&req).is_some());

        let req = Request::builder()
            .header("traceparent", "garbage")
            .body(())
            .unwrap();
        assert!(extract_trace_context(&req).is_none());
    }
}
