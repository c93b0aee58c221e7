//! HTTP middleware for the Rollcall server
//!
//! - CORS for the browser clients
//! - Request spans and latency logging with tracing

use axum::http::{header, Method};
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::CorsConfig;

/// Create CORS layer from configuration
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
            header::CONTENT_LANGUAGE,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(3600));

    // tower-http refuses credentials combined with a wildcard origin
    if config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<_> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    cors.allow_origin(origins)
        .allow_credentials(config.allow_credentials)
}

/// Create tracing/logging layer
pub fn tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Micros),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{HeaderValue, Request, Response},
    };
    use std::convert::Infallible;
    use tower::{service_fn, Layer, ServiceExt};

    fn cors(origins: &[&str], allow_credentials: bool) -> CorsLayer {
        cors_layer(&CorsConfig {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            allow_credentials,
        })
    }

    /// Headers the layer adds to a plain GET from `origin`
    async fn response_headers(layer: CorsLayer, origin: &str) -> axum::http::HeaderMap {
        let service = layer.layer(service_fn(|_req: Request<Body>| async {
            Ok::<_, Infallible>(Response::new(Body::empty()))
        }));

        let request = Request::builder()
            .uri("/api/v1/students")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap();

        service.oneshot(request).await.unwrap().headers().clone()
    }

    #[tokio::test]
    async fn test_specific_origins_echo_and_allow_credentials() {
        let layer = cors(&["http://localhost:3000", "https://schools.example.com"], true);
        let headers = response_headers(layer, "https://schools.example.com").await;

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("https://schools.example.com"))
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some(&HeaderValue::from_static("true"))
        );
    }

    #[tokio::test]
    async fn test_unlisted_origin_gets_no_allow_origin() {
        let layer = cors(&["http://localhost:3000"], true);
        let headers = response_headers(layer, "https://elsewhere.example.com").await;

        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_wildcard_drops_credentials() {
        let layer = cors(&["*"], true);
        let headers = response_headers(layer, "https://anywhere.example.com").await;

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("*"))
        );
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[tokio::test]
    async fn test_empty_origins_allow_any() {
        let headers = response_headers(cors(&[], false), "http://localhost:5173").await;

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("*"))
        );
    }

    #[tokio::test]
    async fn test_content_disposition_is_exposed() {
        let layer = cors(&["http://localhost:3000"], true);
        let headers = response_headers(layer, "http://localhost:3000").await;

        let exposed = headers
            .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        assert!(exposed.contains("content-disposition"));
    }
}
