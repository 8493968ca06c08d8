use anyhow::{anyhow, Result};
use axum::{
    body::Body,
    http::{header, HeaderName, Request, Response},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use events_info::EventsInfo;
use runtime::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{field::Empty, Span};

use crate::shutdown;

const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

fn x_request_id() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

pub fn bind_addr(cfg: &ServerConfig) -> Result<SocketAddr> {
    let raw = format!("{}:{}", cfg.host, cfg.port);
    raw.parse()
        .map_err(|e| anyhow!("Invalid bind address '{}': {}", raw, e))
}

/// Module routes plus `/healthz`, `/openapi.json` and the global middleware stack.
pub fn build_router(cfg: &ServerConfig, events_info: &EventsInfo) -> Result<Router> {
    let mut router = events_info
        .register_rest(Router::new())
        .route("/healthz", get(|| async { "ok" }));

    if cfg.enable_docs {
        // Build once, serve as static JSON
        let openapi = Arc::new(serde_json::to_value(EventsInfo::openapi())?);
        router = router.route(
            "/openapi.json",
            get(move || {
                let v = openapi.clone();
                async move {
                    ([(header::CACHE_CONTROL, "no-store")], Json((*v).clone())).into_response()
                }
            }),
        );
    }

    // Layers added later wrap the ones added earlier:
    // SetRequestId -> Trace -> PropagateRequestId -> Timeout -> CORS -> BodyLimit -> routes
    router = router.layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));
    if cfg.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }
    if cfg.timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(cfg.timeout_sec)));
    }
    router = router.layer(PropagateRequestIdLayer::new(x_request_id()));
    router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request<Body>| {
                let rid = req
                    .headers()
                    .get(x_request_id())
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("n/a");
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri().path(),
                    version = ?req.version(),
                    request_id = %rid,
                    status = Empty,
                    latency_ms = Empty
                )
            })
            .on_response(record_response),
    );
    router = router.layer(SetRequestIdLayer::new(x_request_id(), MakeRequestUuid));

    Ok(router)
}

fn record_response<B>(res: &Response<B>, latency: Duration, span: &Span) {
    span.record("status", res.status().as_u16());
    span.record("latency_ms", latency.as_millis() as u64);
    tracing::debug!("request completed");
}

/// Bind and serve until a shutdown signal arrives.
pub async fn serve(cfg: &ServerConfig, router: Router) -> Result<()> {
    let addr = bind_addr(cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            shutdown::wait_for_shutdown().await;
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await
        .map_err(|e| anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use sea_orm::Database;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    #[test]
    fn bind_addr_combines_host_and_port() {
        let cfg = ServerConfig {
            port: 9001,
            ..ServerConfig::default()
        };
        assert_eq!(bind_addr(&cfg).unwrap().to_string(), "127.0.0.1:9001");

        let bad = ServerConfig {
            host: "not a host".into(),
            ..ServerConfig::default()
        };
        assert!(bind_addr(&bad).is_err());
    }

    #[traced_test]
    #[tokio::test]
    async fn request_span_records_status_and_latency() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let events_info = EventsInfo::new(db, &Default::default());
        let router = build_router(&ServerConfig::default(), &events_info).unwrap();

        let request = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(logs_contain("request completed"));
        assert!(logs_contain("status=200"));
        assert!(logs_contain("latency_ms="));
    }
}
