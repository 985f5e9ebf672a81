//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/download/{filename}", get(handlers::download_file))
        .route("/list-files", get(handlers::list_files))
        .route("/upload", post(handlers::upload_file))
        .route("/upload-multiple", post(handlers::upload_multiple_files))
        // Layers run bottom-up, so the request ID is set before logging sees it
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(state.config.max_body_size));

    if state.config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);
        router = router.layer(cors);
    }

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use filegate_store::MemoryObjectStore;
    use tower::ServiceExt;

    fn router(config: GatewayConfig) -> Router {
        let store = Arc::new(MemoryObjectStore::with_bucket("files"));
        create_router(Arc::new(AppState::with_store(config, store)))
    }

    #[tokio::test]
    async fn test_health_echoes_request_id() {
        let app = router(GatewayConfig::default().with_bucket("files"));

        let response = app
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = router(GatewayConfig::default().with_bucket("files"));

        let response = app
            .oneshot(Request::get("/files").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let app = router(GatewayConfig::default().with_bucket("files"));

        let response = app
            .oneshot(Request::get("/upload").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_missing_bucket_is_server_error() {
        let app = router(GatewayConfig::default());

        let response = app
            .oneshot(Request::get("/list-files").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Internal server error");
    }
}
