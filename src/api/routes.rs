//! API Routes
//!
//! Configures the Axum router with all session context endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    append_turns_handler, health_handler, history_handler, invalidate_handler,
    prepare_context_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /sessions/:session_id/context` - Rank and pack retrieval results
/// - `POST /sessions/:session_id/turns` - Append turns to a session
/// - `GET /sessions/:session_id/history` - Full session history
/// - `DELETE /sessions/:session_id/cache` - Drop the cached history
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/sessions/:session_id/context", post(prepare_context_handler))
        .route("/sessions/:session_id/turns", post(append_turns_handler))
        .route("/sessions/:session_id/history", get(history_handler))
        .route("/sessions/:session_id/cache", delete(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::from_config(&Config::default()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_history_endpoint_empty_session() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/sessions/new-session/history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_turns_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sessions/s1/turns")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"turns":[{"role":"user","content":"hello"}]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/get/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
