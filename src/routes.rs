use crate::handlers;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/topics", get(handlers::list_topics))
        .route("/api/v1/quiz", get(handlers::get_quiz))
        .route("/api/v1/quiz/topic", post(handlers::select_topic))
        .route("/api/v1/quiz/start", post(handlers::start_session))
        .route("/api/v1/quiz/answer", post(handlers::answer))
        .route("/api/v1/quiz/hint", post(handlers::reveal_hint))
        .route("/api/v1/quiz/next", post(handlers::next_question))
        .route("/api/v1/quiz/restart", post(handlers::restart))
        .route("/api/v1/quiz/reconfigure", post(handlers::reconfigure))
        .route("/api/v1/quiz/home", post(handlers::back_to_home))
        .route(
            "/api/v1/preferences",
            get(handlers::get_preferences).put(handlers::update_preferences),
        )
        .route("/ws/events", get(handlers::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
