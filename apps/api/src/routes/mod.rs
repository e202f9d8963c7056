pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/interview/session",
            post(handlers::handle_create_session),
        )
        .route(
            "/api/interview/session/:session_id",
            get(handlers::handle_get_session),
        )
        .route(
            "/api/interview/session/:session_id/question",
            get(handlers::handle_current_question),
        )
        .route(
            "/api/interview/session/:session_id/report",
            get(handlers::handle_report),
        )
        .route("/api/interview/answer", post(handlers::handle_submit_answer))
        .route(
            "/api/interview/save-answer",
            post(handlers::handle_save_answer),
        )
        .route(
            "/api/interview/unfinished/:resume_id",
            get(handlers::handle_unfinished),
        )
        .route(
            "/api/interview/:session_id/complete",
            post(handlers::handle_complete),
        )
        .route(
            "/api/interview/:session_id/detail",
            get(handlers::handle_detail),
        )
        .route(
            "/api/interview/:session_id/export",
            get(handlers::handle_export),
        )
        .with_state(state)
}
