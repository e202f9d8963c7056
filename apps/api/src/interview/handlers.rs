//! Axum route handlers for the interview API.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::evaluator::SubmitAnswerResponse;
use crate::interview::models::{
    CreateSessionOptions, InterviewDetail, Question, Report, SessionDto,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub resume_id: i64,
    pub question_count: usize,
    #[serde(default)]
    pub job_title: Option<String>,
}

/// Shared body for submit and save.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub session_id: Uuid,
    pub question_index: usize,
    pub answer_text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/interview/session
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionDto>), AppError> {
    let options = CreateSessionOptions {
        job_title: request.job_title,
    };
    let session = state
        .interviews
        .create_session(request.resume_id, request.question_count, options)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/interview/session/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionDto>, AppError> {
    Ok(Json(state.interviews.get_session(session_id).await?))
}

/// GET /api/interview/session/:session_id/question
pub async fn handle_current_question(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Question>, AppError> {
    Ok(Json(state.interviews.get_current_question(session_id).await?))
}

/// POST /api/interview/answer
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    let response = state
        .interviews
        .submit_answer(
            request.session_id,
            request.question_index,
            request.answer_text,
        )
        .await?;
    Ok(Json(response))
}

/// POST /api/interview/save-answer
pub async fn handle_save_answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<StatusCode, AppError> {
    state
        .interviews
        .save_answer(
            request.session_id,
            request.question_index,
            request.answer_text,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/interview/:session_id/complete
pub async fn handle_complete(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.interviews.complete_interview(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/interview/session/:session_id/report
pub async fn handle_report(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Report>, AppError> {
    Ok(Json(state.interviews.generate_report(session_id).await?))
}

/// GET /api/interview/unfinished/:resume_id
pub async fn handle_unfinished(
    State(state): State<AppState>,
    Path(resume_id): Path<i64>,
) -> Result<Json<SessionDto>, AppError> {
    Ok(Json(state.interviews.find_unfinished_session(resume_id).await?))
}

/// GET /api/interview/:session_id/detail
pub async fn handle_detail(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<InterviewDetail>, AppError> {
    Ok(Json(state.interviews.get_interview_detail(session_id).await?))
}

/// GET /api/interview/:session_id/export
///
/// Serves the rendered report as a PDF attachment.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state.interviews.export_report(session_id).await?;
    let disposition = format!("attachment; filename=\"interview_report_{session_id}.pdf\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
