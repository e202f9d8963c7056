//! Durable session storage seam.
//!
//! The orchestrator only ever sees this trait; the engine behind it is
//! swappable. `postgres.rs` is the production backend, `memory.rs` backs the
//! tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::InterviewSession;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetches a session by id. `None` for unknown ids — the caller decides
    /// whether that is an error.
    async fn get(&self, id: Uuid) -> Result<Option<InterviewSession>, AppError>;

    /// Writes the full session document, replacing any previous version.
    async fn put(&self, session: &InterviewSession) -> Result<(), AppError>;

    /// Non-completed sessions for a resume, most recent first.
    async fn list_unfinished_by_resume(
        &self,
        resume_id: i64,
    ) -> Result<Vec<InterviewSession>, AppError>;
}
