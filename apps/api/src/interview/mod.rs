//! Interview core: session lifecycle, answer evaluation, grader-output
//! repair, and report aggregation.
//!
//! `InterviewService` is the one entry point. Mutating operations serialize
//! per session through `SessionLocks`; grading happens outside any lock and
//! the guards are re-checked before the write.

pub mod detail;
pub mod evaluator;
pub mod handlers;
pub mod locks;
pub mod models;
pub mod prompts;
pub mod repair;
pub mod report;
pub mod session;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::AppError;
use crate::grading::GradingClient;
use crate::interview::locks::{InFlightTable, SessionLocks};
use crate::interview::models::InterviewSession;
use crate::interview::report::ScoreAggregator;
use crate::questions::QuestionSource;
use crate::render::PdfRenderer;
use crate::store::SessionStore;

pub struct InterviewService {
    store: Arc<dyn SessionStore>,
    grader: Arc<dyn GradingClient>,
    questions: Arc<dyn QuestionSource>,
    renderer: Arc<dyn PdfRenderer>,
    aggregator: Arc<dyn ScoreAggregator>,
    locks: SessionLocks,
    inflight: InFlightTable,
    /// resume_id → open session id. The lock on this map is the
    /// serialization point for session creation, so two concurrent creates
    /// for one resume cannot both pass the conflict check.
    unfinished: Mutex<HashMap<i64, Uuid>>,
}

impl InterviewService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        grader: Arc<dyn GradingClient>,
        questions: Arc<dyn QuestionSource>,
        renderer: Arc<dyn PdfRenderer>,
        aggregator: Arc<dyn ScoreAggregator>,
    ) -> Self {
        Self {
            store,
            grader,
            questions,
            renderer,
            aggregator,
            locks: SessionLocks::default(),
            inflight: InFlightTable::default(),
            unfinished: Mutex::new(HashMap::new()),
        }
    }

    /// Loads a session or reports `NotFound`.
    pub(crate) async fn load(&self, session_id: Uuid) -> Result<InterviewSession, AppError> {
        self.store
            .get(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))
    }
}
