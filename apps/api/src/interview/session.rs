//! Session lifecycle: creation, question sequencing, state transitions.
//!
//! State machine: Created → InProgress → Completed, with early termination
//! from either non-terminal state. No backward edges.

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::{
    CreateSessionOptions, InterviewSession, Question, SessionDto, SessionState,
};
use crate::interview::report::build_report;
use crate::interview::InterviewService;

/// Upper bound on questions per session.
const MAX_QUESTION_COUNT: usize = 20;

impl InterviewService {
    /// Creates a session in Created state. At most one non-completed session
    /// may exist per resume; the unfinished index's lock serializes the
    /// check-then-create, so concurrent creates cannot both pass.
    pub async fn create_session(
        &self,
        resume_id: i64,
        question_count: usize,
        options: CreateSessionOptions,
    ) -> Result<SessionDto, AppError> {
        if question_count == 0 || question_count > MAX_QUESTION_COUNT {
            return Err(AppError::Validation(format!(
                "question_count must be between 1 and {MAX_QUESTION_COUNT}"
            )));
        }

        let mut index = self.unfinished.lock().await;

        // Index hit: re-verify against the store before rejecting, in case
        // the entry is stale (e.g. completed in a previous process).
        if let Some(&open_id) = index.get(&resume_id) {
            match self.store.get(open_id).await? {
                Some(open) if !open.is_completed() => {
                    return Err(AppError::Conflict(format!(
                        "Resume {resume_id} already has unfinished session {open_id}"
                    )));
                }
                _ => {
                    index.remove(&resume_id);
                }
            }
        }

        // Store check covers sessions created before this process started.
        if let Some(open) = self.store.list_unfinished_by_resume(resume_id).await?.first() {
            index.insert(resume_id, open.id);
            return Err(AppError::Conflict(format!(
                "Resume {resume_id} already has unfinished session {}",
                open.id
            )));
        }

        let questions = self
            .questions
            .questions(resume_id, question_count, &options)
            .await?;
        // Indices are owned by the session, whatever the source claims.
        let questions: Vec<Question> = questions
            .into_iter()
            .enumerate()
            .map(|(i, mut q)| {
                q.index = i;
                q
            })
            .collect();

        let session = InterviewSession::new(resume_id, questions);
        self.store.put(&session).await?;
        index.insert(resume_id, session.id);

        info!(
            "Created session {} for resume {} with {} questions",
            session.id, resume_id, question_count
        );
        Ok(SessionDto::from(&session))
    }

    /// Read-only session summary.
    pub async fn get_session(&self, session_id: Uuid) -> Result<SessionDto, AppError> {
        Ok(SessionDto::from(&self.load(session_id).await?))
    }

    /// Returns the question at the pointer. The first call moves Created →
    /// InProgress, so this takes the session lock.
    pub async fn get_current_question(&self, session_id: Uuid) -> Result<Question, AppError> {
        let lock = self.locks.entry(session_id);
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        if session.is_completed() {
            return Err(AppError::InvalidState(format!(
                "Session {session_id} is already completed"
            )));
        }
        if session.pointer >= session.questions.len() {
            return Err(AppError::InvalidState(format!(
                "Session {session_id} has no questions left"
            )));
        }

        let question = session.questions[session.pointer].clone();
        if session.state == SessionState::Created {
            session.state = SessionState::InProgress;
            self.store.put(&session).await?;
        }
        Ok(question)
    }

    /// Most recent non-completed session for a resume.
    pub async fn find_unfinished_session(&self, resume_id: i64) -> Result<SessionDto, AppError> {
        self.store
            .list_unfinished_by_resume(resume_id)
            .await?
            .first()
            .map(SessionDto::from)
            .ok_or_else(|| {
                AppError::NotFound(format!("No unfinished session for resume {resume_id}"))
            })
    }

    /// Forces Completed regardless of remaining questions. Idempotent when
    /// already Completed. Generates the report if it is absent; a session
    /// with zero scored answers completes without one.
    pub async fn complete_interview(&self, session_id: Uuid) -> Result<(), AppError> {
        let lock = self.locks.entry(session_id);
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        if session.is_completed() {
            return Ok(());
        }

        session.state = SessionState::Completed;
        session.completed_at = Some(chrono::Utc::now());

        if session.report.is_none() {
            match build_report(&session, self.aggregator.as_ref()) {
                Ok(report) => session.report = Some(report),
                Err(AppError::InsufficientData(_)) => {
                    warn!("Completing session {session_id} without a report: no scored answers");
                }
                Err(e) => return Err(e),
            }
        }

        self.store.put(&session).await?;
        self.unfinished.lock().await.remove(&session.resume_id);

        info!(
            "Completed session {} with {}/{} questions answered",
            session_id,
            session.answers.values().filter(|a| a.is_graded()).count(),
            session.questions.len()
        );
        Ok(())
    }
}
