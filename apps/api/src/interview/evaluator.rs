//! Answer evaluation — grading orchestration around the repair pipeline.
//!
//! The per-session lock is held only for the re-validate + write step; the
//! grading call runs outside it. Grader failure of any kind degrades the
//! record instead of blocking the candidate's progress.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::{AnswerRecord, InterviewSession, SessionState};
use crate::interview::prompts::build_grading_prompt;
use crate::interview::repair::{self, RepairError};
use crate::interview::InterviewService;

/// Feedback recorded when the repair budget is exhausted.
const DEGRADED_FEEDBACK: &str = "grading unavailable";

/// Outcome of a submission, as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitAnswerResponse {
    pub session_id: Uuid,
    pub question_index: usize,
    pub parsed_score: Option<u32>,
    pub feedback: String,
    pub attempts: u32,
    /// Index of the next question to serve, absent when the session is
    /// exhausted.
    pub next_index: Option<usize>,
}

impl InterviewService {
    /// Grades and records one answer, advancing the pointer when the answer
    /// is for the current question. At most one grading call is in flight
    /// per (session, question); a concurrent duplicate gets `Conflict`.
    pub async fn submit_answer(
        &self,
        session_id: Uuid,
        question_index: usize,
        answer_text: String,
    ) -> Result<SubmitAnswerResponse, AppError> {
        if answer_text.trim().is_empty() {
            return Err(AppError::Validation(
                "answer_text cannot be empty".to_string(),
            ));
        }

        let _inflight = self.inflight.claim(session_id, question_index).ok_or_else(|| {
            AppError::Conflict(format!(
                "Grading already in flight for session {session_id} question {question_index}"
            ))
        })?;

        // Unlocked pre-check against a snapshot: cheap rejection before the
        // slow external call. The same guards run again under the lock.
        let snapshot = self.load(session_id).await?;
        validate_submission(&snapshot, question_index)?;
        let question = &snapshot.questions[question_index];
        let prompt = build_grading_prompt(&question.topic, &question.prompt, &answer_text);

        let record = self.grade_answer(&prompt, answer_text).await;

        let lock = self.locks.entry(session_id);
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        validate_submission(&session, question_index)?;

        let response = SubmitAnswerResponse {
            session_id,
            question_index,
            parsed_score: record.parsed_score,
            feedback: record.feedback.clone(),
            attempts: record.attempts,
            next_index: None,
        };

        session.answers.insert(question_index, record);
        session.advance_pointer(question_index);
        if session.state == SessionState::Created {
            session.state = SessionState::InProgress;
        }
        session.report = None;
        self.store.put(&session).await?;

        info!(
            "Recorded answer for session {} question {} (score: {:?}, attempts: {})",
            session_id, question_index, response.parsed_score, response.attempts
        );
        Ok(SubmitAnswerResponse {
            next_index: (session.pointer < session.questions.len()).then_some(session.pointer),
            ..response
        })
    }

    /// Stores a draft verbatim: no grading, no pointer movement, no state
    /// transition. Overwrites a previous draft for the same index.
    pub async fn save_answer(
        &self,
        session_id: Uuid,
        question_index: usize,
        answer_text: String,
    ) -> Result<(), AppError> {
        let lock = self.locks.entry(session_id);
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        validate_submission(&session, question_index)?;

        session
            .answers
            .insert(question_index, AnswerRecord::draft(answer_text));
        session.report = None;
        self.store.put(&session).await
    }

    /// Runs grade + repair and always produces a record: grader transport
    /// failure and exhausted repair both yield the degraded form.
    async fn grade_answer(&self, prompt: &str, answer_text: String) -> AnswerRecord {
        let raw = match self.grader.grade(prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Grading call failed, recording degraded answer: {e}");
                return degraded_record(answer_text, None);
            }
        };

        match repair::normalize(self.grader.as_ref(), &raw).await {
            Ok((grade, attempts)) => AnswerRecord {
                answer_text,
                raw_grader_response: Some(raw),
                parsed_score: Some(grade.score),
                feedback: grade.feedback,
                attempts,
                graded_at: Some(Utc::now()),
            },
            Err(RepairError::Malformed { attempts }) => {
                warn!("Grader output unusable after {attempts} attempts, degrading");
                let mut record = degraded_record(answer_text, Some(raw));
                record.attempts = attempts;
                record
            }
        }
    }
}

fn degraded_record(answer_text: String, raw: Option<String>) -> AnswerRecord {
    AnswerRecord {
        answer_text,
        raw_grader_response: raw,
        parsed_score: None,
        feedback: DEGRADED_FEEDBACK.to_string(),
        attempts: repair::MAX_ATTEMPTS,
        graded_at: Some(Utc::now()),
    }
}

/// Shared guards for submit/save. Run once on the snapshot and re-run under
/// the session lock right before the write.
fn validate_submission(session: &InterviewSession, question_index: usize) -> Result<(), AppError> {
    if session.is_completed() {
        return Err(AppError::InvalidState(format!(
            "Session {} is already completed",
            session.id
        )));
    }
    if question_index >= session.questions.len() {
        return Err(AppError::Validation(format!(
            "question_index {question_index} out of range for {} questions",
            session.questions.len()
        )));
    }
    if session
        .answers
        .get(&question_index)
        .map(AnswerRecord::is_graded)
        .unwrap_or(false)
    {
        return Err(AppError::Conflict(format!(
            "Question {question_index} already graded for session {}",
            session.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::testing::{Scripted, ScriptedGrader};
    use crate::interview::models::CreateSessionOptions;
    use crate::interview::testing::harness;
    use std::time::Duration;

    async fn session_of(h: &crate::interview::testing::Harness, count: usize) -> Uuid {
        h.service
            .create_session(1, count, CreateSessionOptions::default())
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_clean_grade_records_score_and_advances_pointer() {
        let h = harness(ScriptedGrader::default().with_grade(vec![Scripted::Text(
            r#"{"score": 84, "feedback": "thorough"}"#.to_string(),
        )]));
        let id = session_of(&h, 3).await;

        let resp = h
            .service
            .submit_answer(id, 0, "my answer".to_string())
            .await
            .unwrap();
        assert_eq!(resp.parsed_score, Some(84));
        assert_eq!(resp.feedback, "thorough");
        assert_eq!(resp.attempts, 1);
        assert_eq!(resp.next_index, Some(1));

        let dto = h.service.get_session(id).await.unwrap();
        assert_eq!(dto.pointer, 1);
        assert_eq!(dto.state, SessionState::InProgress);
    }

    #[tokio::test]
    async fn test_fenced_grade_is_repaired_without_remote_call() {
        let h = harness(ScriptedGrader::default().with_grade(vec![Scripted::Text(
            "```json\n{\"score\":80}\n```\nNote: nicely done".to_string(),
        )]));
        let id = session_of(&h, 1).await;

        let resp = h
            .service
            .submit_answer(id, 0, "answer".to_string())
            .await
            .unwrap();
        assert_eq!(resp.parsed_score, Some(80));
        assert_eq!(resp.attempts, 2);
        assert_eq!(h.grader.repair_count(), 0);
    }

    #[tokio::test]
    async fn test_unusable_grader_output_degrades_but_advances() {
        let h = harness(
            ScriptedGrader::default()
                .with_grade(vec![Scripted::Text("no json here".to_string())])
                .with_repair(vec![Scripted::Text("still no json".to_string())]),
        );
        let id = session_of(&h, 2).await;

        let resp = h
            .service
            .submit_answer(id, 0, "answer".to_string())
            .await
            .unwrap();
        assert_eq!(resp.parsed_score, None);
        assert_eq!(resp.feedback, "grading unavailable");
        assert_eq!(resp.attempts, 3);
        assert_eq!(resp.next_index, Some(1), "progress is never blocked");
    }

    #[tokio::test]
    async fn test_grader_transport_failure_degrades_but_advances() {
        let h = harness(ScriptedGrader::default().with_grade(vec![Scripted::Transport]));
        let id = session_of(&h, 2).await;

        let resp = h
            .service
            .submit_answer(id, 0, "answer".to_string())
            .await
            .unwrap();
        assert_eq!(resp.parsed_score, None);
        assert_eq!(resp.attempts, 3);
        let dto = h.service.get_session(id).await.unwrap();
        assert_eq!(dto.pointer, 1);
    }

    #[tokio::test]
    async fn test_out_of_order_submission_leaves_pointer() {
        let h = harness(ScriptedGrader::default());
        let id = session_of(&h, 3).await;

        let resp = h
            .service
            .submit_answer(id, 2, "answer".to_string())
            .await
            .unwrap();
        assert_eq!(resp.next_index, Some(0), "pointer still at question 0");
        let dto = h.service.get_session(id).await.unwrap();
        assert_eq!(dto.pointer, 0);
    }

    #[tokio::test]
    async fn test_resubmitting_graded_question_is_conflict() {
        let h = harness(ScriptedGrader::default());
        let id = session_of(&h, 2).await;
        h.service
            .submit_answer(id, 0, "answer".to_string())
            .await
            .unwrap();
        let err = h
            .service
            .submit_answer(id, 0, "again".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_submit_after_completion_is_invalid_state() {
        let h = harness(ScriptedGrader::default());
        let id = session_of(&h, 2).await;
        h.service.complete_interview(id).await.unwrap();
        let err = h
            .service
            .submit_answer(id, 0, "answer".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(h.grader.grade_count(), 0, "no grading call for dead session");
    }

    #[tokio::test]
    async fn test_empty_answer_is_rejected_before_grading() {
        let h = harness(ScriptedGrader::default());
        let id = session_of(&h, 1).await;
        let err = h
            .service
            .submit_answer(id, 0, "   ".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(h.grader.grade_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_submission_grades_once() {
        let h = harness(
            ScriptedGrader::default().with_grade_delay(Duration::from_millis(50)),
        );
        let id = session_of(&h, 1).await;

        let svc_a = h.service.clone();
        let svc_b = h.service.clone();
        let a = tokio::spawn(async move { svc_a.submit_answer(id, 0, "mine".to_string()).await });
        let b = tokio::spawn(async move { svc_b.submit_answer(id, 0, "mine".to_string()).await });

        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        let outcomes = [ra, rb];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(h.grader.grade_count(), 1, "grader invoked exactly once");
    }

    #[tokio::test]
    async fn test_save_answer_stores_draft_without_advancing() {
        let h = harness(ScriptedGrader::default());
        let id = session_of(&h, 2).await;

        h.service
            .save_answer(id, 0, "half-finished".to_string())
            .await
            .unwrap();
        h.service
            .save_answer(id, 0, "rewritten draft".to_string())
            .await
            .unwrap();

        let dto = h.service.get_session(id).await.unwrap();
        assert_eq!(dto.pointer, 0);
        assert_eq!(dto.state, SessionState::Created);
        assert_eq!(dto.answered_count, 0);
        assert_eq!(h.grader.grade_count(), 0);

        // The draft is visible in the detail view and submit overwrites it.
        let detail = h.service.get_interview_detail(id).await.unwrap();
        assert_eq!(detail.answers[0].answer_text, "rewritten draft");
        h.service
            .submit_answer(id, 0, "final answer".to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_answer_writes_invalidate_report_cache() {
        let h = harness(ScriptedGrader::default());
        let id = session_of(&h, 3).await;
        h.service
            .submit_answer(id, 0, "answer".to_string())
            .await
            .unwrap();

        h.service.generate_report(id).await.unwrap();
        h.service.generate_report(id).await.unwrap();
        assert_eq!(h.aggregator.calls(), 1, "second call hits the cache");

        h.service
            .save_answer(id, 1, "draft".to_string())
            .await
            .unwrap();
        h.service.generate_report(id).await.unwrap();
        assert_eq!(h.aggregator.calls(), 2, "draft write invalidated the cache");

        h.service
            .submit_answer(id, 1, "answer two".to_string())
            .await
            .unwrap();
        h.service.generate_report(id).await.unwrap();
        assert_eq!(h.aggregator.calls(), 3, "submission invalidated the cache");
    }
}
