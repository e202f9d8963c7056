//! Postgres-backed `SessionStore`.
//!
//! Sessions are stored as one row per session: resume_id and state are
//! lifted into columns for the unfinished-session index, the document-shaped
//! fields (questions, answers, report) live in JSONB.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::{InterviewSession, SessionState};
use crate::store::SessionStore;

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    resume_id: i64,
    state: String,
    pointer: i32,
    questions: Value,
    answers: Value,
    report: Option<Value>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    fn into_session(self) -> Result<InterviewSession, AppError> {
        let state = match self.state.as_str() {
            "created" => SessionState::Created,
            "in_progress" => SessionState::InProgress,
            "completed" => SessionState::Completed,
            other => {
                return Err(AppError::Internal(anyhow!(
                    "Unknown session state '{other}' for session {}",
                    self.id
                )))
            }
        };

        Ok(InterviewSession {
            id: self.id,
            resume_id: self.resume_id,
            questions: serde_json::from_value(self.questions)
                .map_err(|e| AppError::Internal(anyhow!("Corrupt questions column: {e}")))?,
            pointer: self.pointer as usize,
            answers: serde_json::from_value(self.answers)
                .map_err(|e| AppError::Internal(anyhow!("Corrupt answers column: {e}")))?,
            state,
            created_at: self.created_at,
            completed_at: self.completed_at,
            report: self
                .report
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| AppError::Internal(anyhow!("Corrupt report column: {e}")))?,
        })
    }
}

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get(&self, id: Uuid) -> Result<Option<InterviewSession>, AppError> {
        let row: Option<SessionRow> =
            sqlx::query_as("SELECT * FROM interview_sessions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(SessionRow::into_session).transpose()
    }

    async fn put(&self, session: &InterviewSession) -> Result<(), AppError> {
        let questions = serde_json::to_value(&session.questions)
            .map_err(|e| AppError::Internal(anyhow!("Failed to serialize questions: {e}")))?;
        let answers = serde_json::to_value(&session.answers)
            .map_err(|e| AppError::Internal(anyhow!("Failed to serialize answers: {e}")))?;
        let report = session
            .report
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::Internal(anyhow!("Failed to serialize report: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO interview_sessions
                (id, resume_id, state, pointer, questions, answers, report,
                 created_at, completed_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            ON CONFLICT (id) DO UPDATE SET
                state        = EXCLUDED.state,
                pointer      = EXCLUDED.pointer,
                answers      = EXCLUDED.answers,
                report       = EXCLUDED.report,
                completed_at = EXCLUDED.completed_at,
                updated_at   = NOW()
            "#,
        )
        .bind(session.id)
        .bind(session.resume_id)
        .bind(session.state.as_str())
        .bind(session.pointer as i32)
        .bind(&questions)
        .bind(&answers)
        .bind(&report)
        .bind(session.created_at)
        .bind(session.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_unfinished_by_resume(
        &self,
        resume_id: i64,
    ) -> Result<Vec<InterviewSession>, AppError> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            r#"
            SELECT * FROM interview_sessions
            WHERE resume_id = $1 AND state != 'completed'
            ORDER BY created_at DESC
            "#,
        )
        .bind(resume_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SessionRow::into_session).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::{AnswerRecord, Question, QuestionScore, Report};
    use std::collections::BTreeMap;

    /// The JSONB round-trip is exercised without a live database: the row ↔
    /// domain mapping is pure serde either side of the SQL.
    #[test]
    fn test_document_columns_round_trip() {
        let mut answers = BTreeMap::new();
        answers.insert(
            0,
            AnswerRecord {
                answer_text: "an answer".to_string(),
                raw_grader_response: Some(r#"{"score":88}"#.to_string()),
                parsed_score: Some(88),
                feedback: "good".to_string(),
                attempts: 1,
                graded_at: Some(Utc::now()),
            },
        );
        let session = InterviewSession {
            answers,
            pointer: 1,
            state: SessionState::InProgress,
            report: Some(Report {
                session_id: Uuid::new_v4(),
                question_scores: vec![QuestionScore {
                    index: 0,
                    topic: "t".to_string(),
                    score: Some(88),
                }],
                overall_score: 88.0,
                summary: "s".to_string(),
                generated_at: Utc::now(),
                unscored: vec![1],
            }),
            ..InterviewSession::new(
                3,
                vec![
                    Question {
                        index: 0,
                        prompt: "q0".to_string(),
                        topic: "t".to_string(),
                    },
                    Question {
                        index: 1,
                        prompt: "q1".to_string(),
                        topic: "t".to_string(),
                    },
                ],
            )
        };

        let row = SessionRow {
            id: session.id,
            resume_id: session.resume_id,
            state: session.state.as_str().to_string(),
            pointer: session.pointer as i32,
            questions: serde_json::to_value(&session.questions).unwrap(),
            answers: serde_json::to_value(&session.answers).unwrap(),
            report: session
                .report
                .as_ref()
                .map(|r| serde_json::to_value(r).unwrap()),
            created_at: session.created_at,
            completed_at: session.completed_at,
        };

        let back = row.into_session().unwrap();
        assert_eq!(back.pointer, 1);
        assert_eq!(back.state, SessionState::InProgress);
        assert_eq!(back.questions.len(), 2);
        assert_eq!(back.answers[&0].parsed_score, Some(88));
        assert_eq!(back.report.unwrap().unscored, vec![1]);
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let row = SessionRow {
            id: Uuid::new_v4(),
            resume_id: 1,
            state: "paused".to_string(),
            pointer: 0,
            questions: serde_json::json!([]),
            answers: serde_json::json!({}),
            report: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        assert!(row.into_session().is_err());
    }
}
