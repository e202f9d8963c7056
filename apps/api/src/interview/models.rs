#![allow(dead_code)]

//! Domain model for interview sessions, answers, and reports.
//!
//! Sessions are stored as whole documents behind the `SessionStore` trait;
//! everything here is plain serde data with a few invariant helpers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a session. Transitions only move forward:
/// Created → InProgress → Completed, with early termination allowed from
/// either non-terminal state. Nothing leaves Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    InProgress,
    Completed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::InProgress => "in_progress",
            SessionState::Completed => "completed",
        }
    }
}

/// Caller-supplied knobs for session creation, passed through to the
/// question source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionOptions {
    pub job_title: Option<String>,
}

/// One interview question. Immutable once the session is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub index: usize,
    pub prompt: String,
    pub topic: String,
}

/// A candidate's stored response plus the derived grading outcome.
///
/// `attempts == 0` means an ungraded draft (saved, not submitted).
/// `attempts > 0` with no `parsed_score` means the repair budget was
/// exhausted — a degraded record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub answer_text: String,
    pub raw_grader_response: Option<String>,
    pub parsed_score: Option<u32>,
    pub feedback: String,
    pub attempts: u32,
    pub graded_at: Option<DateTime<Utc>>,
}

impl AnswerRecord {
    /// Saved draft awaiting submission. Never advances the pointer.
    pub fn draft(answer_text: String) -> Self {
        Self {
            answer_text,
            raw_grader_response: None,
            parsed_score: None,
            feedback: String::new(),
            attempts: 0,
            graded_at: None,
        }
    }

    pub fn is_graded(&self) -> bool {
        self.attempts > 0
    }

    pub fn is_degraded(&self) -> bool {
        self.attempts > 0 && self.parsed_score.is_none()
    }
}

/// Per-question score line in a report. `score` is absent for unanswered
/// and degraded questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionScore {
    pub index: usize,
    pub topic: String,
    pub score: Option<u32>,
}

/// Final aggregated report, cached on the session once generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub session_id: Uuid,
    pub question_scores: Vec<QuestionScore>,
    pub overall_score: f64,
    pub summary: String,
    pub generated_at: DateTime<Utc>,
    /// Indices excluded from aggregation: unanswered questions and degraded
    /// records alike.
    pub unscored: Vec<usize>,
}

/// One interview attempt bound to a resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub resume_id: i64,
    pub questions: Vec<Question>,
    /// Index of the next question to serve. Monotonically non-decreasing,
    /// never exceeds `questions.len()`.
    pub pointer: usize,
    pub answers: BTreeMap<usize, AnswerRecord>,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub report: Option<Report>,
}

impl InterviewSession {
    pub fn new(resume_id: i64, questions: Vec<Question>) -> Self {
        Self {
            id: Uuid::new_v4(),
            resume_id,
            questions,
            pointer: 0,
            answers: BTreeMap::new(),
            state: SessionState::Created,
            created_at: Utc::now(),
            completed_at: None,
            report: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// Advances the pointer past `index` if it is the question currently
    /// being served. Out-of-order submissions leave the pointer alone.
    pub fn advance_pointer(&mut self, index: usize) {
        if index == self.pointer && self.pointer < self.questions.len() {
            self.pointer += 1;
        }
    }

    /// Indices with no graded score: unanswered questions plus degraded
    /// records.
    pub fn unscored_indices(&self) -> Vec<usize> {
        (0..self.questions.len())
            .filter(|i| {
                self.answers
                    .get(i)
                    .map(|a| a.parsed_score.is_none())
                    .unwrap_or(true)
            })
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Read-only projections served over HTTP
// ────────────────────────────────────────────────────────────────────────────

/// Session summary DTO. Never exposes raw grader responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDto {
    pub id: Uuid,
    pub resume_id: i64,
    pub state: SessionState,
    pub pointer: usize,
    pub question_count: usize,
    pub answered_count: usize,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&InterviewSession> for SessionDto {
    fn from(s: &InterviewSession) -> Self {
        Self {
            id: s.id,
            resume_id: s.resume_id,
            state: s.state,
            pointer: s.pointer,
            question_count: s.questions.len(),
            answered_count: s.answers.values().filter(|a| a.is_graded()).count(),
            created_at: s.created_at,
            completed_at: s.completed_at,
        }
    }
}

/// One answer as shown in the detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerView {
    pub index: usize,
    pub answer_text: String,
    pub score: Option<u32>,
    pub feedback: String,
    pub attempts: u32,
    pub graded_at: Option<DateTime<Utc>>,
}

/// Full read-only projection: session, questions, answers, report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewDetail {
    pub session: SessionDto,
    pub questions: Vec<Question>,
    pub answers: Vec<AnswerView>,
    pub report: Option<Report>,
}
