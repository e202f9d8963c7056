//! Read-only detail projection and report export.
//!
//! No grading or scoring happens here — the projection combines what the
//! session already holds, and export delegates byte rendering to the
//! external renderer.

use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::{AnswerView, InterviewDetail, InterviewSession, Report, SessionDto};
use crate::interview::InterviewService;

impl InterviewService {
    /// Combines session, answers, and report into one view, generating the
    /// report when it is absent. A session with nothing scored yet simply
    /// has no report.
    pub async fn get_interview_detail(
        &self,
        session_id: Uuid,
    ) -> Result<InterviewDetail, AppError> {
        let session = self.load(session_id).await?;

        let report = match &session.report {
            Some(report) => Some(report.clone()),
            None => match self.generate_report(session_id).await {
                Ok(report) => Some(report),
                Err(AppError::InsufficientData(_)) => None,
                Err(e) => return Err(e),
            },
        };

        Ok(build_detail(&session, report))
    }

    /// Renders the detail projection to PDF bytes. A report is required —
    /// `InsufficientData` surfaces here, unlike in the detail view. Renderer
    /// failure is `RenderFailed` and mutates nothing.
    pub async fn export_report(&self, session_id: Uuid) -> Result<Vec<u8>, AppError> {
        self.generate_report(session_id).await?;
        let detail = self.get_interview_detail(session_id).await?;

        self.renderer
            .render(&detail)
            .await
            .map_err(|e| AppError::RenderFailed(e.to_string()))
    }
}

fn build_detail(session: &InterviewSession, report: Option<Report>) -> InterviewDetail {
    let answers = session
        .answers
        .iter()
        .map(|(&index, record)| AnswerView {
            index,
            answer_text: record.answer_text.clone(),
            score: record.parsed_score,
            feedback: record.feedback.clone(),
            attempts: record.attempts,
            graded_at: record.graded_at,
        })
        .collect();

    InterviewDetail {
        session: SessionDto::from(session),
        questions: session.questions.clone(),
        answers,
        report,
    }
}
