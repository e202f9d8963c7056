//! Report aggregation — deterministic over the session's answer records.
//!
//! The aggregation function is a pluggable strategy rather than a hardcoded
//! mean: the service carries an `Arc<dyn ScoreAggregator>` so weighted
//! variants can be swapped in without touching the report path.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::{InterviewSession, QuestionScore, Report};
use crate::interview::InterviewService;

/// Combines per-question scores into the overall score. Degraded and
/// unanswered questions are filtered out before this is called.
pub trait ScoreAggregator: Send + Sync {
    fn aggregate(&self, scores: &[u32]) -> f64;
}

/// Arithmetic mean, the default strategy.
pub struct MeanAggregator;

impl ScoreAggregator for MeanAggregator {
    fn aggregate(&self, scores: &[u32]) -> f64 {
        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64
    }
}

/// Builds a report from the session's records. Pure: same records, same
/// report (modulo the timestamp).
pub fn build_report(
    session: &InterviewSession,
    aggregator: &dyn ScoreAggregator,
) -> Result<Report, AppError> {
    let question_scores: Vec<QuestionScore> = session
        .questions
        .iter()
        .map(|q| QuestionScore {
            index: q.index,
            topic: q.topic.clone(),
            score: session.answers.get(&q.index).and_then(|a| a.parsed_score),
        })
        .collect();

    let scored: Vec<u32> = question_scores.iter().filter_map(|q| q.score).collect();
    if scored.is_empty() {
        return Err(AppError::InsufficientData(format!(
            "Session {} has no scored answers",
            session.id
        )));
    }

    let unscored = session.unscored_indices();
    let overall_score = aggregator.aggregate(&scored);

    Ok(Report {
        session_id: session.id,
        summary: summarize(overall_score, scored.len(), session.questions.len()),
        question_scores,
        overall_score,
        generated_at: Utc::now(),
        unscored,
    })
}

/// Deterministic narrative line: score band plus coverage. No model call.
fn summarize(overall: f64, scored: usize, total: usize) -> String {
    let band = match overall {
        s if s >= 85.0 => "Strong performance across the board",
        s if s >= 70.0 => "Solid performance with room to deepen",
        s if s >= 50.0 => "Mixed performance; fundamentals need work",
        _ => "Weak performance; substantial preparation needed",
    };
    format!("{band}: scored {scored} of {total} questions, overall {overall:.0}/100.")
}

impl InterviewService {
    /// Returns the cached report or generates, caches, and persists a fresh
    /// one. Serialized per session so generation cannot race an answer
    /// write.
    pub async fn generate_report(&self, session_id: Uuid) -> Result<Report, AppError> {
        let lock = self.locks.entry(session_id);
        let _guard = lock.lock().await;

        let mut session = self.load(session_id).await?;
        if let Some(report) = &session.report {
            return Ok(report.clone());
        }

        let report = build_report(&session, self.aggregator.as_ref())?;
        session.report = Some(report.clone());
        self.store.put(&session).await?;

        info!(
            "Generated report for session {}: overall {:.1}, {} unscored",
            session_id,
            report.overall_score,
            report.unscored.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::{AnswerRecord, Question};

    fn session_with_scores(scores: &[Option<Option<u32>>]) -> InterviewSession {
        // None = unanswered; Some(None) = degraded; Some(Some(n)) = scored.
        let questions = (0..scores.len())
            .map(|i| Question {
                index: i,
                prompt: format!("q{i}"),
                topic: "general".to_string(),
            })
            .collect();
        let mut session = InterviewSession::new(1, questions);
        for (i, entry) in scores.iter().enumerate() {
            if let Some(score) = entry {
                session.answers.insert(
                    i,
                    AnswerRecord {
                        answer_text: "a".to_string(),
                        raw_grader_response: None,
                        parsed_score: *score,
                        feedback: String::new(),
                        attempts: if score.is_some() { 1 } else { 3 },
                        graded_at: Some(Utc::now()),
                    },
                );
            }
        }
        session
    }

    #[test]
    fn test_mean_of_70_80_90_is_80() {
        let session =
            session_with_scores(&[Some(Some(70)), Some(Some(80)), Some(Some(90))]);
        let report = build_report(&session, &MeanAggregator).unwrap();
        assert_eq!(report.overall_score, 80.0);
        assert!(report.unscored.is_empty());
    }

    #[test]
    fn test_degraded_and_unanswered_are_flagged_not_averaged() {
        let session = session_with_scores(&[Some(Some(60)), Some(None), None]);
        let report = build_report(&session, &MeanAggregator).unwrap();
        assert_eq!(report.overall_score, 60.0);
        assert_eq!(report.unscored, vec![1, 2]);
        assert_eq!(report.question_scores[1].score, None);
    }

    #[test]
    fn test_no_scored_answers_is_insufficient_data() {
        let session = session_with_scores(&[Some(None), None]);
        let err = build_report(&session, &MeanAggregator).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }

    #[test]
    fn test_summary_reflects_band_and_coverage() {
        let session = session_with_scores(&[Some(Some(90)), Some(Some(92)), None]);
        let report = build_report(&session, &MeanAggregator).unwrap();
        assert!(report.summary.contains("Strong performance"));
        assert!(report.summary.contains("2 of 3"));
    }

    #[test]
    fn test_mean_aggregator_empty_is_zero() {
        assert_eq!(MeanAggregator.aggregate(&[]), 0.0);
    }
}
