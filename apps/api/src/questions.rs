//! Question sourcing seam.
//!
//! The orchestrator consumes an ordered, already-produced question list;
//! generating question *content* is outside this service. The built-in
//! source cycles a fixed topic bank so sessions are deterministic and the
//! service runs standalone.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::interview::models::{CreateSessionOptions, Question};

#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Produces `count` ordered questions for a resume. Indices are assigned
    /// by the caller; implementations fill prompt and topic.
    async fn questions(
        &self,
        resume_id: i64,
        count: usize,
        options: &CreateSessionOptions,
    ) -> Result<Vec<Question>, AppError>;
}

/// Topic bank entry: topic label + prompt template with a `{role}` slot.
const TOPIC_BANK: &[(&str, &str)] = &[
    (
        "project experience",
        "Walk through the most technically challenging project on your resume. What was your part in it, and what would you change today?",
    ),
    (
        "system design",
        "Design the backend for a feature you would expect to build as a {role}. What are the main components and how do they fail?",
    ),
    (
        "debugging",
        "Describe a production incident you debugged. How did you narrow it down, and what prevented the recurrence?",
    ),
    (
        "data modeling",
        "How would you model the core data of a product you have worked on? Which invariants does the schema itself enforce?",
    ),
    (
        "collaboration",
        "Tell me about a technical disagreement with a teammate. How was it resolved, and what did you take from it?",
    ),
    (
        "performance",
        "A service you own doubles its p99 latency overnight. Walk through your first hour of investigation.",
    ),
    (
        "testing",
        "What does a useful test suite look like for the systems you build? Where do you draw the line on coverage?",
    ),
];

pub struct TopicQuestionSource;

#[async_trait]
impl QuestionSource for TopicQuestionSource {
    async fn questions(
        &self,
        _resume_id: i64,
        count: usize,
        options: &CreateSessionOptions,
    ) -> Result<Vec<Question>, AppError> {
        let role = options.job_title.as_deref().unwrap_or("software engineer");
        Ok((0..count)
            .map(|i| {
                let (topic, template) = TOPIC_BANK[i % TOPIC_BANK.len()];
                Question {
                    index: i,
                    prompt: template.replace("{role}", role),
                    topic: topic.to_string(),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_indices_are_sequential() {
        let qs = TopicQuestionSource
            .questions(1, 5, &CreateSessionOptions::default())
            .await
            .unwrap();
        assert_eq!(qs.len(), 5);
        for (i, q) in qs.iter().enumerate() {
            assert_eq!(q.index, i);
        }
    }

    #[tokio::test]
    async fn test_job_title_fills_role_slot() {
        let opts = CreateSessionOptions {
            job_title: Some("platform engineer".to_string()),
        };
        let qs = TopicQuestionSource.questions(1, 2, &opts).await.unwrap();
        assert!(qs[1].prompt.contains("platform engineer"));
    }

    #[tokio::test]
    async fn test_counts_beyond_bank_wrap_around() {
        let n = TOPIC_BANK.len() + 2;
        let qs = TopicQuestionSource
            .questions(1, n, &CreateSessionOptions::default())
            .await
            .unwrap();
        assert_eq!(qs.len(), n);
        assert_eq!(qs[TOPIC_BANK.len()].topic, qs[0].topic);
    }
}
