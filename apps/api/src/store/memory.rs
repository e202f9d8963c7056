#![allow(dead_code)]

//! In-memory `SessionStore` used by the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::InterviewSession;
use crate::store::SessionStore;

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, InterviewSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: Uuid) -> Result<Option<InterviewSession>, AppError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn put(&self, session: &InterviewSession) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn list_unfinished_by_resume(
        &self,
        resume_id: i64,
    ) -> Result<Vec<InterviewSession>, AppError> {
        let sessions = self.sessions.read().await;
        let mut unfinished: Vec<InterviewSession> = sessions
            .values()
            .filter(|s| s.resume_id == resume_id && !s.is_completed())
            .cloned()
            .collect();
        unfinished.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(unfinished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::{Question, SessionState};

    fn session(resume_id: i64) -> InterviewSession {
        InterviewSession::new(
            resume_id,
            vec![Question {
                index: 0,
                prompt: "q".to_string(),
                topic: "t".to_string(),
            }],
        )
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let store = MemorySessionStore::new();
        let s = session(7);
        store.put(&s).await.unwrap();
        let loaded = store.get(s.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, s.id);
        assert_eq!(loaded.resume_id, 7);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_none() {
        let store = MemorySessionStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_unfinished_excludes_completed() {
        let store = MemorySessionStore::new();
        let mut done = session(7);
        done.state = SessionState::Completed;
        let open = session(7);
        let other = session(8);
        store.put(&done).await.unwrap();
        store.put(&open).await.unwrap();
        store.put(&other).await.unwrap();

        let unfinished = store.list_unfinished_by_resume(7).await.unwrap();
        assert_eq!(unfinished.len(), 1);
        assert_eq!(unfinished[0].id, open.id);
    }
}
