//! In-memory submission store

use super::{SubmissionStore, SubmissionUpdate};
use crate::error::{ModerationError, Result};
use crate::models::ContentSubmission;
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemorySubmissionStore {
    submissions: DashMap<Uuid, ContentSubmission>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn get(&self, id: Uuid) -> Result<Option<ContentSubmission>> {
        Ok(self.submissions.get(&id).map(|entry| entry.value().clone()))
    }

    async fn put(&self, submission: ContentSubmission) -> Result<()> {
        self.submissions.insert(submission.id, submission);
        Ok(())
    }

    async fn update(&self, id: Uuid, update: SubmissionUpdate) -> Result<ContentSubmission> {
        let mut entry = self
            .submissions
            .get_mut(&id)
            .ok_or(ModerationError::SubmissionNotFound(id))?;

        // Work on a copy so a failed update leaves the stored value intact
        let mut updated = entry.value().clone();
        update(&mut updated)?;
        *entry.value_mut() = updated.clone();

        Ok(updated)
    }

    async fn scan(&self) -> Result<Vec<ContentSubmission>> {
        Ok(self
            .submissions
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::fixtures;
    use crate::models::ContentStatus;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemorySubmissionStore::new();
        let submission = fixtures::submission("FanzTube");
        let id = submission.id;

        store.put(submission).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).await.unwrap().unwrap().id, id);
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_applies_mutation() {
        let store = InMemorySubmissionStore::new();
        let submission = fixtures::submission("FanzTube");
        let id = submission.id;
        store.put(submission).await.unwrap();

        let updated = store
            .update(
                id,
                Box::new(|s| {
                    s.mark_under_review();
                    Ok(())
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, ContentStatus::UnderReview);
        assert_eq!(
            store.get(id).await.unwrap().unwrap().status,
            ContentStatus::UnderReview
        );
    }

    #[tokio::test]
    async fn test_failed_update_is_not_persisted() {
        let store = InMemorySubmissionStore::new();
        let submission = fixtures::submission("FanzTube");
        let id = submission.id;
        store.put(submission).await.unwrap();

        let result = store
            .update(
                id,
                Box::new(|s| {
                    s.mark_under_review();
                    Err(ModerationError::Internal("abort".to_string()))
                }),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(
            store.get(id).await.unwrap().unwrap().status,
            ContentStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_update_unknown_submission() {
        let store = InMemorySubmissionStore::new();
        let result = store.update(Uuid::new_v4(), Box::new(|_| Ok(()))).await;
        assert!(matches!(result, Err(ModerationError::SubmissionNotFound(_))));
    }
}
