use crate::db::SubmissionStore;
use crate::error::{ModerationError, Result};
use crate::models::{AppealRequest, ContentStatus, ContentSubmission, META_APPEAL_REASON};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// Appeal service for handling content appeal workflows
pub struct AppealService {
    submissions: Arc<dyn SubmissionStore>,
}

impl AppealService {
    pub fn new(submissions: Arc<dyn SubmissionStore>) -> Self {
        Self { submissions }
    }

    /// Submit an appeal for rejected content.
    ///
    /// Only the submitting user or the creator may appeal, and only once.
    /// The appeal is resolved by a later human review.
    pub async fn submit_appeal(&self, request: &AppealRequest) -> Result<ContentSubmission> {
        request.validate()?;

        let submission_id = request.submission_id;
        let user_id = request.user_id.clone();
        let reason = request.reason.clone();

        let appealed = self
            .submissions
            .update(
                submission_id,
                Box::new(move |submission| {
                    // Appeals from unrelated users look like unknown content
                    if submission.user_id != user_id && submission.creator_id != user_id {
                        return Err(ModerationError::SubmissionNotFound(submission_id));
                    }

                    if let Some(appealed_at) = submission.appealed_at {
                        return Err(ModerationError::InvalidInput(format!(
                            "Appeal already submitted at {}",
                            appealed_at.to_rfc3339()
                        )));
                    }

                    if !submission.status.can_transition_to(ContentStatus::Appealed) {
                        return Err(ModerationError::InvalidStatusTransition {
                            from: submission.status.as_str().to_string(),
                            to: ContentStatus::Appealed.as_str().to_string(),
                        });
                    }

                    submission.appeal(Utc::now());
                    submission
                        .metadata
                        .insert(META_APPEAL_REASON.to_string(), json!(reason));
                    Ok(())
                }),
            )
            .await?;

        tracing::info!(
            submission_id = %submission_id,
            user_id = %request.user_id,
            "Appeal submitted"
        );

        Ok(appealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemorySubmissionStore;
    use crate::models::submission::fixtures;
    use uuid::Uuid;

    async fn setup(status: ContentStatus) -> (AppealService, Uuid) {
        let store = Arc::new(InMemorySubmissionStore::new());
        let mut submission = fixtures::submission("FanzTube");
        submission.status = status;
        let id = submission.id;
        store.put(submission).await.unwrap();
        (AppealService::new(store), id)
    }

    fn request(submission_id: Uuid, user_id: &str) -> AppealRequest {
        AppealRequest {
            submission_id,
            user_id: user_id.to_string(),
            reason: "This is my own original work".to_string(),
        }
    }

    #[tokio::test]
    async fn test_appeal_rejected_content() {
        let (service, id) = setup(ContentStatus::Rejected).await;

        let appealed = service.submit_appeal(&request(id, "creator-1")).await.unwrap();
        assert_eq!(appealed.status, ContentStatus::Appealed);
        assert!(appealed.appealed_at.is_some());
        assert_eq!(
            appealed.metadata[META_APPEAL_REASON],
            json!("This is my own original work")
        );
    }

    #[tokio::test]
    async fn test_appeal_requires_rejected_status() {
        let (service, id) = setup(ContentStatus::Approved).await;

        let result = service.submit_appeal(&request(id, "user-1")).await;
        assert!(matches!(
            result,
            Err(ModerationError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_appeal_by_stranger_is_not_found() {
        let (service, id) = setup(ContentStatus::Rejected).await;

        let result = service.submit_appeal(&request(id, "someone-else")).await;
        assert!(matches!(result, Err(ModerationError::SubmissionNotFound(_))));
    }

    #[tokio::test]
    async fn test_second_appeal_is_refused() {
        let (service, id) = setup(ContentStatus::Rejected).await;
        service.submit_appeal(&request(id, "user-1")).await.unwrap();

        let result = service.submit_appeal(&request(id, "user-1")).await;
        assert!(matches!(result, Err(ModerationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_appeal_unknown_submission() {
        let (service, _) = setup(ContentStatus::Rejected).await;

        let result = service.submit_appeal(&request(Uuid::new_v4(), "user-1")).await;
        assert!(matches!(result, Err(ModerationError::SubmissionNotFound(_))));
    }
}
