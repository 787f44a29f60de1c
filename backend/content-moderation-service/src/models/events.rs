use serde::Serialize;
use uuid::Uuid;

use super::flag::{ContentFlag, FlagSeverity};
use super::moderation::ModerationCategory;
use super::submission::ContentSubmission;
use super::verification::VerificationStatus;

/// Outbound notifications for dashboards and notification systems
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ModerationEvent {
    ContentSubmitted {
        submission: ContentSubmission,
    },
    ContentUnderReview {
        submission: ContentSubmission,
    },
    ContentApproved {
        submission: ContentSubmission,
        reviewer_id: Option<String>,
    },
    ContentRejected {
        submission: ContentSubmission,
        reason: String,
        flags: Vec<ContentFlag>,
        confidence: Option<f64>,
        reviewer_id: Option<String>,
    },
    ContentNeedsHumanReview {
        submission: ContentSubmission,
        priority: u32,
    },
    ContentReported {
        content_id: Uuid,
        flag_id: Uuid,
        reporter_id: String,
        category: ModerationCategory,
        severity: FlagSeverity,
    },
    AgeVerificationSubmitted {
        user_id: String,
        status: VerificationStatus,
        age: u32,
    },
    ContentProcessingError {
        submission: ContentSubmission,
        error: String,
    },
    ContentAppealed {
        submission: ContentSubmission,
        reason: String,
    },
    FlagResolved {
        content_id: Uuid,
        flag_id: Uuid,
        resolved_by: String,
    },
}

impl ModerationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ModerationEvent::ContentSubmitted { .. } => "contentSubmitted",
            ModerationEvent::ContentUnderReview { .. } => "contentUnderReview",
            ModerationEvent::ContentApproved { .. } => "contentApproved",
            ModerationEvent::ContentRejected { .. } => "contentRejected",
            ModerationEvent::ContentNeedsHumanReview { .. } => "contentNeedsHumanReview",
            ModerationEvent::ContentReported { .. } => "contentReported",
            ModerationEvent::AgeVerificationSubmitted { .. } => "ageVerificationSubmitted",
            ModerationEvent::ContentProcessingError { .. } => "contentProcessingError",
            ModerationEvent::ContentAppealed { .. } => "contentAppealed",
            ModerationEvent::FlagResolved { .. } => "flagResolved",
        }
    }

    /// Submission or content id the event refers to, when there is one
    pub fn content_id(&self) -> Option<Uuid> {
        match self {
            ModerationEvent::ContentSubmitted { submission }
            | ModerationEvent::ContentUnderReview { submission }
            | ModerationEvent::ContentApproved { submission, .. }
            | ModerationEvent::ContentRejected { submission, .. }
            | ModerationEvent::ContentNeedsHumanReview { submission, .. }
            | ModerationEvent::ContentProcessingError { submission, .. }
            | ModerationEvent::ContentAppealed { submission, .. } => Some(submission.id),
            ModerationEvent::ContentReported { content_id, .. }
            | ModerationEvent::FlagResolved { content_id, .. } => Some(*content_id),
            ModerationEvent::AgeVerificationSubmitted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tag_matches_name() {
        let event = ModerationEvent::AgeVerificationSubmitted {
            user_id: "creator-1".to_string(),
            status: VerificationStatus::Verified,
            age: 30,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["status"], "verified");
        assert!(event.content_id().is_none());
    }
}
