use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::flag::ContentFlag;
use super::moderation::{ModerationResult, ModerationType};

/// Metadata keys written by the pipeline itself
pub const META_USER_LOCATION: &str = "user_location";
pub const META_SUBMISSION_IP: &str = "submission_ip";
pub const META_USER_AGENT: &str = "user_agent";
pub const META_PROCESSING_ERROR: &str = "processing_error";
pub const META_APPEAL_REASON: &str = "appeal_reason";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Image,
    Video,
    Audio,
    Text,
    Livestream,
    Document,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::Image,
        ContentType::Video,
        ContentType::Audio,
        ContentType::Text,
        ContentType::Livestream,
        ContentType::Document,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Video => "video",
            ContentType::Audio => "audio",
            ContentType::Text => "text",
            ContentType::Livestream => "livestream",
            ContentType::Document => "document",
        }
    }
}

/// Submission status. PENDING and UNDER_REVIEW are the non-terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Pending,
    Approved,
    Rejected,
    UnderReview,
    Appealed,
}

impl ContentStatus {
    pub const ALL: [ContentStatus; 5] = [
        ContentStatus::Pending,
        ContentStatus::Approved,
        ContentStatus::Rejected,
        ContentStatus::UnderReview,
        ContentStatus::Appealed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Pending => "pending",
            ContentStatus::Approved => "approved",
            ContentStatus::Rejected => "rejected",
            ContentStatus::UnderReview => "under_review",
            ContentStatus::Appealed => "appealed",
        }
    }

    /// Whether the worker may still run the detector chain on this submission
    pub fn awaits_processing(&self) -> bool {
        matches!(self, ContentStatus::Pending | ContentStatus::UnderReview)
    }

    /// Only rejected content can be appealed
    pub fn can_transition_to(&self, new_status: ContentStatus) -> bool {
        match new_status {
            ContentStatus::Appealed => *self == ContentStatus::Rejected,
            ContentStatus::Pending => false,
            _ => true,
        }
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown content status: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// One piece of content entered into the moderation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSubmission {
    pub id: Uuid,
    pub user_id: String,
    pub creator_id: String,
    pub platform: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub content_hash: String,
    pub file_size: u64,
    pub duration: Option<u64>,
    pub dimensions: Option<Dimensions>,
    pub status: ContentStatus,
    pub moderation_results: Vec<ModerationResult>,
    pub flags: Vec<ContentFlag>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub appealed_at: Option<DateTime<Utc>>,
}

impl ContentSubmission {
    /// Declared submitter location (ISO country code), if any
    pub fn user_location(&self) -> Option<&str> {
        self.metadata
            .get(META_USER_LOCATION)
            .and_then(|value| value.as_str())
    }

    /// Highest classifier risk score (0 when nothing was classified).
    /// Deterministic checks always report 1.0 and act through flags only.
    pub fn highest_confidence(&self) -> f64 {
        self.moderation_results
            .iter()
            .filter(|result| result.kind == ModerationType::AiAnalysis)
            .map(|result| result.confidence)
            .fold(0.0, f64::max)
    }

    pub fn flag(&self, flag_id: Uuid) -> Option<&ContentFlag> {
        self.flags.iter().find(|flag| flag.id == flag_id)
    }

    pub fn flag_mut(&mut self, flag_id: Uuid) -> Option<&mut ContentFlag> {
        self.flags.iter_mut().find(|flag| flag.id == flag_id)
    }

    /// Back to a non-terminal state; decision timestamps are cleared
    pub fn mark_under_review(&mut self) {
        self.status = ContentStatus::UnderReview;
        self.approved_at = None;
        self.rejected_at = None;
    }

    pub fn approve(&mut self, at: DateTime<Utc>) {
        self.status = ContentStatus::Approved;
        self.approved_at = Some(at);
        self.rejected_at = None;
    }

    pub fn reject(&mut self, at: DateTime<Utc>) {
        self.status = ContentStatus::Rejected;
        self.rejected_at = Some(at);
        self.approved_at = None;
    }

    pub fn appeal(&mut self, at: DateTime<Utc>) {
        self.status = ContentStatus::Appealed;
        self.appealed_at = Some(at);
    }

    /// Copy without the hashed submitter fingerprint fields
    pub fn sanitized(&self) -> Self {
        let mut copy = self.clone();
        copy.metadata.remove(META_SUBMISSION_IP);
        copy.metadata.remove(META_USER_AGENT);
        copy
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn submission(platform: &str) -> ContentSubmission {
        ContentSubmission {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            creator_id: "creator-1".to_string(),
            platform: platform.to_string(),
            content_type: ContentType::Image,
            url: "http://x/1.jpg".to_string(),
            thumbnail_url: None,
            title: Some("t".to_string()),
            description: Some("d".to_string()),
            tags: Vec::new(),
            content_hash: "hash".to_string(),
            file_size: 1024,
            duration: None,
            dimensions: None,
            status: ContentStatus::Pending,
            moderation_results: Vec::new(),
            flags: Vec::new(),
            metadata: serde_json::Map::new(),
            submitted_at: Utc::now(),
            reviewed_at: None,
            approved_at: None,
            rejected_at: None,
            appealed_at: None,
        }
    }
}
