//! Inputs accepted by the pipeline's public operations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::flag::FlagSeverity;
use super::moderation::ModerationCategory;
use super::submission::{ContentType, Dimensions};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitContentRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub creator_id: String,
    #[validate(length(min = 1))]
    pub platform: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[validate(url)]
    pub url: String,
    #[validate(url)]
    pub thumbnail_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub file_size: u64,
    pub duration: Option<u64>,
    pub dimensions: Option<Dimensions>,
    /// ISO 3166-1 alpha-2 country code declared by the client
    #[validate(length(equal = 2))]
    pub user_location: Option<String>,
    /// Free-form client metadata; `client_ip` and `user_agent` are picked up
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl SubmitContentRequest {
    pub fn new(
        user_id: impl Into<String>,
        creator_id: impl Into<String>,
        platform: impl Into<String>,
        content_type: ContentType,
        url: impl Into<String>,
        file_size: u64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            creator_id: creator_id.into(),
            platform: platform.into(),
            content_type,
            url: url.into(),
            thumbnail_url: None,
            title: None,
            description: None,
            tags: Vec::new(),
            file_size,
            duration: None,
            dimensions: None,
            user_location: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_location(mut self, country: impl Into<String>) -> Self {
        self.user_location = Some(country.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HumanReviewRequest {
    pub submission_id: Uuid,
    #[validate(length(min = 1))]
    pub reviewer_id: String,
    pub decision: ReviewDecision,
    #[serde(default)]
    pub categories: Vec<ModerationCategory>,
    pub notes: Option<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportContentRequest {
    pub content_id: Uuid,
    #[validate(length(min = 1))]
    pub reporter_id: String,
    pub category: ModerationCategory,
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
    pub severity: FlagSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AgeVerificationRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    pub document_type: String,
    #[validate(length(min = 1))]
    pub document_number: String,
    pub date_of_birth: NaiveDate,
    /// References to the uploaded document images
    #[serde(default)]
    pub document_images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppealRequest {
    pub submission_id: Uuid,
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolveFlagRequest {
    pub submission_id: Uuid,
    pub flag_id: Uuid,
    #[validate(length(min = 1))]
    pub resolved_by: String,
    #[validate(length(min = 1, max = 2000))]
    pub resolution: String,
}
