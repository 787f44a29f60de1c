use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::moderation::ModerationCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    ContentViolation,
    AgeRestriction,
    CopyrightClaim,
    Spam,
    Harassment,
    DuplicateContent,
    TechnicalIssue,
}

/// Flag severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FlagSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagSeverity::Low => "low",
            FlagSeverity::Medium => "medium",
            FlagSeverity::High => "high",
            FlagSeverity::Critical => "critical",
        }
    }

    /// Weight contributed to the human review priority
    pub fn priority_weight(&self) -> u32 {
        match self {
            FlagSeverity::Critical => 100,
            FlagSeverity::High => 50,
            FlagSeverity::Medium => 20,
            FlagSeverity::Low => 5,
        }
    }

    /// HIGH and CRITICAL flags
    pub fn is_severe(&self) -> bool {
        *self >= FlagSeverity::High
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSource {
    Ai,
    UserReport,
    ManualReview,
}

/// A recorded suspicion of a policy violation against a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFlag {
    pub id: Uuid,
    pub submission_id: Uuid,
    #[serde(rename = "type")]
    pub kind: FlagType,
    pub severity: FlagSeverity,
    pub category: ModerationCategory,
    pub reason: String,
    pub confidence: f64,
    pub source: FlagSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl ContentFlag {
    pub fn new(
        submission_id: Uuid,
        kind: FlagType,
        severity: FlagSeverity,
        category: ModerationCategory,
        reason: impl Into<String>,
        confidence: f64,
        source: FlagSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            submission_id,
            kind,
            severity,
            category,
            reason: reason.into(),
            confidence,
            source,
            reporter_id: None,
            timestamp: Utc::now(),
            resolved: false,
            resolution: None,
        }
    }

    /// Flag raised by one of the automated detectors
    pub fn automated(
        submission_id: Uuid,
        kind: FlagType,
        severity: FlagSeverity,
        category: ModerationCategory,
        reason: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self::new(
            submission_id,
            kind,
            severity,
            category,
            reason,
            confidence,
            FlagSource::Ai,
        )
    }

    pub fn resolve(&mut self, resolution: impl Into<String>) {
        self.resolved = true;
        self.resolution = Some(resolution.into());
    }
}
