use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::flag::FlagSeverity;

/// Which check produced a moderation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationType {
    AiAnalysis,
    HumanReview,
    FingerprintCheck,
    AgeVerification,
    GeoRestriction,
}

impl ModerationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationType::AiAnalysis => "ai_analysis",
            ModerationType::HumanReview => "human_review",
            ModerationType::FingerprintCheck => "fingerprint_check",
            ModerationType::AgeVerification => "age_verification",
            ModerationType::GeoRestriction => "geo_restriction",
        }
    }
}

/// Policy categories a violation can fall under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationCategory {
    ExplicitContent,
    Violence,
    HateSpeech,
    Harassment,
    Spam,
    Copyright,
    Underage,
    IllegalContent,
    SelfHarm,
    Drugs,
    Terrorism,
    Misinformation,
}

impl ModerationCategory {
    pub const ALL: [ModerationCategory; 12] = [
        ModerationCategory::ExplicitContent,
        ModerationCategory::Violence,
        ModerationCategory::HateSpeech,
        ModerationCategory::Harassment,
        ModerationCategory::Spam,
        ModerationCategory::Copyright,
        ModerationCategory::Underage,
        ModerationCategory::IllegalContent,
        ModerationCategory::SelfHarm,
        ModerationCategory::Drugs,
        ModerationCategory::Terrorism,
        ModerationCategory::Misinformation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationCategory::ExplicitContent => "explicit_content",
            ModerationCategory::Violence => "violence",
            ModerationCategory::HateSpeech => "hate_speech",
            ModerationCategory::Harassment => "harassment",
            ModerationCategory::Spam => "spam",
            ModerationCategory::Copyright => "copyright",
            ModerationCategory::Underage => "underage",
            ModerationCategory::IllegalContent => "illegal_content",
            ModerationCategory::SelfHarm => "self_harm",
            ModerationCategory::Drugs => "drugs",
            ModerationCategory::Terrorism => "terrorism",
            ModerationCategory::Misinformation => "misinformation",
        }
    }

    /// Severity assigned to automated flags raised for this category
    pub fn default_severity(&self) -> FlagSeverity {
        match self {
            ModerationCategory::Underage
            | ModerationCategory::IllegalContent
            | ModerationCategory::SelfHarm
            | ModerationCategory::Terrorism => FlagSeverity::Critical,
            ModerationCategory::Violence
            | ModerationCategory::HateSpeech
            | ModerationCategory::Harassment
            | ModerationCategory::Drugs => FlagSeverity::High,
            ModerationCategory::ExplicitContent
            | ModerationCategory::Copyright
            | ModerationCategory::Misinformation => FlagSeverity::Medium,
            ModerationCategory::Spam => FlagSeverity::Low,
        }
    }

    /// Categories that force a rejection no matter what the confidence says
    pub fn forces_rejection(&self) -> bool {
        matches!(
            self,
            ModerationCategory::Underage | ModerationCategory::IllegalContent
        )
    }
}

impl std::str::FromStr for ModerationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModerationCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown moderation category: {}", s))
    }
}

/// One detector's or reviewer's judgment about a submission. Never mutated
/// once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResult {
    pub id: Uuid,
    pub submission_id: Uuid,
    #[serde(rename = "type")]
    pub kind: ModerationType,
    pub confidence: f64,
    pub categories: Vec<ModerationCategory>,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ModerationResult {
    pub fn new(
        submission_id: Uuid,
        kind: ModerationType,
        confidence: f64,
        categories: Vec<ModerationCategory>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            submission_id,
            kind,
            confidence,
            categories,
            details,
            timestamp: Utc::now(),
            reviewer_id: None,
            model: None,
            notes: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_reviewer(mut self, reviewer_id: impl Into<String>, notes: Option<String>) -> Self {
        self.reviewer_id = Some(reviewer_id.into());
        self.notes = notes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_table() {
        assert_eq!(
            ModerationCategory::Underage.default_severity(),
            FlagSeverity::Critical
        );
        assert_eq!(
            ModerationCategory::Terrorism.default_severity(),
            FlagSeverity::Critical
        );
        assert_eq!(
            ModerationCategory::Drugs.default_severity(),
            FlagSeverity::High
        );
        assert_eq!(
            ModerationCategory::Misinformation.default_severity(),
            FlagSeverity::Medium
        );
        assert_eq!(ModerationCategory::Spam.default_severity(), FlagSeverity::Low);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(
            "hate_speech".parse::<ModerationCategory>().unwrap(),
            ModerationCategory::HateSpeech
        );
        assert!("knitting".parse::<ModerationCategory>().is_err());
    }

    #[test]
    fn test_result_serializes_type_field() {
        let result = ModerationResult::new(
            Uuid::new_v4(),
            ModerationType::FingerprintCheck,
            1.0,
            Vec::new(),
            serde_json::json!({ "is_duplicate": false }),
        )
        .with_model("fingerprint-v1");

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "fingerprint_check");
        assert_eq!(json["model"], "fingerprint-v1");
        assert!(json.get("reviewer_id").is_none());
    }
}
