use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::moderation::ModerationCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
    Expired,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
            VerificationStatus::Expired => "expired",
        }
    }
}

/// Latest age verification on file for a creator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeVerificationRecord {
    pub user_id: String,
    pub document_type: String,
    /// SHA-256 of the document number, hex encoded
    pub document_number: String,
    pub verified_age: u32,
    pub verification_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub status: VerificationStatus,
    pub verifier_id: Option<String>,
    pub notes: Option<String>,
}

impl AgeVerificationRecord {
    /// Verified and not yet expired at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.status == VerificationStatus::Verified && self.expiry_date > now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationRestriction {
    pub content_id: Uuid,
    pub restricted_countries: Vec<String>,
    pub category: ModerationCategory,
    pub reason: String,
    pub applied_at: DateTime<Utc>,
}
