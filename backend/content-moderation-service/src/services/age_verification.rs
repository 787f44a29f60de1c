use crate::config::AgeVerificationConfig;
use crate::db::VerificationRegistry;
use crate::error::{ModerationError, Result};
use crate::models::{AgeVerificationRecord, AgeVerificationRequest, VerificationStatus};
use crate::utils::{age_on, sha256_hex};
use chrono::{Duration, Utc};
use std::sync::Arc;
use validator::Validate;

/// Days an age verification stays valid
const VERIFICATION_VALIDITY_DAYS: i64 = 365;

/// Records creator age verifications. Documents are not inspected; the
/// declared date of birth decides the outcome.
pub struct AgeVerificationService {
    registry: Arc<dyn VerificationRegistry>,
    config: AgeVerificationConfig,
}

impl AgeVerificationService {
    pub fn new(registry: Arc<dyn VerificationRegistry>, config: AgeVerificationConfig) -> Self {
        Self { registry, config }
    }

    /// Validate the request and overwrite the creator's record
    pub async fn submit(&self, request: &AgeVerificationRequest) -> Result<AgeVerificationRecord> {
        request.validate()?;

        if !self
            .config
            .document_types
            .iter()
            .any(|accepted| *accepted == request.document_type)
        {
            return Err(ModerationError::InvalidDocumentType {
                provided: request.document_type.clone(),
                accepted: self.config.document_types.join(", "),
            });
        }

        let now = Utc::now();
        let age = age_on(request.date_of_birth, now.date_naive());
        if age < 0 {
            return Err(ModerationError::InvalidInput(
                "date of birth is in the future".to_string(),
            ));
        }
        let age = age as u32;

        let status = if age >= self.config.minimum_age {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Rejected
        };

        let record = AgeVerificationRecord {
            user_id: request.user_id.clone(),
            document_type: request.document_type.clone(),
            document_number: sha256_hex(&request.document_number),
            verified_age: age,
            verification_date: now,
            expiry_date: now + Duration::days(VERIFICATION_VALIDITY_DAYS),
            status,
            verifier_id: None,
            notes: Some(format!(
                "Submitted {} with {} images",
                request.document_type,
                request.document_images.len()
            )),
        };

        self.registry.put_age_verification(record.clone()).await?;

        match status {
            VerificationStatus::Verified => {
                tracing::info!(user_id = %record.user_id, age, "Age verification approved")
            }
            _ => tracing::warn!(
                user_id = %record.user_id,
                age,
                minimum = self.config.minimum_age,
                "Age verification rejected"
            ),
        }

        Ok(record)
    }

    pub async fn lookup(&self, creator_id: &str) -> Result<Option<AgeVerificationRecord>> {
        self.registry.age_verification(creator_id).await
    }
}
