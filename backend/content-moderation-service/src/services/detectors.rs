//! Automated detectors run by the worker, in a fixed order:
//! fingerprint, age verification, geo restriction, AI analysis.

use crate::config::{AgeVerificationConfig, GeoblockingConfig, ModerationConfig};
use crate::db::{FingerprintIndex, PipelineStores, VerificationRegistry};
use crate::error::{ModerationError, Result};
use crate::metrics::ModerationMetrics;
use crate::models::{
    ContentFlag, ContentSubmission, FlagSeverity, FlagType, GeolocationRestriction,
    ModerationCategory, ModerationResult, ModerationType,
};
use crate::services::classifier::ContentClassifier;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// What one detector contributes: exactly one result and any flags
#[derive(Debug, Clone)]
pub struct DetectorOutcome {
    pub result: ModerationResult,
    pub flags: Vec<ContentFlag>,
}

#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this detector runs for `submission` at all
    fn applies_to(&self, _submission: &ContentSubmission) -> bool {
        true
    }

    async fn inspect(&self, submission: &ContentSubmission) -> Result<DetectorOutcome>;
}

pub struct FingerprintDetector {
    index: Arc<dyn FingerprintIndex>,
}

impl FingerprintDetector {
    pub const MODEL: &'static str = "fingerprint-v1";

    pub fn new(index: Arc<dyn FingerprintIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Detector for FingerprintDetector {
    fn name(&self) -> &'static str {
        "fingerprint"
    }

    async fn inspect(&self, submission: &ContentSubmission) -> Result<DetectorOutcome> {
        let matching = self
            .index
            .register(&submission.content_hash, submission.id)
            .await?;
        let is_duplicate = !matching.is_empty();

        let mut flags = Vec::new();
        if is_duplicate {
            let ids: Vec<String> = matching.iter().map(Uuid::to_string).collect();
            flags.push(ContentFlag::automated(
                submission.id,
                FlagType::DuplicateContent,
                FlagSeverity::Medium,
                ModerationCategory::Spam,
                format!(
                    "Duplicate content detected. Matches existing content: {}",
                    ids.join(", ")
                ),
                1.0,
            ));
        }

        let categories = if is_duplicate {
            vec![ModerationCategory::Spam]
        } else {
            Vec::new()
        };

        let result = ModerationResult::new(
            submission.id,
            ModerationType::FingerprintCheck,
            1.0,
            categories,
            json!({ "is_duplicate": is_duplicate, "matching_content": matching }),
        )
        .with_model(Self::MODEL);

        Ok(DetectorOutcome { result, flags })
    }
}

pub struct AgeVerificationDetector {
    registry: Arc<dyn VerificationRegistry>,
    config: AgeVerificationConfig,
}

impl AgeVerificationDetector {
    pub fn new(registry: Arc<dyn VerificationRegistry>, config: AgeVerificationConfig) -> Self {
        Self { registry, config }
    }
}

#[async_trait]
impl Detector for AgeVerificationDetector {
    fn name(&self) -> &'static str {
        "age_verification"
    }

    fn applies_to(&self, submission: &ContentSubmission) -> bool {
        self.config.applies_to(&submission.platform)
    }

    async fn inspect(&self, submission: &ContentSubmission) -> Result<DetectorOutcome> {
        let now = Utc::now();
        let verified_age = self
            .registry
            .age_verification(&submission.creator_id)
            .await?
            .filter(|record| record.is_valid_at(now))
            .map(|record| record.verified_age);

        let minimum = self.config.minimum_age;
        let verified = verified_age.is_some();
        let age = verified_age.unwrap_or(0);
        let underage = age < minimum;

        let mut flags = Vec::new();
        if underage {
            let reason = if verified {
                format!("Creator age {} below minimum {}", age, minimum)
            } else {
                "Creator age verification required".to_string()
            };
            flags.push(ContentFlag::automated(
                submission.id,
                FlagType::AgeRestriction,
                FlagSeverity::Critical,
                ModerationCategory::Underage,
                reason,
                1.0,
            ));
        }

        let categories = if underage {
            vec![ModerationCategory::Underage]
        } else {
            Vec::new()
        };

        let result = ModerationResult::new(
            submission.id,
            ModerationType::AgeVerification,
            1.0,
            categories,
            json!({
                "verified": verified,
                "verified_age": age,
                "minimum_required": minimum,
            }),
        );

        Ok(DetectorOutcome { result, flags })
    }
}

pub struct GeoRestrictionDetector {
    registry: Arc<dyn VerificationRegistry>,
    config: GeoblockingConfig,
}

impl GeoRestrictionDetector {
    pub fn new(registry: Arc<dyn VerificationRegistry>, config: GeoblockingConfig) -> Self {
        Self { registry, config }
    }
}

#[async_trait]
impl Detector for GeoRestrictionDetector {
    fn name(&self) -> &'static str {
        "geo_restriction"
    }

    async fn inspect(&self, submission: &ContentSubmission) -> Result<DetectorOutcome> {
        let location = submission.user_location();
        let restricted_location = location.filter(|country| self.config.is_restricted(country));

        let mut flags = Vec::new();
        if let Some(country) = restricted_location {
            flags.push(ContentFlag::automated(
                submission.id,
                FlagType::ContentViolation,
                FlagSeverity::High,
                ModerationCategory::IllegalContent,
                format!("Content restricted in country: {}", country),
                1.0,
            ));

            self.registry
                .put_geo_restriction(GeolocationRestriction {
                    content_id: submission.id,
                    restricted_countries: vec![country.to_ascii_uppercase()],
                    category: ModerationCategory::IllegalContent,
                    reason: "Geographic content restriction".to_string(),
                    applied_at: Utc::now(),
                })
                .await?;
        }

        let categories = if restricted_location.is_some() {
            vec![ModerationCategory::IllegalContent]
        } else {
            Vec::new()
        };

        let result = ModerationResult::new(
            submission.id,
            ModerationType::GeoRestriction,
            1.0,
            categories,
            json!({
                "user_location": location,
                "is_restricted": restricted_location.is_some(),
                "restricted_countries": self.config.restricted_countries,
                "restricted_categories": self.config.categories,
            }),
        );

        Ok(DetectorOutcome { result, flags })
    }
}

pub struct ContentAnalysisDetector {
    classifier: Arc<dyn ContentClassifier>,
    human_review_threshold: f64,
}

impl ContentAnalysisDetector {
    pub fn new(classifier: Arc<dyn ContentClassifier>, human_review_threshold: f64) -> Self {
        Self {
            classifier,
            human_review_threshold,
        }
    }
}

#[async_trait]
impl Detector for ContentAnalysisDetector {
    fn name(&self) -> &'static str {
        "ai_analysis"
    }

    async fn inspect(&self, submission: &ContentSubmission) -> Result<DetectorOutcome> {
        let analysis = self.classifier.classify(submission).await?;

        // Only categories scoring strictly above the review threshold are flagged
        let flags = analysis
            .scores
            .iter()
            .filter(|(_, score)| **score > self.human_review_threshold)
            .map(|(category, score)| {
                ContentFlag::automated(
                    submission.id,
                    FlagType::ContentViolation,
                    category.default_severity(),
                    *category,
                    format!(
                        "AI detected {} with confidence {:.2}",
                        category.as_str(),
                        score
                    ),
                    *score,
                )
            })
            .collect();

        let result = ModerationResult::new(
            submission.id,
            ModerationType::AiAnalysis,
            analysis.confidence,
            analysis.categories(),
            json!({
                "scores": analysis.scores,
                "detected_objects": analysis.detected_objects,
                "text_analysis": analysis.text_analysis,
                "risk_factors": analysis.risk_factors,
            }),
        )
        .with_model(analysis.model);

        Ok(DetectorOutcome { result, flags })
    }
}

/// Outcomes gathered before the chain finished or stopped at a failure
#[derive(Debug)]
pub struct ChainRun {
    pub outcomes: Vec<DetectorOutcome>,
    pub failure: Option<ModerationError>,
}

/// Ordered detectors with a per-detector time bound
pub struct DetectorChain {
    detectors: Vec<Arc<dyn Detector>>,
    timeout: Duration,
}

impl DetectorChain {
    pub fn new(detectors: Vec<Arc<dyn Detector>>, timeout: Duration) -> Self {
        Self { detectors, timeout }
    }

    /// The standard chain. Detectors switched off in `config` are left out.
    pub fn standard(
        config: &ModerationConfig,
        stores: &PipelineStores,
        classifier: Arc<dyn ContentClassifier>,
    ) -> Self {
        let mut detectors: Vec<Arc<dyn Detector>> = vec![
            Arc::new(FingerprintDetector::new(stores.fingerprints.clone())),
            Arc::new(AgeVerificationDetector::new(
                stores.verifications.clone(),
                config.age_verification.clone(),
            )),
        ];

        if config.geoblocking.enabled {
            detectors.push(Arc::new(GeoRestrictionDetector::new(
                stores.verifications.clone(),
                config.geoblocking.clone(),
            )));
        }

        if config.enable_auto_moderation {
            detectors.push(Arc::new(ContentAnalysisDetector::new(
                classifier,
                config.confidence.human_review,
            )));
        }

        Self::new(detectors, config.detector_timeout())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run every applicable detector in order, stopping at the first failure
    pub async fn run(&self, submission: &ContentSubmission) -> ChainRun {
        let mut outcomes = Vec::with_capacity(self.detectors.len());

        for detector in &self.detectors {
            if !detector.applies_to(submission) {
                tracing::debug!(
                    submission_id = %submission.id,
                    detector = detector.name(),
                    "Detector skipped"
                );
                continue;
            }

            let started = Instant::now();
            let outcome = tokio::time::timeout(self.timeout, detector.inspect(submission)).await;
            let elapsed = started.elapsed().as_secs_f64();

            let failure = match outcome {
                Ok(Ok(outcome)) => {
                    ModerationMetrics::record_detector(detector.name(), true, elapsed);
                    tracing::debug!(
                        submission_id = %submission.id,
                        detector = detector.name(),
                        flags = outcome.flags.len(),
                        confidence = outcome.result.confidence,
                        "Detector finished"
                    );
                    outcomes.push(outcome);
                    continue;
                }
                Ok(Err(e)) => ModerationError::DetectorFailure {
                    detector: detector.name().to_string(),
                    message: e.to_string(),
                },
                Err(_) => ModerationError::DetectorTimeout {
                    detector: detector.name().to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                },
            };

            ModerationMetrics::record_detector(detector.name(), false, elapsed);
            tracing::warn!(
                submission_id = %submission.id,
                detector = detector.name(),
                error = %failure,
                "Detector failed"
            );

            return ChainRun {
                outcomes,
                failure: Some(failure),
            };
        }

        ChainRun {
            outcomes,
            failure: None,
        }
    }
}
