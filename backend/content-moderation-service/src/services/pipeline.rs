//! The moderation pipeline: intake, automated processing and the human
//! facing gateways (review, reports, age verification, appeals).

use crate::config::ModerationConfig;
use crate::db::PipelineStores;
use crate::error::{ModerationError, Result};
use crate::metrics::ModerationMetrics;
use crate::models::{
    AgeVerificationRecord, AgeVerificationRequest, AppealRequest, ContentFlag, ContentStatus,
    ContentSubmission, FlagSource, FlagType, GeolocationRestriction, HumanReviewRequest,
    ModerationEvent, ModerationResult, ModerationStats, ModerationType, ReportContentRequest,
    ResolveFlagRequest, ReviewDecision, SubmitContentRequest, VerificationStatus,
    META_PROCESSING_ERROR, META_SUBMISSION_IP, META_USER_AGENT, META_USER_LOCATION,
};
use crate::services::age_verification::AgeVerificationService;
use crate::services::appeal_service::AppealService;
use crate::services::classifier::ContentClassifier;
use crate::services::decision::{Decision, DecisionEngine};
use crate::services::detectors::{ChainRun, DetectorChain};
use crate::services::fingerprint::{Fingerprinter, MetadataFingerprinter};
use crate::services::queue::ReviewQueue;
use crate::utils::hash_ip;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;
use validator::Validate;

/// Confidence recorded for user reports
const REPORT_CONFIDENCE: f64 = 0.8;

/// Client metadata keys consumed at intake
const CLIENT_IP_KEY: &str = "client_ip";
const CLIENT_USER_AGENT_KEY: &str = "user_agent";

pub struct ModerationPipeline {
    config: ModerationConfig,
    stores: PipelineStores,
    queue: ReviewQueue,
    chain: DetectorChain,
    engine: DecisionEngine,
    fingerprinter: Arc<dyn Fingerprinter>,
    age_verification: AgeVerificationService,
    appeals: AppealService,
    events: broadcast::Sender<ModerationEvent>,
}

impl ModerationPipeline {
    /// Build a pipeline with the standard detector chain. Fails on an
    /// invalid configuration.
    pub fn new(
        config: ModerationConfig,
        stores: PipelineStores,
        classifier: Arc<dyn ContentClassifier>,
    ) -> Result<Self> {
        config.validate()?;

        let chain = DetectorChain::standard(&config, &stores, classifier);
        let (events, _) = broadcast::channel(config.event_channel_capacity);

        tracing::info!(
            detectors = ?chain.names(),
            auto_moderation = config.enable_auto_moderation,
            "Moderation pipeline initialized"
        );

        Ok(Self {
            engine: DecisionEngine::new(&config),
            age_verification: AgeVerificationService::new(
                stores.verifications.clone(),
                config.age_verification.clone(),
            ),
            appeals: AppealService::new(stores.submissions.clone()),
            fingerprinter: Arc::new(MetadataFingerprinter),
            queue: ReviewQueue::new(),
            chain,
            config,
            stores,
            events,
        })
    }

    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    /// Replace the standard detector chain
    pub fn with_detectors(mut self, chain: DetectorChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModerationEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ModerationEvent) {
        let name = event.name();
        if self.events.send(event).is_err() {
            tracing::debug!(event = name, "No event subscribers");
        }
    }

    // ---------------------------------------------------------------------
    // Intake
    // ---------------------------------------------------------------------

    pub async fn submit_content(&self, request: SubmitContentRequest) -> Result<ContentSubmission> {
        request.validate()?;

        let content_hash = self.fingerprinter.fingerprint(&request);
        let metadata = intake_metadata(&request);

        let mut submission = ContentSubmission {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            creator_id: request.creator_id,
            platform: request.platform,
            content_type: request.content_type,
            url: request.url,
            thumbnail_url: request.thumbnail_url,
            title: request.title,
            description: request.description,
            tags: request.tags,
            content_hash,
            file_size: request.file_size,
            duration: request.duration,
            dimensions: request.dimensions,
            status: ContentStatus::Pending,
            moderation_results: Vec::new(),
            flags: Vec::new(),
            metadata,
            submitted_at: Utc::now(),
            reviewed_at: None,
            approved_at: None,
            rejected_at: None,
            appealed_at: None,
        };

        ModerationMetrics::record_submission(submission.content_type.as_str());

        if !self.config.content_types.is_enabled(submission.content_type) {
            submission.approve(submission.submitted_at);
            self.stores.submissions.put(submission.clone()).await?;

            ModerationMetrics::record_decision("approved", "intake");
            tracing::info!(
                submission_id = %submission.id,
                content_type = submission.content_type.as_str(),
                "Content type not moderated, approved at intake"
            );
            self.emit(ModerationEvent::ContentApproved {
                submission: submission.clone(),
                reviewer_id: None,
            });
            return Ok(submission);
        }

        self.stores.submissions.put(submission.clone()).await?;
        self.queue.push(submission.id).await;

        tracing::info!(
            submission_id = %submission.id,
            platform = %submission.platform,
            content_type = submission.content_type.as_str(),
            "Content submitted for moderation"
        );
        self.emit(ModerationEvent::ContentSubmitted {
            submission: submission.clone(),
        });

        Ok(submission)
    }

    // ---------------------------------------------------------------------
    // Automated processing
    // ---------------------------------------------------------------------

    pub async fn queue_depth(&self) -> usize {
        self.queue.len().await
    }

    /// Wait for an enqueue notification or `timeout`
    pub async fn wait_for_work(&self, timeout: Duration) {
        self.queue.wait(timeout).await
    }

    /// Process the next queued submission. Returns `false` when the queue
    /// was empty. Processing failures are recorded on the submission; only a
    /// store that cannot record them surfaces as `Err`.
    pub async fn process_next(&self) -> Result<bool> {
        let Some(submission_id) = self.queue.pop().await else {
            return Ok(false);
        };

        if let Err(e) = self.process_submission(submission_id).await {
            self.handle_processing_error(submission_id, &e).await?;
        }

        Ok(true)
    }

    /// Drain the queue; returns how many submissions were taken off it
    pub async fn process_pending(&self) -> Result<usize> {
        let mut processed = 0;
        while self.process_next().await? {
            processed += 1;
        }
        Ok(processed)
    }

    async fn process_submission(&self, submission_id: Uuid) -> Result<()> {
        let Some(current) = self.stores.submissions.get(submission_id).await? else {
            tracing::warn!(submission_id = %submission_id, "Queued submission no longer exists");
            return Ok(());
        };

        if !current.status.awaits_processing() {
            tracing::info!(
                submission_id = %submission_id,
                status = current.status.as_str(),
                "Submission already decided, skipping automated processing"
            );
            return Ok(());
        }

        let submission = self
            .stores
            .submissions
            .update(
                submission_id,
                Box::new(|submission| {
                    submission.mark_under_review();
                    Ok(())
                }),
            )
            .await?;

        tracing::info!(submission_id = %submission_id, "Processing submission");
        self.emit(ModerationEvent::ContentUnderReview {
            submission: submission.clone(),
        });

        let ChainRun { outcomes, failure } = self.chain.run(&submission).await;
        let decide = failure.is_none();

        let engine = self.engine.clone();
        let applied = Arc::new(AtomicBool::new(false));
        let applied_marker = applied.clone();
        let now = Utc::now();

        let updated = self
            .stores
            .submissions
            .update(
                submission_id,
                Box::new(move |submission| {
                    for outcome in outcomes {
                        submission.moderation_results.push(outcome.result);
                        submission.flags.extend(outcome.flags);
                    }

                    // A reviewer may have decided while the detectors ran
                    if decide && submission.status == ContentStatus::UnderReview {
                        let decision = engine.decide(submission);
                        apply_decision(submission, &decision, now);
                        applied_marker.store(true, Ordering::SeqCst);
                    }
                    Ok(())
                }),
            )
            .await?;

        if let Some(e) = failure {
            return Err(e);
        }

        if !applied.load(Ordering::SeqCst) {
            tracing::info!(
                submission_id = %submission_id,
                status = updated.status.as_str(),
                "Submission decided during processing, automated decision discarded"
            );
            return Ok(());
        }

        let decision = self.engine.decide(&updated);
        ModerationMetrics::record_decision(decision.outcome(), "automated");

        match decision {
            Decision::Approve => {
                tracing::info!(submission_id = %submission_id, "Content approved");
                self.emit(ModerationEvent::ContentApproved {
                    submission: updated,
                    reviewer_id: None,
                });
            }
            Decision::Reject { reason, confidence } => {
                tracing::info!(
                    submission_id = %submission_id,
                    reason = %reason,
                    confidence,
                    "Content rejected"
                );
                let flags = updated.flags.clone();
                self.emit(ModerationEvent::ContentRejected {
                    submission: updated,
                    reason,
                    flags,
                    confidence: Some(confidence),
                    reviewer_id: None,
                });
            }
            Decision::HumanReview { priority } => {
                tracing::info!(
                    submission_id = %submission_id,
                    priority,
                    flags = updated.flags.len(),
                    "Content needs human review"
                );
                self.emit(ModerationEvent::ContentNeedsHumanReview {
                    submission: updated,
                    priority,
                });
            }
        }

        Ok(())
    }

    /// Note the error on a failed submission and park it in UNDER_REVIEW.
    /// A decision made while the chain was running is kept.
    async fn handle_processing_error(
        &self,
        submission_id: Uuid,
        error: &ModerationError,
    ) -> Result<()> {
        ModerationMetrics::record_processing_error();
        tracing::error!(
            submission_id = %submission_id,
            error = %error,
            "Content processing failed"
        );

        let message = error.to_string();
        let submission = self
            .stores
            .submissions
            .update(
                submission_id,
                Box::new(move |submission| {
                    if submission.status.awaits_processing() {
                        submission.mark_under_review();
                    }
                    submission
                        .metadata
                        .insert(META_PROCESSING_ERROR.to_string(), json!(message));
                    Ok(())
                }),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    submission_id = %submission_id,
                    error = %e,
                    "Failed to record processing error"
                );
                e
            })?;

        self.emit(ModerationEvent::ContentProcessingError {
            submission,
            error: error.to_string(),
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Gateways
    // ---------------------------------------------------------------------

    /// Record a reviewer's final decision. Overrides any automated outcome.
    pub async fn submit_human_review(&self, request: HumanReviewRequest) -> Result<bool> {
        request.validate()?;

        let submission_id = request.submission_id;
        let decision = request.decision;
        let reviewer_id = request.reviewer_id.clone();
        let confidence = request.confidence.unwrap_or(1.0);
        let result = ModerationResult::new(
            submission_id,
            ModerationType::HumanReview,
            confidence,
            request.categories,
            json!({ "decision": decision.as_str(), "notes": request.notes }),
        )
        .with_reviewer(request.reviewer_id, request.notes);

        let now = Utc::now();
        let updated = self
            .stores
            .submissions
            .update(
                submission_id,
                Box::new(move |submission| {
                    submission.moderation_results.push(result);
                    submission.reviewed_at = Some(now);
                    match decision {
                        ReviewDecision::Approve => submission.approve(now),
                        ReviewDecision::Reject => submission.reject(now),
                    }
                    Ok(())
                }),
            )
            .await?;

        let outcome = match decision {
            ReviewDecision::Approve => "approved",
            ReviewDecision::Reject => "rejected",
        };
        ModerationMetrics::record_decision(outcome, "human");
        tracing::info!(
            submission_id = %submission_id,
            reviewer_id = %reviewer_id,
            decision = decision.as_str(),
            "Human review recorded"
        );

        match decision {
            ReviewDecision::Approve => self.emit(ModerationEvent::ContentApproved {
                submission: updated,
                reviewer_id: Some(reviewer_id),
            }),
            ReviewDecision::Reject => {
                let flags = updated.flags.clone();
                self.emit(ModerationEvent::ContentRejected {
                    submission: updated,
                    reason: "Human review rejection".to_string(),
                    flags,
                    confidence: Some(confidence),
                    reviewer_id: Some(reviewer_id),
                });
            }
        }

        Ok(true)
    }

    /// File a user report. Severe reports against approved content send it
    /// back through automated processing. Returns the new flag id.
    pub async fn report_content(&self, request: ReportContentRequest) -> Result<Uuid> {
        request.validate()?;

        let content_id = request.content_id;
        let mut flag = ContentFlag::new(
            content_id,
            FlagType::ContentViolation,
            request.severity,
            request.category,
            request.reason,
            REPORT_CONFIDENCE,
            FlagSource::UserReport,
        );
        flag.reporter_id = Some(request.reporter_id.clone());
        let flag_id = flag.id;
        let severity = flag.severity;

        let reopened = Arc::new(AtomicBool::new(false));
        let reopened_marker = reopened.clone();

        self.stores
            .submissions
            .update(
                content_id,
                Box::new(move |submission| {
                    submission.flags.push(flag);
                    if submission.status == ContentStatus::Approved && severity.is_severe() {
                        submission.mark_under_review();
                        reopened_marker.store(true, Ordering::SeqCst);
                    }
                    Ok(())
                }),
            )
            .await?;

        if reopened.load(Ordering::SeqCst) {
            self.queue.push(content_id).await;
            tracing::warn!(
                content_id = %content_id,
                severity = severity.as_str(),
                "Approved content reopened after report"
            );
        }

        tracing::info!(
            content_id = %content_id,
            reporter_id = %request.reporter_id,
            category = request.category.as_str(),
            severity = severity.as_str(),
            "Content reported"
        );
        self.emit(ModerationEvent::ContentReported {
            content_id,
            flag_id,
            reporter_id: request.reporter_id,
            category: request.category,
            severity,
        });

        Ok(flag_id)
    }

    pub async fn submit_age_verification(
        &self,
        request: AgeVerificationRequest,
    ) -> Result<VerificationStatus> {
        let record = self.age_verification.submit(&request).await?;

        self.emit(ModerationEvent::AgeVerificationSubmitted {
            user_id: record.user_id,
            status: record.status,
            age: record.verified_age,
        });

        Ok(record.status)
    }

    /// Move a rejected submission to APPEALED for another human review
    pub async fn appeal_submission(&self, request: AppealRequest) -> Result<ContentSubmission> {
        let appealed = self.appeals.submit_appeal(&request).await?;

        self.emit(ModerationEvent::ContentAppealed {
            submission: appealed.clone(),
            reason: request.reason,
        });

        Ok(appealed.sanitized())
    }

    /// Mark a flag as handled. The submission's status is left alone.
    pub async fn resolve_flag(&self, request: ResolveFlagRequest) -> Result<ContentFlag> {
        request.validate()?;

        let submission_id = request.submission_id;
        let flag_id = request.flag_id;
        let resolution = request.resolution;

        let updated = self
            .stores
            .submissions
            .update(
                submission_id,
                Box::new(move |submission| {
                    submission
                        .flag_mut(flag_id)
                        .ok_or(ModerationError::FlagNotFound {
                            submission_id,
                            flag_id,
                        })?
                        .resolve(resolution);
                    Ok(())
                }),
            )
            .await?;

        let flag = updated
            .flag(flag_id)
            .cloned()
            .ok_or(ModerationError::FlagNotFound {
                submission_id,
                flag_id,
            })?;

        tracing::info!(
            submission_id = %submission_id,
            flag_id = %flag_id,
            resolved_by = %request.resolved_by,
            "Flag resolved"
        );
        self.emit(ModerationEvent::FlagResolved {
            content_id: submission_id,
            flag_id,
            resolved_by: request.resolved_by,
        });

        Ok(flag)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Submission with submitter fingerprint fields removed
    pub async fn get_submission(&self, id: Uuid) -> Result<Option<ContentSubmission>> {
        Ok(self
            .stores
            .submissions
            .get(id)
            .await?
            .map(|submission| submission.sanitized()))
    }

    /// A user's submissions, newest first
    pub async fn get_user_submissions(
        &self,
        user_id: &str,
        status: Option<ContentStatus>,
    ) -> Result<Vec<ContentSubmission>> {
        let mut submissions: Vec<ContentSubmission> = self
            .stores
            .submissions
            .scan()
            .await?
            .into_iter()
            .filter(|submission| submission.user_id == user_id)
            .filter(|submission| status.map_or(true, |status| submission.status == status))
            .map(|submission| submission.sanitized())
            .collect();

        submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(submissions)
    }

    pub async fn get_moderation_stats(&self) -> Result<ModerationStats> {
        let submissions = self.stores.submissions.scan().await?;
        Ok(ModerationStats::collect(
            &submissions,
            self.queue.len().await,
        ))
    }

    pub async fn get_age_verification(
        &self,
        creator_id: &str,
    ) -> Result<Option<AgeVerificationRecord>> {
        self.age_verification.lookup(creator_id).await
    }

    pub async fn get_geo_restriction(
        &self,
        content_id: Uuid,
    ) -> Result<Option<GeolocationRestriction>> {
        self.stores.verifications.geo_restriction(content_id).await
    }
}

fn apply_decision(submission: &mut ContentSubmission, decision: &Decision, at: DateTime<Utc>) {
    match decision {
        Decision::Approve => {
            submission.approve(at);
            submission.reviewed_at = Some(at);
        }
        Decision::Reject { .. } => {
            submission.reject(at);
            submission.reviewed_at = Some(at);
        }
        Decision::HumanReview { .. } => submission.mark_under_review(),
    }
}

/// Client metadata plus location and hashed submitter details. The raw
/// client IP never reaches the store.
fn intake_metadata(request: &SubmitContentRequest) -> Map<String, Value> {
    let mut metadata = request.metadata.clone();

    let client_ip = metadata
        .remove(CLIENT_IP_KEY)
        .and_then(|value| value.as_str().map(str::to_string));
    let user_agent = metadata
        .remove(CLIENT_USER_AGENT_KEY)
        .and_then(|value| value.as_str().map(str::to_string));

    if let Some(location) = &request.user_location {
        metadata.insert(
            META_USER_LOCATION.to_string(),
            json!(location.to_ascii_uppercase()),
        );
    }
    metadata.insert(
        META_SUBMISSION_IP.to_string(),
        json!(hash_ip(client_ip.as_deref().unwrap_or("unknown"))),
    );
    metadata.insert(
        META_USER_AGENT.to_string(),
        json!(user_agent.unwrap_or_else(|| "unknown".to_string())),
    );

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemorySubmissionStore, SubmissionStore, SubmissionUpdate};
    use crate::models::{ContentType, FlagSeverity, ModerationCategory};
    use crate::services::classifier::{ClassifierAnalysis, MockContentClassifier};
    use crate::services::detectors::{Detector, DetectorOutcome};
    use async_trait::async_trait;

    /// Fails every inspection after `delay`
    struct StallingDetector {
        delay: Duration,
    }

    #[async_trait]
    impl Detector for StallingDetector {
        fn name(&self) -> &'static str {
            "stalling"
        }

        async fn inspect(&self, _submission: &ContentSubmission) -> Result<DetectorOutcome> {
            tokio::time::sleep(self.delay).await;
            Err(ModerationError::Internal("upstream unavailable".to_string()))
        }
    }

    /// Accepts writes but rejects every update
    struct ReadOnlySubmissionStore {
        inner: InMemorySubmissionStore,
    }

    #[async_trait]
    impl SubmissionStore for ReadOnlySubmissionStore {
        async fn get(&self, id: Uuid) -> Result<Option<ContentSubmission>> {
            self.inner.get(id).await
        }

        async fn put(&self, submission: ContentSubmission) -> Result<()> {
            self.inner.put(submission).await
        }

        async fn update(&self, _id: Uuid, _update: SubmissionUpdate) -> Result<ContentSubmission> {
            Err(ModerationError::Internal("store is read-only".to_string()))
        }

        async fn scan(&self) -> Result<Vec<ContentSubmission>> {
            self.inner.scan().await
        }
    }

    fn quiet_config() -> ModerationConfig {
        let mut config = ModerationConfig::default();
        config.age_verification.required = false;
        config.geoblocking.enabled = false;
        config
    }

    fn classifier_with_confidence(confidence: f64) -> Arc<MockContentClassifier> {
        let mut classifier = MockContentClassifier::new();
        classifier.expect_classify().returning(move |_| {
            let mut analysis = ClassifierAnalysis::new("mock-v1");
            if confidence > 0.1 {
                analysis.score(ModerationCategory::Misinformation, confidence);
            }
            Ok(analysis)
        });
        Arc::new(classifier)
    }

    fn pipeline(config: ModerationConfig, confidence: f64) -> ModerationPipeline {
        ModerationPipeline::new(
            config,
            PipelineStores::in_memory(),
            classifier_with_confidence(confidence),
        )
        .unwrap()
    }

    fn request() -> SubmitContentRequest {
        SubmitContentRequest::new(
            "user-1",
            "creator-1",
            "FanzTube",
            ContentType::Image,
            "http://x/1.jpg",
            2048,
        )
        .with_title("t")
        .with_description("d")
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = ModerationConfig::default();
        config.confidence.auto_reject = 0.5;

        let result = ModerationPipeline::new(
            config,
            PipelineStores::in_memory(),
            Arc::new(MockContentClassifier::new()),
        );
        assert!(matches!(result, Err(ModerationError::Config(_))));
    }

    #[test]
    fn test_intake_metadata_hashes_ip() {
        let mut request = request().with_location("kp");
        request
            .metadata
            .insert("client_ip".to_string(), json!("203.0.113.7"));
        request
            .metadata
            .insert("campaign".to_string(), json!("spring"));

        let metadata = intake_metadata(&request);
        assert_eq!(metadata[META_USER_LOCATION], json!("KP"));
        assert_eq!(metadata[META_SUBMISSION_IP], json!(hash_ip("203.0.113.7")));
        assert_eq!(metadata[META_USER_AGENT], json!("unknown"));
        assert_eq!(metadata["campaign"], json!("spring"));
        assert!(!metadata.contains_key("client_ip"));
    }

    #[test]
    fn test_intake_metadata_hashes_missing_ip() {
        let metadata = intake_metadata(&request());
        let token = metadata[META_SUBMISSION_IP].as_str().unwrap();
        assert_eq!(token, hash_ip("unknown"));
        assert_eq!(token.len(), 16);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_submit_enqueues_pending_submission() {
        let pipeline = pipeline(quiet_config(), 0.1);
        let mut events = pipeline.subscribe();

        let submission = pipeline.submit_content(request()).await.unwrap();
        assert_eq!(submission.status, ContentStatus::Pending);
        assert_eq!(pipeline.queue_depth().await, 1);

        let event = events.recv().await.unwrap();
        assert_eq!(event.name(), "contentSubmitted");
        assert_eq!(event.content_id(), Some(submission.id));
    }

    #[tokio::test]
    async fn test_invalid_request_stores_nothing() {
        let pipeline = pipeline(quiet_config(), 0.1);
        let mut bad = request();
        bad.url = "not a url".to_string();

        let result = pipeline.submit_content(bad).await;
        assert!(matches!(result, Err(ModerationError::Validation(_))));
        assert_eq!(pipeline.queue_depth().await, 0);
        assert_eq!(
            pipeline.get_moderation_stats().await.unwrap().total_submissions,
            0
        );
    }

    #[tokio::test]
    async fn test_disabled_content_type_is_approved_at_intake() {
        let mut config = quiet_config();
        config.content_types.image = false;
        let pipeline = pipeline(config, 0.1);

        let submission = pipeline.submit_content(request()).await.unwrap();
        assert_eq!(submission.status, ContentStatus::Approved);
        assert!(submission.approved_at.is_some());
        assert_eq!(pipeline.queue_depth().await, 0);
    }

    #[tokio::test]
    async fn test_processing_moves_through_under_review_to_decision() {
        let pipeline = pipeline(quiet_config(), 0.1);
        let mut events = pipeline.subscribe();
        let submission = pipeline.submit_content(request()).await.unwrap();

        assert!(pipeline.process_next().await.unwrap());
        assert!(!pipeline.process_next().await.unwrap());

        let names: Vec<&str> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|event| event.name())
            .collect();
        assert_eq!(
            names,
            vec!["contentSubmitted", "contentUnderReview", "contentApproved"]
        );

        let stored = pipeline.get_submission(submission.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContentStatus::Approved);
        assert!(stored.reviewed_at.is_some());
        assert_eq!(stored.moderation_results.len(), 2);
    }

    #[tokio::test]
    async fn test_middle_confidence_needs_human_review() {
        let pipeline = pipeline(quiet_config(), 0.75);
        let mut events = pipeline.subscribe();
        let submission = pipeline.submit_content(request()).await.unwrap();
        pipeline.process_pending().await.unwrap();

        let stored = pipeline.get_submission(submission.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContentStatus::UnderReview);
        assert!(stored.reviewed_at.is_none());

        let last = std::iter::from_fn(|| events.try_recv().ok()).last().unwrap();
        match last {
            // one MEDIUM flag: 10 + 20
            ModerationEvent::ContentNeedsHumanReview { priority, .. } => assert_eq!(priority, 30),
            other => panic!("unexpected event: {}", other.name()),
        }
    }

    #[tokio::test]
    async fn test_classifier_failure_is_isolated() {
        let mut classifier = MockContentClassifier::new();
        classifier
            .expect_classify()
            .returning(|_| Err(ModerationError::Classifier("model offline".to_string())));
        let pipeline = ModerationPipeline::new(
            quiet_config(),
            PipelineStores::in_memory(),
            Arc::new(classifier),
        )
        .unwrap();

        let submission = pipeline.submit_content(request()).await.unwrap();
        assert!(pipeline.process_next().await.unwrap());

        let stored = pipeline.get_submission(submission.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContentStatus::UnderReview);
        let error = stored.metadata[META_PROCESSING_ERROR].as_str().unwrap();
        assert!(error.contains("model offline"));
        // fingerprint result survives the failure
        assert_eq!(stored.moderation_results.len(), 1);
    }

    #[tokio::test]
    async fn test_human_decision_survives_late_detector_failure() {
        let detectors: Vec<Arc<dyn Detector>> = vec![Arc::new(StallingDetector {
            delay: Duration::from_millis(200),
        })];
        let pipeline = Arc::new(
            pipeline(quiet_config(), 0.1)
                .with_detectors(DetectorChain::new(detectors, Duration::from_secs(5))),
        );
        let mut events = pipeline.subscribe();
        let submission = pipeline.submit_content(request()).await.unwrap();

        let worker = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.process_next().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        pipeline
            .submit_human_review(HumanReviewRequest {
                submission_id: submission.id,
                reviewer_id: "mod-1".to_string(),
                decision: ReviewDecision::Approve,
                categories: Vec::new(),
                notes: None,
                confidence: None,
            })
            .await
            .unwrap();
        assert!(worker.await.unwrap().unwrap());

        let stored = pipeline.get_submission(submission.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContentStatus::Approved);
        assert!(stored.approved_at.is_some());
        assert!(stored.metadata[META_PROCESSING_ERROR]
            .as_str()
            .unwrap()
            .contains("upstream unavailable"));

        let names: Vec<&str> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|event| event.name())
            .collect();
        assert_eq!(names.last(), Some(&"contentProcessingError"));
    }

    #[tokio::test]
    async fn test_unrecordable_failure_is_returned() {
        let stores = PipelineStores {
            submissions: Arc::new(ReadOnlySubmissionStore {
                inner: InMemorySubmissionStore::new(),
            }),
            ..PipelineStores::in_memory()
        };
        let pipeline =
            ModerationPipeline::new(quiet_config(), stores, classifier_with_confidence(0.1))
                .unwrap();
        let submission = pipeline.submit_content(request()).await.unwrap();

        assert!(matches!(
            pipeline.process_next().await,
            Err(ModerationError::Internal(_))
        ));
        // the submission was taken off the queue either way
        assert_eq!(pipeline.queue_depth().await, 0);
        let stored = pipeline.get_submission(submission.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContentStatus::Pending);
    }

    #[tokio::test]
    async fn test_human_review_overrides_queued_submission() {
        let pipeline = pipeline(quiet_config(), 0.99);
        let submission = pipeline.submit_content(request()).await.unwrap();

        pipeline
            .submit_human_review(HumanReviewRequest {
                submission_id: submission.id,
                reviewer_id: "mod-1".to_string(),
                decision: ReviewDecision::Approve,
                categories: Vec::new(),
                notes: Some("fine".to_string()),
                confidence: None,
            })
            .await
            .unwrap();
        pipeline.process_pending().await.unwrap();

        let stored = pipeline.get_submission(submission.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContentStatus::Approved);
        let human = stored.moderation_results.last().unwrap();
        assert_eq!(human.kind, ModerationType::HumanReview);
        assert_eq!(human.confidence, 1.0);
        assert_eq!(human.reviewer_id.as_deref(), Some("mod-1"));
    }

    #[tokio::test]
    async fn test_human_review_unknown_submission() {
        let pipeline = pipeline(quiet_config(), 0.1);
        let result = pipeline
            .submit_human_review(HumanReviewRequest {
                submission_id: Uuid::new_v4(),
                reviewer_id: "mod-1".to_string(),
                decision: ReviewDecision::Reject,
                categories: Vec::new(),
                notes: None,
                confidence: None,
            })
            .await;
        assert!(matches!(result, Err(ModerationError::SubmissionNotFound(_))));
    }

    #[tokio::test]
    async fn test_report_records_user_flag() {
        let pipeline = pipeline(quiet_config(), 0.1);
        let submission = pipeline.submit_content(request()).await.unwrap();

        let flag_id = pipeline
            .report_content(ReportContentRequest {
                content_id: submission.id,
                reporter_id: "viewer-9".to_string(),
                category: ModerationCategory::Harassment,
                reason: "Targets a specific person".to_string(),
                severity: FlagSeverity::Medium,
            })
            .await
            .unwrap();

        let stored = pipeline.get_submission(submission.id).await.unwrap().unwrap();
        let flag = stored.flag(flag_id).unwrap();
        assert_eq!(flag.source, FlagSource::UserReport);
        assert_eq!(flag.confidence, REPORT_CONFIDENCE);
        assert_eq!(flag.reporter_id.as_deref(), Some("viewer-9"));
    }

    #[tokio::test]
    async fn test_resolve_flag() {
        let pipeline = pipeline(quiet_config(), 0.1);
        let submission = pipeline.submit_content(request()).await.unwrap();
        let flag_id = pipeline
            .report_content(ReportContentRequest {
                content_id: submission.id,
                reporter_id: "viewer-9".to_string(),
                category: ModerationCategory::Spam,
                reason: "Looks like spam".to_string(),
                severity: FlagSeverity::Low,
            })
            .await
            .unwrap();

        let flag = pipeline
            .resolve_flag(ResolveFlagRequest {
                submission_id: submission.id,
                flag_id,
                resolved_by: "mod-1".to_string(),
                resolution: "Not spam".to_string(),
            })
            .await
            .unwrap();
        assert!(flag.resolved);
        assert_eq!(flag.resolution.as_deref(), Some("Not spam"));

        let missing = pipeline
            .resolve_flag(ResolveFlagRequest {
                submission_id: submission.id,
                flag_id: Uuid::new_v4(),
                resolved_by: "mod-1".to_string(),
                resolution: "n/a".to_string(),
            })
            .await;
        assert!(matches!(missing, Err(ModerationError::FlagNotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_submission_is_sanitized() {
        let pipeline = pipeline(quiet_config(), 0.1);
        let mut request = request();
        request
            .metadata
            .insert("user_agent".to_string(), json!("curl/8.0"));
        let submission = pipeline.submit_content(request).await.unwrap();

        assert!(submission.metadata.contains_key(META_USER_AGENT));
        let stored = pipeline.get_submission(submission.id).await.unwrap().unwrap();
        assert!(!stored.metadata.contains_key(META_SUBMISSION_IP));
        assert!(!stored.metadata.contains_key(META_USER_AGENT));
    }
}
