use crate::config::ModerationConfig;
use crate::models::{ContentFlag, ContentSubmission};

/// Outcome of automated moderation for one submission
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Approve,
    Reject { reason: String, confidence: f64 },
    HumanReview { priority: u32 },
}

impl Decision {
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Approve => "approved",
            Decision::Reject { .. } => "rejected",
            Decision::HumanReview { .. } => "human_review",
        }
    }
}

/// Turns accumulated results and flags into a decision
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    human_review_threshold: f64,
    auto_reject_threshold: f64,
    sensitive_platforms: Vec<String>,
}

impl DecisionEngine {
    pub fn new(config: &ModerationConfig) -> Self {
        Self {
            human_review_threshold: config.confidence.human_review,
            auto_reject_threshold: config.confidence.auto_reject,
            sensitive_platforms: config.sensitive_platforms.clone(),
        }
    }

    pub fn decide(&self, submission: &ContentSubmission) -> Decision {
        let highest_confidence = submission.highest_confidence();
        let forcing_flags: Vec<&ContentFlag> = submission
            .flags
            .iter()
            .filter(|flag| flag.severity.is_severe() || flag.category.forces_rejection())
            .collect();

        // Severe flags override any confidence score
        if !forcing_flags.is_empty() {
            let reasons: Vec<&str> = forcing_flags
                .iter()
                .map(|flag| flag.reason.as_str())
                .collect();
            return Decision::Reject {
                reason: reasons.join("; "),
                confidence: highest_confidence,
            };
        }

        if highest_confidence < self.human_review_threshold && submission.flags.is_empty() {
            return Decision::Approve;
        }

        if highest_confidence >= self.auto_reject_threshold {
            return Decision::Reject {
                reason: format!(
                    "Automated confidence {:.2} at or above rejection threshold {:.2}",
                    highest_confidence, self.auto_reject_threshold
                ),
                confidence: highest_confidence,
            };
        }

        Decision::HumanReview {
            priority: self.review_priority(submission),
        }
    }

    /// 10 per flag, plus severity weights, plus 25 on sensitive platforms
    pub fn review_priority(&self, submission: &ContentSubmission) -> u32 {
        let flag_count = submission.flags.len() as u32;
        let severity_weight: u32 = submission
            .flags
            .iter()
            .map(|flag| flag.severity.priority_weight())
            .sum();
        let platform_bonus = if self
            .sensitive_platforms
            .iter()
            .any(|platform| *platform == submission.platform)
        {
            25
        } else {
            0
        };

        flag_count * 10 + severity_weight + platform_bonus
    }
}
