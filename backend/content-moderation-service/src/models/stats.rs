use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::submission::{ContentStatus, ContentSubmission, ContentType};

/// Aggregate view over every submission the pipeline has seen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationStats {
    pub total_submissions: usize,
    pub by_status: BTreeMap<ContentStatus, usize>,
    pub by_platform: BTreeMap<String, usize>,
    pub by_type: BTreeMap<ContentType, usize>,
    pub pending_reviews: usize,
    /// Mean seconds between submission and review, over reviewed submissions
    pub average_processing_time_secs: u64,
}

impl ModerationStats {
    pub fn collect<'a>(
        submissions: impl IntoIterator<Item = &'a ContentSubmission>,
        pending_reviews: usize,
    ) -> Self {
        let mut by_status: BTreeMap<ContentStatus, usize> =
            ContentStatus::ALL.iter().map(|status| (*status, 0)).collect();
        let mut by_type: BTreeMap<ContentType, usize> =
            ContentType::ALL.iter().map(|kind| (*kind, 0)).collect();
        let mut by_platform: BTreeMap<String, usize> = BTreeMap::new();

        let mut total_submissions = 0;
        let mut total_review_ms: i64 = 0;
        let mut reviewed: i64 = 0;

        for submission in submissions {
            total_submissions += 1;
            *by_status.entry(submission.status).or_insert(0) += 1;
            *by_type.entry(submission.content_type).or_insert(0) += 1;
            *by_platform.entry(submission.platform.clone()).or_insert(0) += 1;

            if let Some(reviewed_at) = submission.reviewed_at {
                total_review_ms += (reviewed_at - submission.submitted_at).num_milliseconds();
                reviewed += 1;
            }
        }

        let average_processing_time_secs = if reviewed > 0 {
            (total_review_ms as f64 / reviewed as f64 / 1000.0)
                .round()
                .max(0.0) as u64
        } else {
            0
        };

        Self {
            total_submissions,
            by_status,
            by_platform,
            by_type,
            pending_reviews,
            average_processing_time_secs,
        }
    }
}
