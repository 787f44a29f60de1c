use super::{ClassifierAnalysis, ContentClassifier};
use crate::error::{ModerationError, Result};
use crate::models::{ContentSubmission, ModerationCategory};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::sync::Mutex;

const MODEL_ID: &str = "fanz-moderation-v2.1";

/// Demo classifier producing random scores. Not for production use.
pub struct RandomClassifier {
    rng: Mutex<StdRng>,
}

impl Default for RandomClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomClassifier {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence of analyses
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

#[async_trait]
impl ContentClassifier for RandomClassifier {
    async fn classify(&self, submission: &ContentSubmission) -> Result<ClassifierAnalysis> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| ModerationError::Internal(format!("Failed to lock rng: {}", e)))?;

        let mut analysis = ClassifierAnalysis::new(MODEL_ID);
        let risk: f64 = rng.gen();

        if risk > 0.9 {
            analysis.score(
                ModerationCategory::ExplicitContent,
                0.85 + rng.gen::<f64>() * 0.15,
            );
            analysis.detected_objects.push("adult_content".to_string());
            analysis
                .risk_factors
                .push("high_risk_visual_content".to_string());
        }

        if risk > 0.95 {
            analysis.score(ModerationCategory::Violence, 0.75 + rng.gen::<f64>() * 0.25);
            analysis
                .risk_factors
                .push("violent_imagery_detected".to_string());
        }

        let sentiment = if rng.gen::<f64>() > 0.5 {
            "positive"
        } else {
            "negative"
        };
        let toxicity: f64 = rng.gen();

        if toxicity > 0.8 {
            analysis.score(ModerationCategory::HateSpeech, toxicity);
            analysis
                .risk_factors
                .push("toxic_language_detected".to_string());
        }

        analysis.text_analysis = json!({
            "sentiment": sentiment,
            "toxicity": toxicity,
            "language": "en",
            "keywords": submission.tags,
        });

        Ok(analysis)
    }
}
