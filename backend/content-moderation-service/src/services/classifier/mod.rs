//! Automated content classifiers used by the AI analysis detector

use crate::config::{ClassifierKind, Config};
use crate::error::Result;
use crate::models::{ContentSubmission, ModerationCategory};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod heuristic;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod random;

pub use heuristic::HeuristicClassifier;
#[cfg(feature = "onnx")]
pub use onnx::OnnxImageClassifier;
pub use random::RandomClassifier;

/// Lowest confidence ever reported by a classifier
pub const BASE_CONFIDENCE: f64 = 0.1;

/// Output of a single classification run
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierAnalysis {
    pub model: String,
    pub confidence: f64,
    pub scores: BTreeMap<ModerationCategory, f64>,
    pub detected_objects: Vec<String>,
    pub text_analysis: serde_json::Value,
    pub risk_factors: Vec<String>,
}

impl ClassifierAnalysis {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            confidence: BASE_CONFIDENCE,
            scores: BTreeMap::new(),
            detected_objects: Vec::new(),
            text_analysis: serde_json::Value::Null,
            risk_factors: Vec::new(),
        }
    }

    /// Record a category score, keeping the higher one on repeats.
    /// Confidence follows the strongest score.
    pub fn score(&mut self, category: ModerationCategory, score: f64) {
        let score = score.clamp(0.0, 1.0);
        let entry = self.scores.entry(category).or_insert(0.0);
        *entry = entry.max(score);
        self.confidence = self
            .scores
            .values()
            .copied()
            .fold(BASE_CONFIDENCE, f64::max);
    }

    pub fn categories(&self) -> Vec<ModerationCategory> {
        self.scores.keys().copied().collect()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    async fn classify(&self, submission: &ContentSubmission) -> Result<ClassifierAnalysis>;
}

/// Build the classifier selected in configuration
pub fn build_classifier(config: &Config) -> Result<Arc<dyn ContentClassifier>> {
    match config.classifier {
        ClassifierKind::Heuristic => {
            let classifier = match &config.sensitive_words_path {
                Some(path) => HeuristicClassifier::new(path)?,
                None => HeuristicClassifier::with_default_words(),
            };
            Ok(Arc::new(classifier))
        }
        ClassifierKind::Random => Ok(Arc::new(RandomClassifier::new())),
        #[cfg(feature = "onnx")]
        ClassifierKind::Onnx => Ok(Arc::new(OnnxImageClassifier::new(&config.nsfw_model_path)?)),
        #[cfg(not(feature = "onnx"))]
        ClassifierKind::Onnx => Err(crate::error::ModerationError::Config(
            "onnx classifier requires the `onnx` feature".to_string(),
        )),
    }
}
