use crate::error::{ModerationError, Result};
use crate::models::{ContentType, ModerationCategory};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub http_port: u16,

    // Worker configuration
    pub worker_poll_interval_ms: u64,

    // Classifier configuration
    pub classifier: ClassifierKind,
    pub sensitive_words_path: Option<String>,
    pub nsfw_model_path: String,

    // Moderation rules
    pub moderation: ModerationConfig,

    // Service configuration
    pub service_name: String,
    pub environment: String,
}

/// Which `ContentClassifier` backs the automated analysis step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    Heuristic,
    Random,
    Onnx,
}

impl FromStr for ClassifierKind {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "heuristic" => Ok(ClassifierKind::Heuristic),
            "random" => Ok(ClassifierKind::Random),
            "onnx" => Ok(ClassifierKind::Onnx),
            other => Err(ModerationError::Config(format!(
                "unknown classifier kind: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub enable_auto_moderation: bool,
    pub confidence: ConfidenceThresholds,
    pub content_types: ContentTypeToggles,
    pub age_verification: AgeVerificationConfig,
    pub geoblocking: GeoblockingConfig,
    /// Platforms whose review items are bumped in the human review queue
    pub sensitive_platforms: Vec<String>,
    pub detector_timeout_ms: u64,
    pub event_channel_capacity: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceThresholds {
    /// Not consulted by the decision engine; validated only
    pub auto_approve: f64,
    pub auto_reject: f64,
    pub human_review: f64,
}

/// Content types that go through moderation. Disabled types are approved
/// at intake.
#[derive(Debug, Clone, Copy)]
pub struct ContentTypeToggles {
    pub image: bool,
    pub video: bool,
    pub audio: bool,
    pub text: bool,
    pub livestream: bool,
    pub document: bool,
}

impl ContentTypeToggles {
    pub fn is_enabled(&self, content_type: ContentType) -> bool {
        match content_type {
            ContentType::Image => self.image,
            ContentType::Video => self.video,
            ContentType::Audio => self.audio,
            ContentType::Text => self.text,
            ContentType::Livestream => self.livestream,
            ContentType::Document => self.document,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgeVerificationConfig {
    /// Check every platform, not just `platforms`
    pub required: bool,
    pub minimum_age: u32,
    pub document_types: Vec<String>,
    pub platforms: Vec<String>,
}

impl AgeVerificationConfig {
    pub fn applies_to(&self, platform: &str) -> bool {
        self.required || self.platforms.iter().any(|p| p == platform)
    }
}

#[derive(Debug, Clone)]
pub struct GeoblockingConfig {
    pub enabled: bool,
    pub restricted_countries: Vec<String>,
    /// Categories the restriction covers, reported with every geo check
    pub categories: Vec<ModerationCategory>,
}

impl GeoblockingConfig {
    pub fn is_restricted(&self, country: &str) -> bool {
        self.restricted_countries
            .iter()
            .any(|restricted| restricted.eq_ignore_ascii_case(country))
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            enable_auto_moderation: true,
            confidence: ConfidenceThresholds {
                auto_approve: 0.95,
                auto_reject: 0.85,
                human_review: 0.7,
            },
            content_types: ContentTypeToggles {
                image: true,
                video: true,
                audio: true,
                text: true,
                livestream: true,
                document: true,
            },
            age_verification: AgeVerificationConfig {
                required: true,
                minimum_age: 18,
                document_types: to_strings(&["passport", "drivers_license", "national_id"]),
                platforms: to_strings(&["FanzEliteTube", "FanzHubVault", "FanzSpicyAi"]),
            },
            geoblocking: GeoblockingConfig {
                enabled: true,
                restricted_countries: to_strings(&["CN", "IR", "KP"]),
                categories: vec![ModerationCategory::ExplicitContent],
            },
            sensitive_platforms: to_strings(&["FanzEliteTube", "FanzHubVault"]),
            detector_timeout_ms: 5000,
            event_channel_capacity: 1024,
        }
    }
}

impl ModerationConfig {
    pub fn detector_timeout(&self) -> Duration {
        Duration::from_millis(self.detector_timeout_ms)
    }

    /// Reject configurations that would make decisions undefined
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("auto_approve", self.confidence.auto_approve),
            ("auto_reject", self.confidence.auto_reject),
            ("human_review", self.confidence.human_review),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(ModerationError::Config(format!(
                    "{} threshold must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.confidence.auto_reject < self.confidence.human_review {
            return Err(ModerationError::Config(format!(
                "auto_reject threshold ({}) must not be below human_review threshold ({})",
                self.confidence.auto_reject, self.confidence.human_review
            )));
        }

        if self.detector_timeout_ms == 0 {
            return Err(ModerationError::Config(
                "detector timeout must be greater than zero".to_string(),
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err(ModerationError::Config(
                "event channel capacity must be greater than zero".to_string(),
            ));
        }

        if self.age_verification.document_types.is_empty() {
            return Err(ModerationError::Config(
                "at least one accepted document type is required".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8086,
            worker_poll_interval_ms: 1000,
            classifier: ClassifierKind::Heuristic,
            sensitive_words_path: None,
            nsfw_model_path: "models/resnet50_nsfw.onnx".to_string(),
            moderation: ModerationConfig::default(),
            service_name: "content-moderation-service".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = ModerationConfig::default();
        let moderation = ModerationConfig {
            enable_auto_moderation: env_or("ENABLE_AUTO_MODERATION", true)?,
            confidence: ConfidenceThresholds {
                auto_approve: env_or("AUTO_APPROVE_THRESHOLD", defaults.confidence.auto_approve)?,
                auto_reject: env_or("AUTO_REJECT_THRESHOLD", defaults.confidence.auto_reject)?,
                human_review: env_or("HUMAN_REVIEW_THRESHOLD", defaults.confidence.human_review)?,
            },
            content_types: ContentTypeToggles {
                image: env_or("MODERATE_IMAGES", true)?,
                video: env_or("MODERATE_VIDEOS", true)?,
                audio: env_or("MODERATE_AUDIO", true)?,
                text: env_or("MODERATE_TEXT", true)?,
                livestream: env_or("MODERATE_LIVESTREAMS", true)?,
                document: env_or("MODERATE_DOCUMENTS", true)?,
            },
            age_verification: AgeVerificationConfig {
                required: env_or("AGE_VERIFICATION_REQUIRED", defaults.age_verification.required)?,
                minimum_age: env_or("MINIMUM_AGE", defaults.age_verification.minimum_age)?,
                document_types: env_list(
                    "ACCEPTED_DOCUMENT_TYPES",
                    defaults.age_verification.document_types,
                ),
                platforms: env_list(
                    "AGE_VERIFICATION_PLATFORMS",
                    defaults.age_verification.platforms,
                ),
            },
            geoblocking: GeoblockingConfig {
                enabled: env_or("GEOBLOCKING_ENABLED", defaults.geoblocking.enabled)?,
                restricted_countries: env_list(
                    "RESTRICTED_COUNTRIES",
                    defaults.geoblocking.restricted_countries,
                )
                .into_iter()
                .map(|country| country.to_ascii_uppercase())
                .collect(),
                categories: env_categories(
                    "GEOBLOCKED_CATEGORIES",
                    defaults.geoblocking.categories,
                )?,
            },
            sensitive_platforms: env_list("SENSITIVE_PLATFORMS", defaults.sensitive_platforms),
            detector_timeout_ms: env_or("DETECTOR_TIMEOUT_MS", defaults.detector_timeout_ms)?,
            event_channel_capacity: env_or(
                "EVENT_CHANNEL_CAPACITY",
                defaults.event_channel_capacity,
            )?,
        };

        let config = Self {
            http_port: env_or("HTTP_PORT", 8086)?,
            worker_poll_interval_ms: env_or("WORKER_POLL_INTERVAL_MS", 1000)?,
            classifier: env::var("CLASSIFIER")
                .unwrap_or_else(|_| "heuristic".to_string())
                .parse()?,
            sensitive_words_path: env::var("SENSITIVE_WORDS_PATH").ok(),
            nsfw_model_path: env::var("NSFW_MODEL_PATH")
                .unwrap_or_else(|_| "models/resnet50_nsfw.onnx".to_string()),
            moderation,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "content-moderation-service".to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_poll_interval_ms == 0 {
            return Err(ModerationError::Config(
                "worker poll interval must be greater than zero".to_string(),
            ));
        }
        self.moderation.validate()
    }

    pub fn worker_poll_interval(&self) -> Duration {
        Duration::from_millis(self.worker_poll_interval_ms)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ModerationError::Config(format!("invalid value for {}: {}", key, raw))),
        Err(_) => Ok(default),
    }
}

fn env_list(key: &str, default: Vec<String>) -> Vec<String> {
    match env::var(key) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => default,
    }
}

fn env_categories(
    key: &str,
    default: Vec<ModerationCategory>,
) -> Result<Vec<ModerationCategory>> {
    if env::var(key).is_err() {
        return Ok(default);
    }
    env_list(key, Vec::new())
        .into_iter()
        .map(|raw| {
            raw.to_ascii_lowercase()
                .parse()
                .map_err(|e| ModerationError::Config(format!("invalid value for {}: {}", key, e)))
        })
        .collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
