pub mod age_verification;
pub mod appeal_service;
pub mod classifier;
pub mod decision;
pub mod detectors;
pub mod fingerprint;
pub mod pipeline;
pub mod queue;
pub mod worker;

pub use age_verification::AgeVerificationService;
pub use appeal_service::AppealService;
pub use classifier::{build_classifier, ClassifierAnalysis, ContentClassifier};
pub use decision::{Decision, DecisionEngine};
pub use detectors::{ChainRun, Detector, DetectorChain, DetectorOutcome};
pub use fingerprint::{Fingerprinter, MetadataFingerprinter};
pub use pipeline::ModerationPipeline;
pub use queue::ReviewQueue;
pub use worker::{run_worker, spawn_worker};
