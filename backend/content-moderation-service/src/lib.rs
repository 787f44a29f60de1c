pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, ModerationConfig};
pub use error::{ModerationError, Result};
pub use models::{ContentStatus, ContentSubmission, ContentType, ModerationEvent};
pub use services::{spawn_worker, ContentClassifier, ModerationPipeline};
