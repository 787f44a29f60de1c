//! Storage seams for the moderation pipeline.
//!
//! Every store is a trait so the in-memory implementations used by the
//! service and by tests can be swapped for a real database.

use crate::error::Result;
use crate::models::{AgeVerificationRecord, ContentSubmission, GeolocationRestriction};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub mod fingerprints;
pub mod submissions;
pub mod verifications;

pub use fingerprints::InMemoryFingerprintIndex;
pub use submissions::InMemorySubmissionStore;
pub use verifications::InMemoryVerificationRegistry;

/// Mutation applied atomically to a stored submission. Returning an error
/// leaves the stored copy untouched.
pub type SubmissionUpdate = Box<dyn FnOnce(&mut ContentSubmission) -> Result<()> + Send>;

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<ContentSubmission>>;

    /// Insert or overwrite
    async fn put(&self, submission: ContentSubmission) -> Result<()>;

    /// Apply `update` and return the updated submission.
    /// Fails with `SubmissionNotFound` for unknown ids.
    async fn update(&self, id: Uuid, update: SubmissionUpdate) -> Result<ContentSubmission>;

    async fn scan(&self) -> Result<Vec<ContentSubmission>>;
}

#[async_trait]
pub trait FingerprintIndex: Send + Sync {
    /// Record `submission_id` under `hash` and return the ids registered
    /// under it before this one, in registration order. Re-registering an id
    /// is a no-op apart from the lookup.
    async fn register(&self, hash: &str, submission_id: Uuid) -> Result<Vec<Uuid>>;

    async fn lookup(&self, hash: &str) -> Result<Vec<Uuid>>;
}

#[async_trait]
pub trait VerificationRegistry: Send + Sync {
    async fn age_verification(&self, creator_id: &str) -> Result<Option<AgeVerificationRecord>>;

    /// Latest record wins
    async fn put_age_verification(&self, record: AgeVerificationRecord) -> Result<()>;

    async fn geo_restriction(&self, content_id: Uuid) -> Result<Option<GeolocationRestriction>>;

    async fn put_geo_restriction(&self, restriction: GeolocationRestriction) -> Result<()>;
}

/// The stores a pipeline runs against
#[derive(Clone)]
pub struct PipelineStores {
    pub submissions: Arc<dyn SubmissionStore>,
    pub fingerprints: Arc<dyn FingerprintIndex>,
    pub verifications: Arc<dyn VerificationRegistry>,
}

impl PipelineStores {
    pub fn in_memory() -> Self {
        Self {
            submissions: Arc::new(InMemorySubmissionStore::new()),
            fingerprints: Arc::new(InMemoryFingerprintIndex::new()),
            verifications: Arc::new(InMemoryVerificationRegistry::new()),
        }
    }
}
