//! In-memory content fingerprint index (hash -> submission ids)

use super::FingerprintIndex;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryFingerprintIndex {
    entries: DashMap<String, Vec<Uuid>>,
}

impl InMemoryFingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FingerprintIndex for InMemoryFingerprintIndex {
    async fn register(&self, hash: &str, submission_id: Uuid) -> Result<Vec<Uuid>> {
        let mut ids = self.entries.entry(hash.to_string()).or_default();

        match ids.iter().position(|id| *id == submission_id) {
            Some(position) => Ok(ids[..position].to_vec()),
            None => {
                let earlier = ids.clone();
                ids.push(submission_id);
                Ok(earlier)
            }
        }
    }

    async fn lookup(&self, hash: &str) -> Result<Vec<Uuid>> {
        Ok(self
            .entries
            .get(hash)
            .map(|ids| ids.value().clone())
            .unwrap_or_default())
    }
}
