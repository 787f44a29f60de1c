//! In-memory age verification and geo restriction registry

use super::VerificationRegistry;
use crate::error::Result;
use crate::models::{AgeVerificationRecord, GeolocationRestriction};
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryVerificationRegistry {
    age_verifications: DashMap<String, AgeVerificationRecord>,
    geo_restrictions: DashMap<Uuid, GeolocationRestriction>,
}

impl InMemoryVerificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationRegistry for InMemoryVerificationRegistry {
    async fn age_verification(&self, creator_id: &str) -> Result<Option<AgeVerificationRecord>> {
        Ok(self
            .age_verifications
            .get(creator_id)
            .map(|entry| entry.value().clone()))
    }

    async fn put_age_verification(&self, record: AgeVerificationRecord) -> Result<()> {
        self.age_verifications.insert(record.user_id.clone(), record);
        Ok(())
    }

    async fn geo_restriction(&self, content_id: Uuid) -> Result<Option<GeolocationRestriction>> {
        Ok(self
            .geo_restrictions
            .get(&content_id)
            .map(|entry| entry.value().clone()))
    }

    async fn put_geo_restriction(&self, restriction: GeolocationRestriction) -> Result<()> {
        self.geo_restrictions
            .insert(restriction.content_id, restriction);
        Ok(())
    }
}
