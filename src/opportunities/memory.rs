use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use url::Url;

use crate::opportunities::{model::Opportunity, store::OpportunityStore};
use crate::sites::StoreError;

/// Opportunities kept for the life of the process.
#[derive(Clone, Default)]
pub struct InMemoryOpportunityStore {
    by_url: Arc<DashMap<String, Opportunity>>,
}

impl InMemoryOpportunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }
}

#[async_trait]
impl OpportunityStore for InMemoryOpportunityStore {
    async fn get_by_url(&self, url: &Url) -> Result<Option<Opportunity>, StoreError> {
        Ok(self.by_url.get(url.as_str()).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, opportunity: Opportunity) -> Result<Opportunity, StoreError> {
        let stored = self
            .by_url
            .entry(opportunity.url.to_string())
            .or_insert(opportunity);
        Ok(stored.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::VolunteerOpportunity;

    fn opportunity(url: &str, organization: &str) -> Opportunity {
        Opportunity::from_scraped(
            Url::parse(url).unwrap(),
            VolunteerOpportunity {
                organization_name: organization.into(),
                activity_type: "tutoring".into(),
                location: "N/A".into(),
                time_slot: "F".into(),
                slot_availability: vec!["N/A".into()],
                contact_email: "N/A".into(),
                contact_number: 0,
                extra: "N/A".into(),
                tags: vec!["education".into()],
                url: url.into(),
            },
        )
    }

    #[tokio::test]
    async fn test_insert_keeps_first_record_for_url() {
        let store = InMemoryOpportunityStore::new();
        let first = store
            .insert(opportunity("https://example.org/tutor", "Reading Club"))
            .await
            .unwrap();

        let second = store
            .insert(opportunity("https://example.org/tutor", "Someone Else"))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.organization, "Reading Club");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_url() {
        let store = InMemoryOpportunityStore::new();
        let url = Url::parse("https://example.org/tutor").unwrap();
        assert!(store.get_by_url(&url).await.unwrap().is_none());

        store
            .insert(opportunity(url.as_str(), "Reading Club"))
            .await
            .unwrap();

        let found = store.get_by_url(&url).await.unwrap().unwrap();
        assert_eq!(found.organization, "Reading Club");
    }
}
