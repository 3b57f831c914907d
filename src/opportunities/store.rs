use async_trait::async_trait;
use url::Url;

use crate::opportunities::model::Opportunity;
use crate::sites::StoreError;

/// Saved opportunities, unique by source URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn get_by_url(&self, url: &Url) -> Result<Option<Opportunity>, StoreError>;

    /// Insert unless the URL is already stored; either way the stored record
    /// is returned.
    async fn insert(&self, opportunity: Opportunity) -> Result<Opportunity, StoreError>;
}
