use std::sync::Arc;

use crate::service::ExtractionService;
use crate::sites::SiteConfigStore;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ExtractionService>,
}

impl AppState {
    pub fn new(service: ExtractionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn site_configs(&self) -> &Arc<dyn SiteConfigStore> {
        self.service.store()
    }
}
