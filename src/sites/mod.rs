pub mod dtos;
pub mod file;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use file::JsonFileSiteConfigStore;
pub use memory::InMemorySiteConfigStore;
pub use model::{FetchInstructions, MAX_SELECTOR_LENGTH, SiteConfig, SiteConfigInput};
pub use postgres::PgSiteConfigStore;
#[cfg(test)]
pub use store::MockSiteConfigStore;
pub use store::{SiteConfigStore, StoreError};
