pub mod handlers;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use memory::InMemoryOpportunityStore;
pub use model::Opportunity;
pub use postgres::PgOpportunityStore;
#[cfg(test)]
pub use store::MockOpportunityStore;
pub use store::OpportunityStore;
