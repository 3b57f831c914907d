pub mod app_state;
pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod extractor;
pub mod fetcher;
pub mod health;
pub mod llm;
pub mod opportunities;
pub mod router;
pub mod scrape;
pub mod service;
pub mod sites;
pub mod strategy;
pub mod telemetry;
pub mod urls;
