pub mod cleaner;
pub mod heuristic;
pub mod model;

#[cfg(test)]
mod tests;

pub use cleaner::{reduce, reduce_with_diagnostics, visible_text};
pub use heuristic::guess_rules;
pub use model::{DEFAULT_EXCLUDE, Diagnostic, ExtractError, ExtractionRules, Reduction};

/// Run parsing work off the async executor.
pub async fn run_blocking<T, F>(work: F) -> Result<T, ExtractError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ExtractError::Worker(format!("task join error: {e}")))
}
