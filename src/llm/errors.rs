use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Missing API key or an unusable setting.
    #[error("llm configuration error: {0}")]
    Config(String),

    #[error("llm network error: {0}")]
    Network(String),

    /// Non-2xx response or an empty completion.
    #[error("llm api error: {0}")]
    Api(String),

    /// Completion was not the JSON shape that was asked for.
    #[error("llm parse error: {0}")]
    Parse(String),

    #[error("no language model configured")]
    NotConfigured,
}
