//! Agent Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors raised while driving the agent loop
#[derive(Error, Debug)]
pub enum AgentError {
    /// The LLM provider returned an error response
    #[error("Provider error: {0}")]
    Provider(String),

    /// The LLM provider could not be reached
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider rejected our credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The provider throttled the request
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments did not satisfy the tool schema
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// The reasoning loop ran out of iterations without a final answer
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Whether a caller could reasonably try the same request again
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_)
        )
    }

    /// Message safe to show to an end user (no internals)
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(_) => "The analysis model returned an error. Please try again.".into(),
            Self::ProviderUnavailable(_) => {
                "The analysis model is currently unavailable. Please try again later.".into()
            }
            Self::Auth(_) => "The agent is misconfigured: model credentials were rejected.".into(),
            Self::RateLimited(_) => "Too many requests to the model. Please wait a moment.".into(),
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::MaxIterations(_) => {
                "The request needed too many steps. Please try a narrower question.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}
