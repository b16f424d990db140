//! # agent-runtime
//!
//! Concrete LLM providers for the agent.
//!
//! - **OpenRouter** (default): hosted models through the OpenAI-compatible
//!   chat completions API
//!
//! ```rust,ignore
//! use agent_runtime::OpenRouterProvider;
//!
//! let provider = OpenRouterProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

#[cfg(feature = "openrouter")]
pub mod openrouter;

#[cfg(feature = "openrouter")]
pub use openrouter::{OpenRouterConfig, OpenRouterProvider};

pub use agent_core::{Agent, AgentError, LlmProvider, Message, Result, Role, Tool, ToolRegistry};
