//! Application State

use std::sync::Arc;

use agent_core::{Agent, MemorySessionStore};
use crypto_analyst::OpportunityStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The one opportunity store, shared with the agent tools
    pub store: Arc<dyn OpportunityStore>,

    /// `None` when the LLM provider could not be configured
    pub agent: Option<Arc<Agent>>,

    /// Chat history per thread id
    pub sessions: Arc<MemorySessionStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn OpportunityStore>, agent: Option<Arc<Agent>>) -> Self {
        Self {
            store,
            agent,
            sessions: Arc::new(MemorySessionStore::new()),
        }
    }
}
