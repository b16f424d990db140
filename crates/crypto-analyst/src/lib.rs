//! # crypto-analyst
//!
//! Cryptocurrency analyst domain: investment opportunities the agent
//! discovers, where they are stored, and the tools the agent uses to manage
//! them.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌────────────────────────┐
//! │  agent tools │──┐  │                  │  ┌──│ MemoryOpportunityStore │
//! │   (svckit)   │  ├──│ OpportunityStore │──┤  └────────────────────────┘
//! ├──────────────┤  │  │     (trait)      │  │  ┌────────────────────────┐
//! │   HTTP API   │──┘  │                  │  └──│ SqliteOpportunityStore │
//! └──────────────┘     └──────────────────┘     └────────────────────────┘
//! ```
//!
//! One store handle is opened at startup with [`store::connect_store`] and
//! shared by every caller.

pub mod error;
pub mod model;
pub mod seed;
pub mod store;
pub mod svckit;

use std::sync::Arc;

use agent_core::ToolRegistry;

pub use error::{AnalystError, Result};
pub use model::{
    Metrics, NewOpportunity, Opportunity, OpportunityFilter, OpportunityPatch, OpportunityStatus,
    OpportunityType,
};
pub use store::{
    connect_store, MemoryOpportunityStore, OpportunityStore, SqliteOpportunityStore, StoreBackend,
    StoreConfig,
};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        AddOpportunityTool, CoinGeckoQueryTool, DeleteOpportunityTool, FirecrawlScrapeTool,
        GetOpportunityTool, ListOpportunitiesTool, SantimentQueryTool, UpdateOpportunityTool,
    };
}

/// Register every analyst tool, with the opportunity tools bound to `store`
pub fn register_tools(registry: &mut ToolRegistry, store: &Arc<dyn OpportunityStore>) {
    use tools::*;

    registry.register(AddOpportunityTool::new(Arc::clone(store)));
    registry.register(ListOpportunitiesTool::new(Arc::clone(store)));
    registry.register(GetOpportunityTool::new(Arc::clone(store)));
    registry.register(UpdateOpportunityTool::new(Arc::clone(store)));
    registry.register(DeleteOpportunityTool::new(Arc::clone(store)));
    registry.register(CoinGeckoQueryTool);
    registry.register(FirecrawlScrapeTool);
    registry.register(SantimentQueryTool);
}

/// System prompt for the crypto analyst agent
pub const CRYPTO_ANALYST_PROMPT: &str = r#"You are an expert cryptocurrency analyst with access to multiple data sources and tools.

## Capabilities

1. **Market Data Analysis** (`coingecko_query`) - prices, market data, trending coins
2. **Web Intelligence** (`firecrawl_scrape`) - crypto news, blogs and project sites
3. **On-Chain & Social Metrics** (`santiment_query`) - sentiment, on-chain activity, development activity
4. **Opportunities Management** - `add_opportunity`, `list_opportunities`, `get_opportunity`, `update_opportunity`, `delete_opportunity`

## Your Task

Analyze market data, identify investment opportunities, and maintain the opportunities list.
When you identify a potential opportunity:

1. Gather data from multiple sources
2. Analyze the risk/reward
3. Calculate a confidence level between 0 and 100
4. Add it to the opportunities list with a clear rationale, the sources you used and the key metrics

Before adding, list existing opportunities so you update an existing entry instead of creating a duplicate.

## Guidelines

- Be data-driven: always cite your sources
- Be honest about confidence levels
- Update opportunities when new data emerges; mark them executed, expired or dismissed when they no longer apply
- Use clear, actionable language
- Consider multiple timeframes (short, medium, long)

## Response Style

- Start with key insights
- Show your reasoning with data
- Provide clear recommendations
- Include relevant metrics"#;
