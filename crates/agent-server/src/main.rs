//! Crypto analyst HTTP server
//!
//! Axum server exposing the opportunity REST API, a chat endpoint and a
//! WebSocket chat channel backed by the ReAct agent.

mod app;
mod config;
mod error;
mod handlers;
mod opportunities;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{Agent, AgentBuilder, LlmProvider, ToolRegistry};
use agent_runtime::OpenRouterProvider;
use crypto_analyst::{
    connect_store, register_tools, seed::seed_demo_opportunities, OpportunityStore,
    CRYPTO_ANALYST_PROMPT,
};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Opportunity store, shared by the API and the agent tools
    let store = connect_store(&config.store).await?;
    if config.seed_demo {
        seed_demo_opportunities(store.as_ref()).await?;
    }

    let agent = build_agent(&config, &store).await;

    let state = AppState::new(store, agent);
    let app = app::router(state, app::cors_layer(&config.cors_origins));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Crypto analyst server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                  - Health check");
    tracing::info!("  GET    /api/opportunities       - List opportunities");
    tracing::info!("  POST   /api/opportunities       - Create opportunity");
    tracing::info!("  GET    /api/opportunities/{{id}}  - Get opportunity");
    tracing::info!("  PUT    /api/opportunities/{{id}}  - Update opportunity");
    tracing::info!("  DELETE /api/opportunities/{{id}}  - Delete opportunity");
    tracing::info!("  POST   /api/chat                - Chat with the analyst");
    tracing::info!("  GET    /ws/chat                 - WebSocket chat");

    axum::serve(listener, app).await?;

    Ok(())
}

/// The agent is optional: without a provider the opportunity API still works
/// and chat answers 503.
async fn build_agent(config: &ServerConfig, store: &Arc<dyn OpportunityStore>) -> Option<Arc<Agent>> {
    let provider = match OpenRouterProvider::from_env() {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            tracing::warn!(error = %e, "LLM provider not configured - chat disabled");
            tracing::warn!("  Set OPENROUTER_API_KEY in .env to enable the agent");
            return None;
        }
    };

    match provider.health_check().await {
        Ok(true) => tracing::info!(model = %provider.config().default_model, "Connected to OpenRouter"),
        Ok(false) | Err(_) => tracing::warn!("OpenRouter not reachable - chat requests may fail"),
    }

    let model = provider.config().default_model.clone();
    let mut tools = ToolRegistry::new();
    register_tools(&mut tools, store);

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let agent = AgentBuilder::new()
        .provider(provider)
        .tools(tools)
        .system_prompt(CRYPTO_ANALYST_PROMPT)
        .model(model)
        .max_iterations(config.agent_max_iterations)
        .build();

    match agent {
        Ok(agent) => Some(Arc::new(agent)),
        Err(e) => {
            tracing::warn!(error = %e, "Agent initialization failed - chat disabled");
            None
        }
    }
}
