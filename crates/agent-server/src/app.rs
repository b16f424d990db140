//! Router Assembly

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::CorsOrigins;
use crate::handlers::{chat_handler, health_check, ws_chat_handler};
use crate::opportunities::{
    create_opportunity, delete_opportunity, get_opportunity, list_opportunities,
    update_opportunity,
};
use crate::state::AppState;

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        // Health & info
        .route("/", get(health_check))
        .route("/health", get(health_check))
        // Opportunities
        .route(
            "/api/opportunities",
            get(list_opportunities).post(create_opportunity),
        )
        .route(
            "/api/opportunities/{id}",
            get(get_opportunity)
                .put(update_opportunity)
                .delete(delete_opportunity),
        )
        // Agent
        .route("/api/chat", axum::routing::post(chat_handler))
        .route("/ws/chat", get(ws_chat_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => {
            let allowed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(%origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(allowed)
        }
    }
}
