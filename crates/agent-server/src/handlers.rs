//! Health, Chat and WebSocket Handlers

use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    Json,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use agent_core::{Agent, AgentError, MemorySessionStore, Message, SessionId, SessionStore};

use crate::error::ApiError;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "crypto-analyst-agent";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub store_backend: &'static str,
    pub agent_ready: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub thread_id: String,
}

/// Inbound WebSocket frame
#[derive(Debug, Deserialize)]
struct WsRequest {
    content: String,
}

/// Outbound WebSocket frame
#[derive(Debug, Serialize)]
struct WsReply<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
}

/// `GET /` and `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        store_backend: state.store.backend_name(),
        agent_ready: state.agent.is_some(),
    })
}

/// `POST /api/chat`
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let agent = state.agent.as_ref().ok_or(ApiError::AgentUnavailable)?;

    let thread_id = request
        .thread_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let response = run_turn(
        agent,
        &state.sessions,
        &SessionId::from_string(thread_id.clone()),
        &request.message,
    )
    .await?;

    Ok(Json(ChatResponse {
        response,
        thread_id,
    }))
}

/// Run one user turn on a thread and persist the updated history
pub async fn run_turn(
    agent: &Agent,
    sessions: &MemorySessionStore,
    thread: &SessionId,
    message: &str,
) -> Result<String, AgentError> {
    let mut session = sessions.load_or_create(thread)?;
    session.conversation.push(Message::user(message));

    let reply = agent.run(&mut session.conversation).await?;

    session.touch();
    sessions.save(&session)?;
    tracing::debug!(thread = %thread, messages = session.message_count(), "Chat turn complete");
    Ok(reply)
}

/// `GET /ws/chat`
pub async fn ws_chat_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let thread = SessionId::new();
    tracing::info!(thread = %thread, "WebSocket connected");

    while let Some(incoming) = receiver.next().await {
        let text = match incoming {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket receive error");
                break;
            }
            Ok(_) => continue,
        };

        let reply = match serde_json::from_str::<WsRequest>(text.as_str()) {
            Err(e) => error_frame(&format!("Invalid message: {e}")),
            Ok(request) => match &state.agent {
                None => error_frame("Agent not initialized"),
                Some(agent) => {
                    match run_turn(agent, &state.sessions, &thread, &request.content).await {
                        Ok(response) => frame("response", &response),
                        Err(e) => {
                            tracing::error!(error = %e, "Agent error on WebSocket");
                            error_frame(&e.user_message())
                        }
                    }
                }
            },
        };

        if sender.send(WsMessage::Text(reply.into())).await.is_err() {
            break;
        }
    }

    if let Err(e) = state.sessions.delete(&thread) {
        tracing::warn!(error = %e, "Failed to drop WebSocket thread");
    }
    tracing::info!(thread = %thread, "WebSocket disconnected");
}

fn frame(kind: &'static str, content: &str) -> String {
    serde_json::to_string(&WsReply { kind, content })
        .unwrap_or_else(|_| format!(r#"{{"type":"{kind}","content":""}}"#))
}

fn error_frame(content: &str) -> String {
    frame("error", content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_frames() {
        let value: serde_json::Value = serde_json::from_str(&frame("response", "BTC looks \"strong\"")).unwrap();
        assert_eq!(value["type"], "response");
        assert_eq!(value["content"], "BTC looks \"strong\"");

        let err: serde_json::Value = serde_json::from_str(&error_frame("nope")).unwrap();
        assert_eq!(err["type"], "error");
    }
}
