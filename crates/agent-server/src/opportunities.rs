//! Opportunity REST Handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crypto_analyst::{NewOpportunity, Opportunity, OpportunityFilter, OpportunityPatch};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,

    /// Comma-separated, match-if-any
    pub tags: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub opportunities: Vec<Opportunity>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub opportunity_id: String,
    pub opportunity: Opportunity,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub updates: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub success: bool,
    pub opportunity: Opportunity,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub message: String,
}

/// `GET /api/opportunities`
pub async fn list_opportunities(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(query) = query?;
    let filter = OpportunityFilter::from_query(query.status.as_deref(), query.tags.as_deref())?;

    let opportunities = state.store.list(&filter).await?;
    Ok(Json(ListResponse {
        count: opportunities.len(),
        opportunities,
    }))
}

/// `POST /api/opportunities`
pub async fn create_opportunity(
    State(state): State<AppState>,
    payload: Result<Json<NewOpportunity>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(new) = payload?;
    let opportunity = state.store.add(new).await?;

    tracing::info!(id = %opportunity.id, asset = %opportunity.asset, "Created opportunity");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            opportunity_id: opportunity.id.clone(),
            opportunity,
        }),
    ))
}

/// `GET /api/opportunities/{id}`
pub async fn get_opportunity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Opportunity>, ApiError> {
    Ok(Json(state.store.get(&id).await?))
}

/// `PUT /api/opportunities/{id}`
pub async fn update_opportunity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let Json(request) = payload?;
    let patch = OpportunityPatch::from_fields(&request.updates)?;
    let opportunity = state.store.update(&id, &patch).await?;

    Ok(Json(UpdatedResponse {
        success: true,
        opportunity,
    }))
}

/// `DELETE /api/opportunities/{id}`
pub async fn delete_opportunity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    state.store.delete(&id).await?;

    tracing::info!(%id, "Deleted opportunity");
    Ok(Json(DeletedResponse {
        success: true,
        message: format!("Opportunity {id} deleted"),
    }))
}
