//! Update Opportunity Tool
//!
//! Applies a partial update. Any mutable field may be passed alongside
//! `opportunity_id`; fields the store does not know are ignored.

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::{argument_object, record_data, store_failure};
use crate::model::OpportunityPatch;
use crate::store::OpportunityStore;

const NAME: &str = "update_opportunity";
const ID_ARG: &str = "opportunity_id";

/// Tool for updating an opportunity's status, confidence or other fields
pub struct UpdateOpportunityTool {
    store: Arc<dyn OpportunityStore>,
}

impl UpdateOpportunityTool {
    pub fn new(store: Arc<dyn OpportunityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateOpportunityTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Update an existing opportunity. Provide the opportunity_id and only the \
                fields that changed (usually status or confidence)."
                .into(),
            parameters: vec![
                ParameterSchema::required(ID_ARG, "string", "ID of the opportunity to update"),
                ParameterSchema::optional("status", "string", "New status")
                    .with_enum(["active", "expired", "executed", "dismissed"]),
                ParameterSchema::optional("confidence", "number", "New confidence level (0-100)"),
                ParameterSchema::optional("rationale", "string", "Revised rationale"),
                ParameterSchema::optional("type", "string", "Revised signal kind")
                    .with_enum(["buy", "sell", "hold", "watch"]),
                ParameterSchema::optional("title", "string", "New title"),
                ParameterSchema::optional("sources", "array", "Replacement source list"),
                ParameterSchema::optional("metrics", "object", "Replacement metrics"),
                ParameterSchema::optional("tags", "array", "Replacement tags"),
                ParameterSchema::optional(
                    "expires_at",
                    "string",
                    "New expiry (ISO-8601), or null to clear it",
                ),
            ],
            category: Some("opportunities".into()),
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let id = call.required_str(ID_ARG)?;

        let args = argument_object(call);
        let fields = args.iter().filter(|(key, _)| key.as_str() != ID_ARG);
        let patch = match OpportunityPatch::from_fields(fields) {
            Ok(patch) => patch,
            Err(e) => return Ok(store_failure(NAME, "updating", &e)),
        };

        if patch.is_empty() {
            return Ok(ToolResult::success(NAME, "No updates provided"));
        }

        match self.store.update(id, &patch).await {
            Ok(record) => {
                let output = format!(
                    "Updated opportunity {} ({})",
                    record.id,
                    patch.field_names().join(", ")
                );
                let result = ToolResult::success(NAME, output);
                Ok(match record_data(&record) {
                    Some(data) => result.with_data(data),
                    None => result,
                })
            }
            Err(e) => Ok(store_failure(NAME, "updating", &e)),
        }
    }
}
