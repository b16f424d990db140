//! List Opportunities Tool

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::{store_failure, summary_block};
use crate::model::OpportunityFilter;
use crate::store::OpportunityStore;

const NAME: &str = "list_opportunities";

/// Tool that lists stored opportunities, optionally filtered
pub struct ListOpportunitiesTool {
    store: Arc<dyn OpportunityStore>,
}

impl ListOpportunitiesTool {
    pub fn new(store: Arc<dyn OpportunityStore>) -> Self {
        Self { store }
    }

    fn filter_from(call: &ToolCall) -> Result<OpportunityFilter, String> {
        OpportunityFilter::from_arguments(call.str_arg("status"), call.arguments.get("tags"))
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Tool for ListOpportunitiesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "List current investment opportunities with their details. \
                Optionally filter by status or tags."
                .into(),
            parameters: vec![
                ParameterSchema::optional("status", "string", "Only opportunities with this status")
                    .with_enum(["active", "expired", "executed", "dismissed"]),
                ParameterSchema::optional(
                    "tags",
                    "array",
                    "Only opportunities sharing at least one of these tags",
                ),
            ],
            category: Some("opportunities".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let filter = match Self::filter_from(call) {
            Ok(filter) => filter,
            Err(msg) => return Ok(ToolResult::failure(NAME, format!("Error listing opportunities: {msg}"))),
        };

        let opportunities = match self.store.list(&filter).await {
            Ok(list) => list,
            Err(e) => return Ok(store_failure(NAME, "listing", &e)),
        };

        if opportunities.is_empty() {
            return Ok(ToolResult::success(
                NAME,
                "No opportunities found. The opportunities list is currently empty.",
            ));
        }

        let mut output = format!("Found {} opportunities:\n\n", opportunities.len());
        for (i, opp) in opportunities.iter().enumerate() {
            output.push_str(&summary_block(i + 1, opp));
            output.push('\n');
        }

        let result = ToolResult::success(NAME, output);
        Ok(match serde_json::to_value(&opportunities) {
            Ok(data) => result.with_data(data),
            Err(_) => result,
        })
    }
}
