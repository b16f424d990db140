//! Add Opportunity Tool
//!
//! Records a new investment opportunity the agent has identified.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::{argument_object, record_data, store_failure};
use crate::model::NewOpportunity;
use crate::store::OpportunityStore;

const NAME: &str = "add_opportunity";

/// Tool for adding opportunities to the store
pub struct AddOpportunityTool {
    store: Arc<dyn OpportunityStore>,
}

impl AddOpportunityTool {
    pub fn new(store: Arc<dyn OpportunityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AddOpportunityTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Add a new investment opportunity to the opportunities list. Use this \
                when market data points to a potential trade; cite sources and give a clear rationale."
                .into(),
            parameters: vec![
                ParameterSchema::required("title", "string", "Clear, descriptive title"),
                ParameterSchema::required(
                    "asset",
                    "string",
                    "Cryptocurrency or asset (e.g. 'bitcoin', 'ethereum')",
                ),
                ParameterSchema::required("type", "string", "Kind of signal")
                    .with_enum(["buy", "sell", "hold", "watch"]),
                ParameterSchema::required("confidence", "number", "Confidence level from 0 to 100"),
                ParameterSchema::required(
                    "rationale",
                    "string",
                    "Detailed explanation with supporting data",
                ),
                ParameterSchema::optional("sources", "array", "Data sources used"),
                ParameterSchema::optional(
                    "metrics",
                    "object",
                    "Relevant metrics (price, volume, support levels...)",
                ),
                ParameterSchema::optional("tags", "array", "Tags for categorization"),
                ParameterSchema::optional(
                    "expires_at",
                    "string",
                    "ISO-8601 time after which the opportunity is stale",
                ),
            ],
            category: Some("opportunities".into()),
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let new: NewOpportunity = match serde_json::from_value(Value::Object(argument_object(call)))
        {
            Ok(new) => new,
            Err(e) => {
                return Ok(ToolResult::failure(
                    NAME,
                    format!("Error adding opportunity: {e}"),
                ));
            }
        };

        match self.store.add(new).await {
            Ok(record) => {
                let output = format!("Added opportunity '{}' (ID: {})", record.title, record.id);
                let result = ToolResult::success(NAME, output);
                Ok(match record_data(&record) {
                    Some(data) => result.with_data(data),
                    None => result,
                })
            }
            Err(e) => Ok(store_failure(NAME, "adding", &e)),
        }
    }
}
