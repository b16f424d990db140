//! Delete Opportunity Tool

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::store_failure;
use crate::store::OpportunityStore;

const NAME: &str = "delete_opportunity";

/// Tool for removing outdated opportunities
pub struct DeleteOpportunityTool {
    store: Arc<dyn OpportunityStore>,
}

impl DeleteOpportunityTool {
    pub fn new(store: Arc<dyn OpportunityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DeleteOpportunityTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Delete an opportunity from the list. Provide the opportunity_id.".into(),
            parameters: vec![ParameterSchema::required(
                "opportunity_id",
                "string",
                "ID of the opportunity to delete",
            )],
            category: Some("opportunities".into()),
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let id = call.required_str("opportunity_id")?;

        match self.store.delete(id).await {
            Ok(()) => Ok(ToolResult::success(NAME, format!("Deleted opportunity {id}"))),
            Err(e) => Ok(store_failure(NAME, "deleting", &e)),
        }
    }
}
