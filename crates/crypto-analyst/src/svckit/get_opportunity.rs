//! Get Opportunity Tool

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::{detail_text, record_data, store_failure};
use crate::store::OpportunityStore;

const NAME: &str = "get_opportunity";

/// Tool that shows every field of one opportunity
pub struct GetOpportunityTool {
    store: Arc<dyn OpportunityStore>,
}

impl GetOpportunityTool {
    pub fn new(store: Arc<dyn OpportunityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetOpportunityTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Show the full details of one opportunity, including sources and metrics."
                .into(),
            parameters: vec![ParameterSchema::required(
                "opportunity_id",
                "string",
                "ID of the opportunity",
            )],
            category: Some("opportunities".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let id = call.required_str("opportunity_id")?;

        match self.store.get(id).await {
            Ok(record) => {
                let result = ToolResult::success(NAME, detail_text(&record));
                Ok(match record_data(&record) {
                    Some(data) => result.with_data(data),
                    None => result,
                })
            }
            Err(e) => Ok(store_failure(NAME, "fetching", &e)),
        }
    }
}
