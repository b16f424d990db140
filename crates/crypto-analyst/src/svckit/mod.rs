//! Service Kit - Agent Tools
//!
//! `agent_core::Tool` implementations for the crypto analyst. The opportunity
//! tools share one store handle with the HTTP API; the market intel tools
//! return canned text until real data sources are wired in.

mod add_opportunity;
mod delete_opportunity;
mod get_opportunity;
mod list_opportunities;
mod market_intel;
mod update_opportunity;

pub use add_opportunity::AddOpportunityTool;
pub use delete_opportunity::DeleteOpportunityTool;
pub use get_opportunity::GetOpportunityTool;
pub use list_opportunities::ListOpportunitiesTool;
pub use market_intel::{CoinGeckoQueryTool, FirecrawlScrapeTool, SantimentQueryTool};
pub use update_opportunity::UpdateOpportunityTool;

use agent_core::{ToolCall, ToolResult};
use serde_json::{Map, Value};

use crate::error::AnalystError;
use crate::model::Opportunity;

/// Turn a store error into a readable failure for the model
pub(crate) fn store_failure(tool: &str, action: &str, err: &AnalystError) -> ToolResult {
    let message = match err {
        AnalystError::NotFound(id) => format!("Opportunity {id} not found"),
        AnalystError::Validation(msg) => format!("Invalid opportunity data: {msg}"),
        other => format!("Error {action} opportunity: {other}"),
    };
    tracing::debug!(tool, error = %err, "Opportunity tool failed");
    ToolResult::failure(tool, message)
}

/// Record as JSON for `ToolResult::data`
pub(crate) fn record_data(record: &Opportunity) -> Option<Value> {
    serde_json::to_value(record).ok()
}

/// Call arguments as a JSON object. Models sometimes nest everything under
/// `params`; those entries are lifted to the top level.
pub(crate) fn argument_object(call: &ToolCall) -> Map<String, Value> {
    let mut args: Map<String, Value> = call
        .arguments
        .iter()
        .filter(|(key, _)| key.as_str() != "params")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if let Some(Value::Object(nested)) = call.arguments.get("params") {
        for (key, value) in nested {
            args.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    args
}

/// One numbered entry of a listing
pub(crate) fn summary_block(index: usize, opp: &Opportunity) -> String {
    let mut out = format!(
        "{index}. **{}**\n   - Asset: {}\n   - Type: {}\n   - Confidence: {}%\n   - Rationale: {}\n   - Status: {}\n",
        opp.title,
        opp.asset.to_uppercase(),
        opp.kind.as_str().to_uppercase(),
        opp.confidence,
        opp.rationale,
        opp.status,
    );
    if !opp.tags.is_empty() {
        out.push_str(&format!("   - Tags: {}\n", opp.tags.join(", ")));
    }
    out.push_str(&format!("   - ID: {}\n", opp.id));
    out
}

/// Full detail text for a single record
pub(crate) fn detail_text(opp: &Opportunity) -> String {
    let mut out = format!("Opportunity: {}\n", opp.title);
    out.push_str(&"═".repeat(60));
    out.push('\n');
    out.push_str(&format!("ID:         {}\n", opp.id));
    out.push_str(&format!("Asset:      {}\n", opp.asset.to_uppercase()));
    out.push_str(&format!("Type:       {}\n", opp.kind.as_str().to_uppercase()));
    out.push_str(&format!("Confidence: {}%\n", opp.confidence));
    out.push_str(&format!("Status:     {}\n", opp.status));
    out.push_str(&format!("Rationale:  {}\n", opp.rationale));

    if !opp.sources.is_empty() {
        out.push_str(&format!("Sources:    {}\n", opp.sources.join(", ")));
    }
    if !opp.tags.is_empty() {
        out.push_str(&format!("Tags:       {}\n", opp.tags.join(", ")));
    }
    if !opp.metrics.is_empty() {
        out.push_str("Metrics:\n");
        for (name, value) in &opp.metrics {
            let shown = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            out.push_str(&format!("  - {name}: {shown}\n"));
        }
    }

    out.push_str(&"─".repeat(60));
    out.push('\n');
    out.push_str(&format!("Created:    {}\n", opp.created_at.to_rfc3339()));
    out.push_str(&format!("Updated:    {}\n", opp.updated_at.to_rfc3339()));
    if let Some(expires_at) = opp.expires_at {
        out.push_str(&format!("Expires:    {}\n", expires_at.to_rfc3339()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_argument_object_lifts_params() {
        let call = ToolCall::new("coingecko_query")
            .arg("currency", "eur")
            .arg("params", json!({"coin_id": "solana", "currency": "usd"}));

        let args = argument_object(&call);
        assert_eq!(args.get("coin_id"), Some(&json!("solana")));
        assert_eq!(args.get("currency"), Some(&json!("eur")));
        assert!(!args.contains_key("params"));
    }

    #[test]
    fn test_store_failure_messages() {
        let result = store_failure(
            "delete_opportunity",
            "deleting",
            &AnalystError::NotFound("opp_x".into()),
        );
        assert!(!result.success);
        assert_eq!(result.output, "Opportunity opp_x not found");
    }
}
