//! Market Intelligence Tools
//!
//! CoinGecko, Firecrawl and Santiment entry points for the agent. No network
//! calls are made yet: each tool echoes the request it would send so the
//! reasoning loop can be exercised end to end.

use async_trait::async_trait;
use serde_json::Value;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::argument_object;

fn text_arg<'a>(args: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Prices, market data and trending coins from CoinGecko
#[derive(Debug, Default)]
pub struct CoinGeckoQueryTool;

impl CoinGeckoQueryTool {
    const NAME: &'static str = "coingecko_query";
}

#[async_trait]
impl Tool for CoinGeckoQueryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Query cryptocurrency data from CoinGecko: current prices, market data \
                (volume, market cap) and trending coins."
                .into(),
            parameters: vec![
                ParameterSchema::optional("action", "string", "What to fetch")
                    .with_enum(["get_price", "get_trending", "get_market_data"])
                    .with_default(Value::from("get_price")),
                ParameterSchema::optional("coin_id", "string", "CoinGecko coin id (e.g. 'bitcoin')")
                    .with_default(Value::from("bitcoin")),
                ParameterSchema::optional("currency", "string", "Quote currency")
                    .with_default(Value::from("usd")),
            ],
            category: Some("market_data".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args = argument_object(call);
        let action = text_arg(&args, "action").unwrap_or("get_price");
        let coin = text_arg(&args, "coin_id").unwrap_or("bitcoin");
        let currency = text_arg(&args, "currency").unwrap_or("usd");

        let output = match action {
            "get_price" => format!(
                "Price data for {coin} ({}): currently fetching from CoinGecko API...",
                currency.to_uppercase()
            ),
            "get_trending" => "Trending coins: fetching from CoinGecko API...".to_string(),
            "get_market_data" => {
                format!("Market data for {coin}: currently fetching from CoinGecko API...")
            }
            other => format!("Executing CoinGecko action: {other}"),
        };

        tracing::debug!(action, coin, "CoinGecko query");
        Ok(ToolResult::success(Self::NAME, output))
    }
}

/// Web page extraction through Firecrawl
#[derive(Debug, Default)]
pub struct FirecrawlScrapeTool;

impl FirecrawlScrapeTool {
    const NAME: &'static str = "firecrawl_scrape";
}

#[async_trait]
impl Tool for FirecrawlScrapeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Scrape and extract content from a web page (crypto news, blogs, \
                project sites) using Firecrawl. Requires a url."
                .into(),
            parameters: vec![
                ParameterSchema::optional("url", "string", "Page to scrape (required)"),
                ParameterSchema::optional("format", "string", "Output format")
                    .with_enum(["markdown", "html", "text"])
                    .with_default(Value::from("markdown")),
            ],
            category: Some("web".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args = argument_object(call);
        let Some(url) = text_arg(&args, "url") else {
            return Ok(ToolResult::failure(Self::NAME, "Error: URL is required"));
        };

        tracing::debug!(url, "Firecrawl scrape");
        Ok(ToolResult::success(
            Self::NAME,
            format!("Scraping content from {url} via Firecrawl..."),
        ))
    }
}

/// On-chain, social and development metrics from Santiment
#[derive(Debug, Default)]
pub struct SantimentQueryTool;

impl SantimentQueryTool {
    const NAME: &'static str = "santiment_query";
}

#[async_trait]
impl Tool for SantimentQueryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Query Santiment for market intelligence: social sentiment, on-chain \
                metrics, development activity and network growth."
                .into(),
            parameters: vec![
                ParameterSchema::optional("action", "string", "Metric family")
                    .with_enum(["get_sentiment", "get_onchain_metrics", "get_dev_activity"])
                    .with_default(Value::from("get_sentiment")),
                ParameterSchema::optional("coin", "string", "Asset slug (e.g. 'ethereum')")
                    .with_default(Value::from("bitcoin")),
                ParameterSchema::optional(
                    "metric",
                    "string",
                    "Specific metric for on-chain queries (e.g. 'active_addresses')",
                ),
            ],
            category: Some("market_data".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args = argument_object(call);
        let action = text_arg(&args, "action").unwrap_or("get_sentiment");
        let coin = text_arg(&args, "coin")
            .or_else(|| text_arg(&args, "project"))
            .unwrap_or("bitcoin");

        let mut output = format!("Querying Santiment for {action} on {coin}");
        if let Some(metric) = text_arg(&args, "metric") {
            output.push_str(&format!(" ({metric})"));
        }
        output.push_str("...");

        tracing::debug!(action, coin, "Santiment query");
        Ok(ToolResult::success(Self::NAME, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_coingecko_defaults() {
        let result = CoinGeckoQueryTool
            .execute(&ToolCall::new("coingecko_query"))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(
            result.output,
            "Price data for bitcoin (USD): currently fetching from CoinGecko API..."
        );
    }

    #[tokio::test]
    async fn test_coingecko_nested_params() {
        let call = ToolCall::new("coingecko_query")
            .arg("params", json!({"action": "get_trending"}));
        let result = CoinGeckoQueryTool.execute(&call).await.unwrap();
        assert!(result.output.starts_with("Trending coins"));
    }

    #[tokio::test]
    async fn test_firecrawl_requires_url() {
        let missing = FirecrawlScrapeTool
            .execute(&ToolCall::new("firecrawl_scrape"))
            .await
            .unwrap();
        assert!(!missing.success);

        let ok = FirecrawlScrapeTool
            .execute(&ToolCall::new("firecrawl_scrape").arg("url", "https://example.com"))
            .await
            .unwrap();
        assert_eq!(ok.output, "Scraping content from https://example.com via Firecrawl...");
    }

    #[tokio::test]
    async fn test_santiment_query() {
        let call = ToolCall::new("santiment_query")
            .arg("action", "get_onchain_metrics")
            .arg("coin", "ethereum")
            .arg("metric", "active_addresses");
        let result = SantimentQueryTool.execute(&call).await.unwrap();
        assert_eq!(
            result.output,
            "Querying Santiment for get_onchain_metrics on ethereum (active_addresses)..."
        );
    }
}
