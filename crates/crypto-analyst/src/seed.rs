//! Demo data for development instances

use tracing::info;

use crate::error::Result;
use crate::model::{NewOpportunity, OpportunityType};
use crate::store::OpportunityStore;

/// The two opportunities a fresh development store starts with
pub fn demo_opportunities() -> Vec<NewOpportunity> {
    vec![
        NewOpportunity::new(
            "Bitcoin Accumulation Opportunity",
            "bitcoin",
            OpportunityType::Buy,
            75.0,
            "Strong support level at $60k with increasing institutional adoption",
        )
        .with_sources(["coingecko", "santiment"])
        .with_metric("current_price", 61_500)
        .with_metric("support_level", 60_000)
        .with_tags(["btc", "accumulation", "long-term"]),
        NewOpportunity::new(
            "Ethereum Layer 2 Growth",
            "ethereum",
            OpportunityType::Watch,
            85.0,
            "Increasing L2 activity and upcoming network upgrades",
        )
        .with_sources(["santiment", "firecrawl"])
        .with_metric("l2_tvl", "10B")
        .with_metric("network_growth", "+15%")
        .with_tags(["eth", "layer2", "defi"]),
    ]
}

/// Add the demo opportunities, returning how many were stored
pub async fn seed_demo_opportunities(store: &dyn OpportunityStore) -> Result<usize> {
    let demo = demo_opportunities();
    let count = demo.len();
    for new in demo {
        store.add(new).await?;
    }
    info!(count, backend = store.backend_name(), "Seeded demo opportunities");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OpportunityFilter;
    use crate::store::MemoryOpportunityStore;

    #[tokio::test]
    async fn test_seed_in_order() {
        let store = MemoryOpportunityStore::new();
        assert_eq!(seed_demo_opportunities(&store).await.unwrap(), 2);

        let all = store.list(&OpportunityFilter::all()).await.unwrap();
        assert_eq!(all[0].title, "Bitcoin Accumulation Opportunity");
        assert_eq!(all[1].title, "Ethereum Layer 2 Growth");
        assert_eq!(all[1].tags, ["eth", "layer2", "defi"]);
    }
}
