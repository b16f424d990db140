//! Opportunity Store
//!
//! One async interface over the authoritative `id -> Opportunity` mapping.
//! A deployment picks a backend through [`StoreConfig`] and shares the handle
//! as `Arc<dyn OpportunityStore>` between the HTTP layer and the agent tools.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::error::{AnalystError, Result};
use crate::model::{NewOpportunity, Opportunity, OpportunityFilter, OpportunityPatch};

pub use memory::MemoryOpportunityStore;
pub use sqlite::SqliteOpportunityStore;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://opportunities.db";

/// Storage-agnostic CRUD over opportunities.
///
/// Each call is atomic for the record it touches. Nothing spans calls, so a
/// `get` followed by `update` can interleave with other writers.
#[async_trait]
pub trait OpportunityStore: Send + Sync {
    /// Short backend identifier for health output and logs
    fn backend_name(&self) -> &'static str;

    /// Validate, assign an id, stamp timestamps and persist
    async fn add(&self, new: NewOpportunity) -> Result<Opportunity>;

    async fn get(&self, id: &str) -> Result<Opportunity>;

    /// Matching records in creation order
    async fn list(&self, filter: &OpportunityFilter) -> Result<Vec<Opportunity>>;

    /// Merge `patch` into the record. An empty patch returns the record as is.
    async fn update(&self, id: &str, patch: &OpportunityPatch) -> Result<Opportunity>;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// Available storage backends
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local, lost on restart
    #[default]
    Memory,
    Sqlite,
}

impl StoreBackend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(AnalystError::Config(format!(
                "unknown store backend '{other}' (expected memory or sqlite)"
            ))),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend to open, and where
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Only used by the SQLite backend
    pub database_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn sqlite(database_url: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_url: database_url.into(),
        }
    }
}

/// Open the configured backend
pub async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn OpportunityStore>> {
    let store: Arc<dyn OpportunityStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryOpportunityStore::new()),
        StoreBackend::Sqlite => Arc::new(SqliteOpportunityStore::connect(&config.database_url).await?),
    };
    info!(backend = store.backend_name(), "Opportunity store ready");
    Ok(store)
}

/// Fresh opportunity id, never reused
pub(crate) fn generate_id() -> String {
    format!("opp_{}", uuid::Uuid::new_v4().simple())
}

/// Behaviour every backend must share. Each backend's test module runs these
/// against its own instance.
#[cfg(test)]
pub(crate) mod conformance {
    use super::OpportunityStore;
    use crate::model::{
        NewOpportunity, OpportunityFilter, OpportunityPatch, OpportunityStatus, OpportunityType,
    };
    use serde_json::json;
    use std::collections::HashSet;

    fn btc() -> NewOpportunity {
        NewOpportunity::new(
            "BTC accumulation",
            "bitcoin",
            OpportunityType::Buy,
            75.0,
            "Holding long-term support",
        )
        .with_sources(["coingecko", "santiment"])
        .with_tags(["btc", "accumulation"])
        .with_metric("price", 62_000.5)
    }

    fn eth() -> NewOpportunity {
        NewOpportunity::new("ETH L2", "ethereum", OpportunityType::Watch, 85.0, "L2 activity")
            .with_tags(["eth", "layer2"])
    }

    pub async fn ids_are_fresh(store: &dyn OpportunityStore) {
        let mut ids = HashSet::new();
        for _ in 0..10 {
            let rec = store.add(btc()).await.unwrap();
            assert!(rec.id.starts_with("opp_"));
            assert!(ids.insert(rec.id));
        }
    }

    pub async fn round_trip(store: &dyn OpportunityStore) {
        let added = store.add(btc()).await.unwrap();
        let fetched = store.get(&added.id).await.unwrap();

        assert_eq!(fetched, added);
        assert_eq!(fetched.title, "BTC accumulation");
        assert_eq!(fetched.asset, "bitcoin");
        assert_eq!(fetched.kind, OpportunityType::Buy);
        assert!((fetched.confidence - 75.0).abs() < f64::EPSILON);
        assert_eq!(fetched.sources, ["coingecko", "santiment"]);
        assert_eq!(fetched.tags, ["btc", "accumulation"]);
        assert_eq!(fetched.metrics.get("price"), Some(&json!(62_000.5)));
        assert_eq!(fetched.status, OpportunityStatus::Active);
        assert_eq!(fetched.created_at, fetched.updated_at);
        assert!(fetched.expires_at.is_none());
    }

    pub async fn status_update_bumps_only_status(store: &dyn OpportunityStore) {
        let added = store.add(btc()).await.unwrap();
        let patch = OpportunityPatch::default().with_status(OpportunityStatus::Executed);
        let updated = store.update(&added.id, &patch).await.unwrap();

        assert_eq!(updated.status, OpportunityStatus::Executed);
        assert!(updated.updated_at >= added.updated_at);
        assert_eq!(updated.created_at, added.created_at);
        assert_eq!(updated.title, added.title);
        assert_eq!(updated.tags, added.tags);
        assert_eq!(updated.metrics, added.metrics);
        assert_eq!(store.get(&added.id).await.unwrap(), updated);
    }

    pub async fn empty_patch_is_noop(store: &dyn OpportunityStore) {
        let added = store.add(btc()).await.unwrap();
        let same = store
            .update(&added.id, &OpportunityPatch::default())
            .await
            .unwrap();
        assert_eq!(same, added);
    }

    pub async fn invalid_patch_leaves_record(store: &dyn OpportunityStore) {
        let added = store.add(btc()).await.unwrap();
        let patch = OpportunityPatch::default()
            .with_status(OpportunityStatus::Dismissed)
            .with_confidence(150.0);
        let err = store.update(&added.id, &patch).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(store.get(&added.id).await.unwrap(), added);
    }

    pub async fn missing_ids(store: &dyn OpportunityStore) {
        assert!(store.get("opp_missing").await.unwrap_err().is_not_found());
        let patch = OpportunityPatch::default().with_confidence(10.0);
        assert!(store.update("opp_missing", &patch).await.unwrap_err().is_not_found());
        assert!(store.delete("opp_missing").await.unwrap_err().is_not_found());
    }

    pub async fn delete_twice(store: &dyn OpportunityStore) {
        let added = store.add(eth()).await.unwrap();
        store.delete(&added.id).await.unwrap();

        assert!(store.get(&added.id).await.unwrap_err().is_not_found());
        assert!(store.delete(&added.id).await.unwrap_err().is_not_found());
        assert!(store.list(&OpportunityFilter::all()).await.unwrap().is_empty());
    }

    pub async fn filters_keep_creation_order(store: &dyn OpportunityStore) {
        let a = store.add(btc()).await.unwrap();
        let b = store.add(eth()).await.unwrap();
        let c = store
            .add(btc().with_status(OpportunityStatus::Dismissed))
            .await
            .unwrap();
        let d = store.add(eth().with_tags(["eth", "btc"])).await.unwrap();

        let all = store.list(&OpportunityFilter::all()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, [a.id.as_str(), b.id.as_str(), c.id.as_str(), d.id.as_str()]);

        let active = OpportunityFilter::all().with_status(OpportunityStatus::Active);
        let ids: Vec<_> = store
            .list(&active)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, [a.id.clone(), b.id.clone(), d.id.clone()]);

        let tagged = OpportunityFilter::all().with_tags(["btc"]);
        let ids: Vec<_> = store
            .list(&tagged)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, [a.id.clone(), c.id.clone(), d.id.clone()]);

        let none = OpportunityFilter::all()
            .with_status(OpportunityStatus::Expired)
            .with_tags(["btc"]);
        assert!(store.list(&none).await.unwrap().is_empty());
    }

    pub async fn confidence_bounds(store: &dyn OpportunityStore) {
        let over = NewOpportunity::new("t", "btc", OpportunityType::Buy, 150.0, "r");
        assert!(store.add(over).await.unwrap_err().is_validation());
        assert!(store.list(&OpportunityFilter::all()).await.unwrap().is_empty());

        for edge in [0.0, 100.0] {
            let new = NewOpportunity::new("t", "btc", OpportunityType::Buy, edge, "r");
            assert!((store.add(new).await.unwrap().confidence - edge).abs() < f64::EPSILON);
        }
    }

    pub async fn tags_are_deduplicated(store: &dyn OpportunityStore) {
        let added = store
            .add(eth().with_tags(["eth", " eth ", "", "defi", "eth"]))
            .await
            .unwrap();
        assert_eq!(added.tags, ["eth", "defi"]);

        let patch = OpportunityPatch::default().with_tags(["a", "b", "a"]);
        let updated = store.update(&added.id, &patch).await.unwrap();
        assert_eq!(updated.tags, ["a", "b"]);
        assert_eq!(store.get(&added.id).await.unwrap().tags, ["a", "b"]);
    }

    pub async fn expiry_can_be_cleared(store: &dyn OpportunityStore) {
        let expiry = crate::model::parse_timestamp("2031-06-01T00:00:00Z").unwrap();
        let added = store.add(btc().with_expiry(expiry)).await.unwrap();
        assert_eq!(store.get(&added.id).await.unwrap().expires_at, Some(expiry));

        let patch = OpportunityPatch {
            expires_at: Some(None),
            ..OpportunityPatch::default()
        };
        let updated = store.update(&added.id, &patch).await.unwrap();
        assert!(updated.expires_at.is_none());
        assert!(store.get(&added.id).await.unwrap().expires_at.is_none());
    }

    /// Run every check, each against a fresh store from `make`
    pub async fn run_all<S, F, Fut>(make: F)
    where
        S: OpportunityStore,
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = S>,
    {
        ids_are_fresh(&make().await).await;
        round_trip(&make().await).await;
        status_update_bumps_only_status(&make().await).await;
        empty_patch_is_noop(&make().await).await;
        invalid_patch_leaves_record(&make().await).await;
        missing_ids(&make().await).await;
        delete_twice(&make().await).await;
        filters_keep_creation_order(&make().await).await;
        confidence_bounds(&make().await).await;
        tags_are_deduplicated(&make().await).await;
        expiry_can_be_cleared(&make().await).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(" SQLite ".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert!(matches!(
            "redis".parse::<StoreBackend>(),
            Err(AnalystError::Config(_))
        ));
    }

    #[test]
    fn test_generated_ids() {
        let id = generate_id();
        assert!(id.starts_with("opp_"));
        assert_eq!(id.len(), 4 + 32);
        assert_ne!(id, generate_id());
    }

    #[tokio::test]
    async fn test_connect_memory_store() {
        let store = connect_store(&StoreConfig::memory()).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }
}
