//! In-process opportunity store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{generate_id, OpportunityStore};
use crate::error::{AnalystError, Result};
use crate::model::{self, NewOpportunity, Opportunity, OpportunityFilter, OpportunityPatch};

#[derive(Default)]
struct Inner {
    records: HashMap<String, Opportunity>,
    /// Ids in creation order
    order: Vec<String>,
}

/// Opportunities held in memory, lost on restart
#[derive(Default)]
pub struct MemoryOpportunityStore {
    inner: RwLock<Inner>,
}

impl MemoryOpportunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OpportunityStore for MemoryOpportunityStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn add(&self, new: NewOpportunity) -> Result<Opportunity> {
        let record = new.into_record(generate_id(), model::now())?;

        let mut inner = self.inner.write().await;
        inner.order.push(record.id.clone());
        inner.records.insert(record.id.clone(), record.clone());

        debug!(id = %record.id, asset = %record.asset, "Added opportunity");
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Opportunity> {
        self.inner
            .read()
            .await
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| AnalystError::NotFound(id.to_string()))
    }

    async fn list(&self, filter: &OpportunityFilter) -> Result<Vec<Opportunity>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    async fn update(&self, id: &str, patch: &OpportunityPatch) -> Result<Opportunity> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| AnalystError::NotFound(id.to_string()))?;

        if patch.is_empty() {
            return Ok(record.clone());
        }

        patch.apply_to(record)?;
        record.updated_at = model::next_update_stamp(record.updated_at);

        debug!(id, fields = ?patch.field_names(), "Updated opportunity");
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.records.remove(id).is_none() {
            return Err(AnalystError::NotFound(id.to_string()));
        }
        inner.order.retain(|existing| existing != id);

        debug!(id, "Deleted opportunity");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OpportunityType;
    use crate::store::conformance;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_conformance() {
        conformance::run_all(|| async { MemoryOpportunityStore::new() }).await;
    }

    #[tokio::test]
    async fn test_concurrent_adds() {
        let store = Arc::new(MemoryOpportunityStore::new());

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let new = NewOpportunity::new(
                        format!("Signal {i}"),
                        "solana",
                        OpportunityType::Watch,
                        50.0,
                        "concurrent",
                    );
                    store.add(new).await.unwrap()
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 20);
        assert_eq!(
            store.list(&OpportunityFilter::all()).await.unwrap().len(),
            20
        );
    }
}
