//! In-memory capsule store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Capsule, CapsuleError, CapsuleId, FragmentUpdate, reposition};
use crate::ports::{CapsuleFilter, CapsuleStore, SortOrder};

/// In-memory store state.
#[derive(Default)]
struct InMemoryStoreState {
    /// All records (single source of truth).
    records: HashMap<CapsuleId, Capsule>,
}

impl InMemoryStoreState {
    fn list(&self, filter: &CapsuleFilter) -> Vec<Capsule> {
        let mut out: Vec<Capsule> = self
            .records
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        // id breaks ties so equal timestamps still list deterministically
        match filter.order {
            SortOrder::NewestFirst => {
                out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
            SortOrder::SoonestUnlock => {
                out.sort_by(|a, b| a.unlock_date.cmp(&b.unlock_date).then(a.id.cmp(&b.id)))
            }
        }
        out
    }
}

/// `CapsuleStore` backed by a `HashMap` behind a tokio mutex.
///
/// Every operation holds the lock for its whole duration, so each single
/// record write is atomic. Cloning shares the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryCapsuleStore {
    state: Arc<Mutex<InMemoryStoreState>>,
}

impl InMemoryCapsuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CapsuleStore for InMemoryCapsuleStore {
    async fn create(&self, capsule: Capsule) -> Result<CapsuleId, CapsuleError> {
        let mut state = self.state.lock().await;
        let id = capsule.id;
        if state.records.contains_key(&id) {
            return Err(CapsuleError::Internal(format!("duplicate id {id}")));
        }
        state.records.insert(id, capsule);
        Ok(id)
    }

    async fn load(&self, id: CapsuleId) -> Result<Option<Capsule>, CapsuleError> {
        let state = self.state.lock().await;
        Ok(state.records.get(&id).cloned())
    }

    async fn update_position(
        &self,
        id: CapsuleId,
        update: FragmentUpdate,
    ) -> Result<Option<Capsule>, CapsuleError> {
        let mut state = self.state.lock().await;
        let Some(record) = state.records.get_mut(&id) else {
            return Ok(None);
        };
        // merge against the fragment stored right now, under the lock
        record.fragment = reposition(record.fragment, update)?;
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: CapsuleId) -> Result<bool, CapsuleError> {
        let mut state = self.state.lock().await;
        Ok(state.records.remove(&id).is_some())
    }

    async fn list_candidates(&self, filter: &CapsuleFilter) -> Result<Vec<Capsule>, CapsuleError> {
        let state = self.state.lock().await;
        Ok(state.list(filter))
    }
}
