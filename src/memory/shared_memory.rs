use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{MemoryFact, MemoryStore};

/// A [`MemoryStore`] shared by every session of the same owner.
///
/// Writers take the lock exclusively, so concurrent sessions never lose
/// each other's updates to a category.
#[derive(Clone, Default)]
pub struct SharedMemory {
    inner: Arc<RwLock<MemoryStore>>,
}

impl SharedMemory {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, MemoryStore> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, MemoryStore> {
        self.inner.write().await
    }

    /// Copy of the current store, for rendering or persisting without holding the lock.
    pub async fn snapshot(&self) -> MemoryStore {
        self.inner.read().await.clone()
    }

    pub async fn add_all(&self, facts: Vec<MemoryFact>) {
        if facts.is_empty() {
            return;
        }
        let mut guard = self.inner.write().await;
        guard.extend(facts);
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}
