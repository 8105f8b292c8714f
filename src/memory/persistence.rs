//! Loading and saving the memory store.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::MemoryStore;
use crate::error::LLMError;

/// Durable home of a [`MemoryStore`].
#[async_trait]
pub trait MemoryPersistence: Send + Sync {
    /// Reads the stored document.
    ///
    /// A missing document is an empty store; an unreadable or unparsable one
    /// is `MalformedPersistedState`.
    async fn try_load(&self) -> Result<MemoryStore, LLMError>;

    /// Overwrites the stored document with `store`.
    async fn save(&self, store: &MemoryStore) -> io::Result<()>;

    /// Reads the stored document, falling back to an empty store.
    async fn load(&self) -> MemoryStore {
        match self.try_load().await {
            Ok(store) => store,
            Err(e) => {
                log::warn!("{e}; starting with empty memory");
                MemoryStore::default()
            }
        }
    }
}

/// Memory kept as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "memory.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl MemoryPersistence for JsonFileStore {
    async fn try_load(&self) -> Result<MemoryStore, LLMError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no memory file at {}", self.path.display());
                return Ok(MemoryStore::default());
            }
            Err(e) => {
                return Err(LLMError::MalformedPersistedState(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_str(&contents).map_err(|e| {
            LLMError::MalformedPersistedState(format!("{}: {e}", self.path.display()))
        })
    }

    async fn save(&self, store: &MemoryStore) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let contents = serde_json::to_string_pretty(store)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        log::debug!("saved memory to {}", self.path.display());
        Ok(())
    }
}

/// Process-local persistence, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    document: Mutex<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with a raw document, valid or not.
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
        }
    }

    /// The last saved document, if any.
    pub async fn document(&self) -> Option<String> {
        self.document.lock().await.clone()
    }
}

#[async_trait]
impl MemoryPersistence for InMemoryStore {
    async fn try_load(&self) -> Result<MemoryStore, LLMError> {
        match self.document.lock().await.as_deref() {
            Some(doc) => serde_json::from_str(doc)
                .map_err(|e| LLMError::MalformedPersistedState(e.to_string())),
            None => Ok(MemoryStore::default()),
        }
    }

    async fn save(&self, store: &MemoryStore) -> io::Result<()> {
        let doc = serde_json::to_string(store)?;
        *self.document.lock().await = Some(doc);
        Ok(())
    }
}
