use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::CatalogEntry;
use crate::app::ports::PersistencePort;
use crate::error::{PipelineError, Result};

/// In-memory persistence for development/testing
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    entries: Arc<Mutex<Vec<CatalogEntry>>>,
    index: Arc<Mutex<HashMap<String, usize>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl PersistencePort for InMemoryPersistence {
    async fn append(&self, entry: &CatalogEntry) -> Result<()> {
        let mut index = self.index.lock().unwrap_or_else(|e| e.into_inner());
        if index.contains_key(&entry.dataset_id) {
            return Err(PipelineError::Persistence(format!(
                "dataset {} is already stored",
                entry.dataset_id
            )));
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        index.insert(entry.dataset_id.clone(), entries.len());
        entries.push(entry.clone());

        debug!("Stored catalog entry: {} with id {}", entry.name, entry.dataset_id);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<CatalogEntry>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.iter().rev().cloned().collect())
    }
}
