use std::{collections::HashMap, sync::Mutex};

use anyhow::Result;

use super::dedupe_store::DedupeStore;

/// Keeps keys in memory. Only used in tests.
#[derive(Default)]
pub struct MemoryDedupeStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryDedupeStore {
    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }
}

impl DedupeStore for MemoryDedupeStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
