use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use super::{validate_key, DocumentStore};
use crate::error::Result;

/// A [`DocumentStore`] held in memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>> {
        validate_key(namespace)?;
        validate_key(key)?;
        let documents = self.documents.read();
        Ok(documents
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, document: Value) -> Result<()> {
        validate_key(namespace)?;
        validate_key(key)?;
        self.documents
            .write()
            .insert((namespace.to_string(), key.to_string()), document);
        log::debug!("stored {namespace}/{key} in memory");
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        validate_key(namespace)?;
        validate_key(key)?;
        Ok(self
            .documents
            .write()
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }

    fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        validate_key(namespace)?;
        let mut keys = self
            .documents
            .read()
            .keys()
            .filter(|(candidate, _)| candidate == namespace)
            .map(|(_, key)| key.clone())
            .collect::<Vec<_>>();
        keys.sort();
        Ok(keys)
    }
}
