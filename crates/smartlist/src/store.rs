//! Persistence collaborators.
//!
//! The engine never fetches or stores data on its own. Callers supply items
//! through [`ItemSource`] and persist filter sets, rule sets, catalogs and
//! staleness markers through a [`DocumentStore`], wrapped by
//! [`RuleRepository`] for typed access.

mod file;
mod memory;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::RuleSetCatalog;
use crate::error::{EngineError, Result};
use crate::filter::FilterSet;
use crate::rules::RuleSet;
use crate::staleness::{StalenessState, StalenessTracker};
use crate::types::{CombinationLogic, Item};

pub use file::JsonFileStore;
pub use memory::MemoryDocumentStore;

pub const FILTER_SETS: &str = "filterSets";
pub const RULE_SETS: &str = "ruleSets";
pub const CATALOGS: &str = "catalogs";
pub const STALENESS: &str = "staleness";

/// Supplies the current item collection.
pub trait ItemSource {
    fn all_items(&self) -> Vec<Item>;
}

impl ItemSource for [Item] {
    fn all_items(&self) -> Vec<Item> {
        self.to_vec()
    }
}

impl ItemSource for Vec<Item> {
    fn all_items(&self) -> Vec<Item> {
        self.clone()
    }
}

impl<T: ItemSource + ?Sized> ItemSource for &T {
    fn all_items(&self) -> Vec<Item> {
        (**self).all_items()
    }
}

impl<T: ItemSource + ?Sized> ItemSource for Arc<T> {
    fn all_items(&self) -> Vec<Item> {
        (**self).all_items()
    }
}

/// JSON documents addressed by namespace and key.
pub trait DocumentStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>>;

    fn put(&self, namespace: &str, key: &str, document: Value) -> Result<()>;

    /// Returns whether a document was removed.
    fn delete(&self, namespace: &str, key: &str) -> Result<bool>;

    /// Keys in `namespace`, sorted.
    fn keys(&self, namespace: &str) -> Result<Vec<String>>;
}

/// Rejects keys that are empty, relative path components, or contain path
/// separators.
pub fn validate_key(key: &str) -> Result<()> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.chars().any(|ch| matches!(ch, '/' | '\\' | '\0'));
    if invalid {
        return Err(EngineError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Typed load/save of engine records over a [`DocumentStore`].
pub struct RuleRepository<S> {
    store: S,
}

impl<S: DocumentStore> RuleRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load_filter_set(&self, id: &str) -> Result<Option<FilterSet>> {
        self.load(FILTER_SETS, id)
    }

    pub fn save_filter_set(&self, id: &str, filter_set: &FilterSet) -> Result<()> {
        self.save(FILTER_SETS, id, filter_set)
    }

    pub fn load_rule_set(&self, id: &str) -> Result<Option<RuleSet>> {
        self.load(RULE_SETS, id)
    }

    /// Saves a rule set under its own id.
    pub fn save_rule_set(&self, rule_set: &RuleSet) -> Result<()> {
        self.save(RULE_SETS, &rule_set.id, rule_set)
    }

    pub fn delete_rule_set(&self, id: &str) -> Result<bool> {
        self.store.delete(RULE_SETS, id)
    }

    pub fn rule_set_ids(&self) -> Result<Vec<String>> {
        self.store.keys(RULE_SETS)
    }

    pub fn load_catalog(&self, id: &str) -> Result<Option<RuleSetCatalog>> {
        self.load(CATALOGS, id)
    }

    pub fn save_catalog(&self, id: &str, catalog: &RuleSetCatalog) -> Result<()> {
        self.save(CATALOGS, id, catalog)
    }

    pub fn load_staleness(&self, id: &str) -> Result<Option<StalenessState>> {
        self.load(STALENESS, id)
    }

    pub fn save_staleness(&self, id: &str, state: &StalenessState) -> Result<()> {
        self.save(STALENESS, id, state)
    }

    /// Persists every state the tracker holds.
    pub fn save_tracker(&self, tracker: &StalenessTracker) -> Result<()> {
        for (id, state) in tracker.snapshot() {
            self.save_staleness(&id, &state)?;
        }
        Ok(())
    }

    /// Loads every persisted staleness state into `tracker`.
    pub fn restore_tracker(&self, tracker: &StalenessTracker) -> Result<()> {
        let mut states = std::collections::BTreeMap::new();
        for id in self.store.keys(STALENESS)? {
            if let Some(state) = self.load_staleness(&id)? {
                states.insert(id, state);
            }
        }
        tracker.restore(states);
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Result<Option<T>> {
        self.store
            .get(namespace, key)?
            .map(|document| decode_document(namespace, document))
            .transpose()
    }

    fn save<T: Serialize>(&self, namespace: &str, key: &str, record: &T) -> Result<()> {
        let document = serde_json::to_value(record)?;
        self.store.put(namespace, key, document)
    }
}

/// Decodes a document from `namespace` after checking its `logic` fields,
/// so a bad value surfaces as [`EngineError::InvalidLogic`] before anything
/// else.
pub fn decode_document<T: DeserializeOwned>(namespace: &str, document: Value) -> Result<T> {
    for holder in logic_holders(namespace, &document) {
        if let Some(logic) = holder.get("logic") {
            check_logic(logic)?;
        }
    }
    Ok(serde_json::from_value(document)?)
}

/// The objects that carry a `logic` field for records stored in `namespace`.
fn logic_holders<'a>(namespace: &str, document: &'a Value) -> Vec<&'a Value> {
    match namespace {
        FILTER_SETS | RULE_SETS => vec![document],
        CATALOGS => {
            let mut holders = document.get("global").into_iter().collect::<Vec<_>>();
            if let Some(Value::Object(overrides)) = document.get("collectionOverrides") {
                holders.extend(overrides.values());
            }
            holders
        }
        _ => Vec::new(),
    }
}

fn check_logic(value: &Value) -> Result<()> {
    match value {
        Value::String(raw) => raw.parse::<CombinationLogic>().map(|_| ()),
        other => Err(EngineError::InvalidLogic(other.to_string())),
    }
}
