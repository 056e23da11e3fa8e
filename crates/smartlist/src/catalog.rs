//! Global and per-collection rule set selection for auto-archiving.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::rules::{RuleSet, RuleSetMatcher};
use crate::types::Item;

/// A global rule set plus overrides keyed by collection name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetCatalog {
    pub global: RuleSet,
    #[serde(default)]
    pub collection_overrides: BTreeMap<String, RuleSet>,
}

impl RuleSetCatalog {
    pub fn new(global: RuleSet) -> Self {
        Self {
            global,
            collection_overrides: BTreeMap::new(),
        }
    }

    /// The override for `collection` if one exists, else the global set.
    pub fn rule_set_for(&self, collection: &str) -> &RuleSet {
        self.collection_overrides
            .get(collection)
            .unwrap_or(&self.global)
    }

    /// Installs an override, returning the one it replaced.
    pub fn set_override(&mut self, collection: impl Into<String>, rule_set: RuleSet) -> Option<RuleSet> {
        self.collection_overrides.insert(collection.into(), rule_set)
    }

    pub fn remove_override(&mut self, collection: &str) -> Option<RuleSet> {
        self.collection_overrides.remove(collection)
    }

    /// Returns the items each collection's rule set selects, in input order.
    ///
    /// Every rule set is compiled once for the call.
    pub fn archive_candidates<'a>(
        &self,
        items: impl IntoIterator<Item = &'a Item>,
        now: DateTime<Utc>,
        calendar: &CalendarConfig,
    ) -> Vec<&'a Item> {
        let global = RuleSetMatcher::compile(&self.global, now, calendar);
        let overrides = self
            .collection_overrides
            .iter()
            .map(|(collection, rule_set)| {
                (
                    collection.as_str(),
                    RuleSetMatcher::compile(rule_set, now, calendar),
                )
            })
            .collect::<HashMap<_, _>>();

        let candidates = items
            .into_iter()
            .filter(|item| {
                overrides
                    .get(item.collection_name.as_str())
                    .unwrap_or(&global)
                    .matches(item)
            })
            .collect::<Vec<_>>();

        log::debug!(
            "archive candidates: {} ({} collection overrides)",
            candidates.len(),
            overrides.len()
        );
        candidates
    }
}
