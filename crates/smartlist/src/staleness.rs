//! Scheduling of rule set re-evaluation.
//!
//! [`should_reevaluate`] is the pure decision. [`StalenessTracker`] keeps the
//! per-rule-set state it needs, one lock per rule set id, and
//! [`SmartListCache`] uses it to re-run the rule engine only when a cached
//! result is stale.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::rules::{evaluate_rule_set, RuleSet};
use crate::store::ItemSource;

/// Decides whether a cached rule set result must be recomputed.
///
/// Stale when it was never evaluated, when `refresh_interval` has elapsed
/// since `last_evaluated`, or when it was invalidated after that. A
/// `last_evaluated` in the future is treated as stale.
pub fn should_reevaluate(
    rule_set_id: &str,
    last_evaluated: Option<DateTime<Utc>>,
    refresh_interval: TimeDelta,
    invalidated_since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let Some(last_evaluated) = last_evaluated else {
        log::trace!("rule set {rule_set_id}: never evaluated");
        return true;
    };
    if last_evaluated > now {
        log::warn!(
            "rule set {rule_set_id}: last evaluated at {last_evaluated}, after now ({now}); re-evaluating"
        );
        return true;
    }

    let expired = now - last_evaluated >= refresh_interval;
    let invalidated = invalidated_since.is_some_and(|since| since > last_evaluated);
    log::trace!("rule set {rule_set_id}: expired={expired} invalidated={invalidated}");
    expired || invalidated
}

/// Persistable staleness markers for one rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StalenessState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidated_since: Option<DateTime<Utc>>,
}

impl StalenessState {
    pub fn is_stale(&self, rule_set_id: &str, refresh_interval: TimeDelta, now: DateTime<Utc>) -> bool {
        should_reevaluate(
            rule_set_id,
            self.last_evaluated,
            refresh_interval,
            self.invalidated_since,
            now,
        )
    }

    fn invalidate(&mut self, at: DateTime<Utc>) {
        self.invalidated_since = Some(self.invalidated_since.map_or(at, |since| since.max(at)));
    }
}

/// In-memory staleness registry.
///
/// Each rule set id has its own mutex, so writers for one id are serialized
/// while different ids proceed independently.
#[derive(Debug, Default)]
pub struct StalenessTracker {
    entries: RwLock<HashMap<String, Arc<Mutex<StalenessState>>>>,
}

impl StalenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, rule_set_id: &str) -> Arc<Mutex<StalenessState>> {
        if let Some(entry) = self.entries.read().get(rule_set_id) {
            return Arc::clone(entry);
        }
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(rule_set_id.to_string()).or_default())
    }

    /// Marks a rule set stale as of `at`.
    pub fn invalidate(&self, rule_set_id: &str, at: DateTime<Utc>) {
        self.entry(rule_set_id).lock().invalidate(at);
    }

    /// Marks every known rule set stale as of `at`.
    pub fn invalidate_all(&self, at: DateTime<Utc>) {
        let entries = self.entries.read();
        for entry in entries.values() {
            entry.lock().invalidate(at);
        }
    }

    pub fn mark_evaluated(&self, rule_set_id: &str, at: DateTime<Utc>) {
        self.entry(rule_set_id).lock().last_evaluated = Some(at);
    }

    /// Forgets a rule set, so its next check is stale.
    pub fn reset(&self, rule_set_id: &str) {
        self.entries.write().remove(rule_set_id);
    }

    pub fn state(&self, rule_set_id: &str) -> StalenessState {
        self.entries
            .read()
            .get(rule_set_id)
            .map(|entry| *entry.lock())
            .unwrap_or_default()
    }

    pub fn should_reevaluate(
        &self,
        rule_set_id: &str,
        refresh_interval: TimeDelta,
        now: DateTime<Utc>,
    ) -> bool {
        self.state(rule_set_id)
            .is_stale(rule_set_id, refresh_interval, now)
    }

    /// Runs `refresh` while holding the rule set's lock, only when stale.
    ///
    /// On success the rule set is marked evaluated at `now`. Returns `None`
    /// when the cached result is still fresh.
    pub fn refresh_with<T>(
        &self,
        rule_set_id: &str,
        refresh_interval: TimeDelta,
        now: DateTime<Utc>,
        refresh: impl FnOnce() -> T,
    ) -> Option<T> {
        let entry = self.entry(rule_set_id);
        let mut state = entry.lock();
        if !state.is_stale(rule_set_id, refresh_interval, now) {
            return None;
        }
        let value = refresh();
        state.last_evaluated = Some(now);
        Some(value)
    }

    /// Copies every state out for persistence.
    pub fn snapshot(&self) -> BTreeMap<String, StalenessState> {
        self.entries
            .read()
            .iter()
            .map(|(id, entry)| (id.clone(), *entry.lock()))
            .collect()
    }

    /// Replaces the registry with persisted states.
    pub fn restore(&self, states: BTreeMap<String, StalenessState>) {
        let restored = states
            .into_iter()
            .map(|(id, state)| (id, Arc::new(Mutex::new(state))))
            .collect();
        *self.entries.write() = restored;
    }
}

/// Caches rule set results by item id, recomputing only stale sets.
pub struct SmartListCache<S> {
    source: S,
    calendar: CalendarConfig,
    tracker: StalenessTracker,
    results: RwLock<HashMap<String, Vec<String>>>,
}

impl<S: ItemSource> SmartListCache<S> {
    pub fn new(source: S, calendar: CalendarConfig) -> Self {
        Self {
            source,
            calendar,
            tracker: StalenessTracker::new(),
            results: RwLock::new(HashMap::new()),
        }
    }

    pub fn tracker(&self) -> &StalenessTracker {
        &self.tracker
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn invalidate(&self, rule_set_id: &str, at: DateTime<Utc>) {
        self.tracker.invalidate(rule_set_id, at);
    }

    /// Returns the ids of the items `rule_set` selects, re-evaluating it
    /// against the item source when the cached result is stale or missing.
    pub fn item_ids(&self, rule_set: &RuleSet, now: DateTime<Utc>) -> Vec<String> {
        if !self.results.read().contains_key(&rule_set.id) {
            self.tracker.reset(&rule_set.id);
        }

        let refreshed = self
            .tracker
            .refresh_with(&rule_set.id, rule_set.refresh_interval(), now, || {
                let items = self.source.all_items();
                let ids = evaluate_rule_set(&items, rule_set, now, &self.calendar)
                    .into_iter()
                    .map(|item| item.id.clone())
                    .collect::<Vec<_>>();
                log::debug!(
                    "refreshed smart list {} with {} of {} items",
                    rule_set.id,
                    ids.len(),
                    items.len()
                );
                self.results.write().insert(rule_set.id.clone(), ids.clone());
                ids
            });

        match refreshed {
            Some(ids) => ids,
            None => self
                .results
                .read()
                .get(&rule_set.id)
                .cloned()
                .unwrap_or_default(),
        }
    }
}
