//! Rule set evaluation.

use chrono::{DateTime, Utc};

use crate::config::CalendarConfig;
use crate::sort::{sort_items, SortOrder};
use crate::types::{CombinationLogic, Item};

use super::compile::{compile_rule, CompiledRule, InvalidRule};
use super::model::{RuleSet, RuleType};

/// A rule set compiled against a fixed evaluation instant.
#[derive(Debug, Clone)]
pub struct RuleSetMatcher {
    rule_set_id: String,
    logic: CombinationLogic,
    rules: Vec<CompiledRule>,
    skipped: Vec<(usize, InvalidRule)>,
    includes_archived: bool,
    sort: Option<SortOrder>,
}

impl RuleSetMatcher {
    /// Compiles every rule, resolving relative periods against `now`.
    ///
    /// Invalid rules are logged and dropped from the combination.
    pub fn compile(rule_set: &RuleSet, now: DateTime<Utc>, calendar: &CalendarConfig) -> Self {
        let mut rules = Vec::with_capacity(rule_set.rules.len());
        let mut skipped = Vec::new();

        for (index, rule) in rule_set.rules.iter().enumerate() {
            match compile_rule(rule, now, calendar) {
                Ok(compiled) => rules.push(compiled),
                Err(error) => {
                    log::debug!(
                        "skipping rule {index} ({} {}) of rule set {}: {error}",
                        rule.rule_type,
                        rule.comparator,
                        rule_set.id
                    );
                    skipped.push((index, error));
                }
            }
        }

        let includes_archived = rules
            .iter()
            .any(|rule| rule.rule_type() == RuleType::IsArchived);

        Self {
            rule_set_id: rule_set.id.clone(),
            logic: rule_set.logic,
            rules,
            skipped,
            includes_archived,
            sort: rule_set.sort,
        }
    }

    pub fn rule_set_id(&self) -> &str {
        &self.rule_set_id
    }

    /// Number of rules that take part in the combination.
    pub fn effective_rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn skipped_rules(&self) -> &[(usize, InvalidRule)] {
        &self.skipped
    }

    /// Archived items only match when an effective `isArchived` rule exists.
    pub fn matches(&self, item: &Item) -> bool {
        if item.is_archived && !self.includes_archived {
            return false;
        }
        self.logic.matches(&self.rules, |rule| rule.matches(item))
    }

    /// Returns matching items, sorted by the rule set's order or else in
    /// input order.
    pub fn evaluate<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> Vec<&'a Item> {
        let mut scanned = 0usize;
        let mut matched = items
            .into_iter()
            .inspect(|_| scanned += 1)
            .filter(|item| self.matches(item))
            .collect::<Vec<_>>();
        if let Some(order) = self.sort {
            sort_items(&mut matched, order);
        }

        log::debug!(
            "rule set {} ({} rules, {} skipped, {}) matched {} of {scanned} items",
            self.rule_set_id,
            self.rules.len(),
            self.skipped.len(),
            self.logic,
            matched.len()
        );
        matched
    }
}

/// Evaluates one rule set against one collection.
pub fn evaluate_rule_set<'a>(
    items: impl IntoIterator<Item = &'a Item>,
    rule_set: &RuleSet,
    now: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> Vec<&'a Item> {
    RuleSetMatcher::compile(rule_set, now, calendar).evaluate(items)
}
