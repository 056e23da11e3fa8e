//! Smart-list and auto-archive rule evaluation.
//!
//! This module provides:
//! - Rule records (`Rule`, `RuleSet`, `RuleValue`)
//! - Compilation of the rule type / comparator matrix into predicates
//! - Evaluation of one rule set against one item collection

mod compile;
mod engine;
mod model;

#[cfg(test)]
mod tests;

// Re-export main types
pub use compile::{compile_rule, CompiledRule, InvalidRule};
pub use engine::{evaluate_rule_set, RuleSetMatcher};
pub use model::{
    Comparator, Rule, RuleSet, RuleType, RuleValue, DEFAULT_REFRESH_INTERVAL_SECS,
};
