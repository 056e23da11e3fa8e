//! Search and smart-list rule engine for a content collection.
//!
//! This crate provides:
//! - A free-text query language with field scopes, phrases and negation
//! - Relevance-ranked search with highlight snippets
//! - Typed filter sets and declarative rule sets (smart lists, auto-archive)
//! - Relative date periods resolved against a caller-supplied calendar
//! - Staleness tracking for cached rule set results
//! - Document-store persistence for rule sets and tracker state
//!
//! Every engine function is synchronous and pure. Items, configuration and
//! the evaluation instant are passed in explicitly.

pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod query;
pub mod rules;
pub mod search;
pub mod sort;
pub mod staleness;
pub mod store;
pub mod temporal;
pub mod types;

#[cfg(test)]
mod fixtures;

// Re-export main types
pub use catalog::RuleSetCatalog;
pub use config::{CalendarConfig, EngineConfig};
pub use error::{EngineError, Result};
pub use filter::{evaluate_filter_set, FilterCondition, FilterCriterion, FilterSet};
pub use query::{evaluate_query, QueryExpression, QueryParser, SearchQueryMatcher};
pub use rules::{
    evaluate_rule_set, Comparator, InvalidRule, Rule, RuleSet, RuleSetMatcher, RuleType, RuleValue,
};
pub use search::{search, SearchOptions, SearchOutcome, SearchResult};
pub use sort::{SortDirection, SortKey, SortOrder};
pub use staleness::{should_reevaluate, SmartListCache, StalenessState, StalenessTracker};
pub use store::{DocumentStore, ItemSource, JsonFileStore, MemoryDocumentStore, RuleRepository};
pub use temporal::{resolve_period, DateRange, RelativePeriod};
pub use types::{CombinationLogic, DownloadStatus, Item, PlayStatus};
