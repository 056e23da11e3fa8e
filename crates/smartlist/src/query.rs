//! Query parsing, evaluation, and scoring for free-text search.
//!
//! This module provides the query language for item search, including:
//! - Expression types (AND, OR, NOT, field-scoped terms and phrases)
//! - Query parsing and tokenization
//! - Per-item evaluation with contributing term hits
//! - Relevance scoring and highlight snippets

mod context;
mod evaluate;
mod expression;
mod highlight;
mod matcher;
mod parser;
mod score;
mod text_match;

// Re-export public types
pub use evaluate::{evaluate_query, Evaluation, TermMatch};
pub use expression::{query_expression_has_terms, QueryExpression, QueryTerm, SearchField};
pub use highlight::{derive_highlight_terms, Highlight, MAX_SNIPPET_CONTEXT_CHARS};
pub use matcher::{ScoredMatch, SearchQueryMatcher};
pub use parser::QueryParser;
pub use score::{field_score_constants, score_contributions};

pub(crate) use text_match::fold_case;
