//! Query matcher for search operations.

use crate::types::Item;

use super::context::ItemQueryContext;
use super::evaluate::{evaluate_expression, Evaluation};
use super::expression::{query_expression_has_terms, QueryExpression};
use super::highlight::{build_highlights, derive_highlight_terms, Highlight};
use super::parser::QueryParser;
use super::score::score_contributions;

/// A scored, highlighted match produced by [`SearchQueryMatcher::score_item`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub score: f64,
    pub highlights: Vec<Highlight>,
}

/// A compiled query matcher for search operations.
#[derive(Debug, Clone)]
pub struct SearchQueryMatcher {
    expression: QueryExpression,
}

impl SearchQueryMatcher {
    /// Parses a raw query string into a matcher. Never fails.
    pub fn compile(raw_query: &str) -> Self {
        Self::from_expression(QueryParser::parse(raw_query))
    }

    pub fn from_expression(expression: QueryExpression) -> Self {
        Self { expression }
    }

    /// Returns the parsed expression.
    pub fn expression(&self) -> &QueryExpression {
        &self.expression
    }

    /// Whether the query has at least one non-degenerate term.
    pub fn has_terms(&self) -> bool {
        query_expression_has_terms(&self.expression)
    }

    /// Returns terms that should be highlighted in search results.
    pub fn highlight_terms(&self) -> Vec<String> {
        derive_highlight_terms(&self.expression)
    }

    pub fn evaluate(&self, item: &Item) -> Evaluation {
        evaluate_expression(&self.expression, &ItemQueryContext::new(item))
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.evaluate(item).matched
    }

    /// Evaluates, scores and highlights one item.
    ///
    /// Returns `None` unless the item matches with at least one contributing
    /// term.
    pub fn score_item(&self, item: &Item, context_chars: usize) -> Option<ScoredMatch> {
        let context = ItemQueryContext::new(item);
        let evaluation = evaluate_expression(&self.expression, &context);
        if !evaluation.matched || evaluation.contributions.is_empty() {
            return None;
        }
        Some(ScoredMatch {
            score: score_contributions(&evaluation.contributions),
            highlights: build_highlights(&evaluation.contributions, &context, context_chars),
        })
    }
}
