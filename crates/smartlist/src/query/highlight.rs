//! Highlight extraction for search results.
//!
//! Two outputs:
//! - `build_highlights` turns the contributing leaf hits of one item into
//!   field ranges with a short context snippet.
//! - `derive_highlight_terms` lists the positive query terms for UI
//!   highlighting, sorted, deduplicated and case-folded.

use std::collections::BTreeSet;
use std::ops::Range;

use serde::Serialize;

use super::context::ItemQueryContext;
use super::evaluate::TermMatch;
use super::expression::{QueryExpression, QueryTerm, SearchField};
use super::text_match::{byte_offset, fold_case};

/// Upper bound on context characters kept on each side of a match.
pub const MAX_SNIPPET_CONTEXT_CHARS: usize = 40;

/// A highlighted match inside one field of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub field: SearchField,
    /// Char range of the match within the field.
    pub range: Range<usize>,
    /// The match plus up to `context_chars` characters on each side,
    /// truncated at the field boundaries.
    pub snippet: String,
}

/// Builds one highlight per distinct `(field, range)` hit.
pub fn build_highlights(
    contributions: &[TermMatch],
    context: &ItemQueryContext,
    context_chars: usize,
) -> Vec<Highlight> {
    let context_chars = context_chars.min(MAX_SNIPPET_CONTEXT_CHARS);
    let mut seen = BTreeSet::new();
    let mut highlights = Vec::new();

    for hit in contributions {
        if !seen.insert((hit.field, hit.char_range.start, hit.char_range.end)) {
            continue;
        }
        let Some(text) = context.field(hit.field) else {
            continue;
        };
        highlights.push(Highlight {
            field: hit.field,
            range: hit.char_range.clone(),
            snippet: snippet_around(text.original(), &hit.char_range, context_chars),
        });
    }

    highlights
}

fn snippet_around(text: &str, range: &Range<usize>, context_chars: usize) -> String {
    let start = byte_offset(text, range.start.saturating_sub(context_chars));
    let end = byte_offset(text, range.end.saturating_add(context_chars));
    text.get(start..end).unwrap_or(text).to_string()
}

/// Derives highlight terms from a query expression.
///
/// Negated terms and anything under a `Not` are skipped, since they never
/// appear in a matching item. Phrases are kept whole.
///
/// # Example
/// ```ignore
/// // "tech -ads title:News" -> ["news", "tech"]
/// // "\"Machine Learning\" OR ml" -> ["machine learning", "ml"]
/// ```
pub fn derive_highlight_terms(expr: &QueryExpression) -> Vec<String> {
    let mut collector = HighlightCollector::default();
    collector.collect_expr(expr);
    collector.into_terms()
}

#[derive(Default)]
struct HighlightCollector {
    terms: BTreeSet<String>,
}

impl HighlightCollector {
    fn collect_expr(&mut self, expr: &QueryExpression) {
        match expr {
            QueryExpression::Term(term) => self.collect_term(term),
            QueryExpression::Not(_) => {}
            QueryExpression::And(parts) | QueryExpression::Or(parts) => {
                for part in parts {
                    self.collect_expr(part);
                }
            }
        }
    }

    fn collect_term(&mut self, term: &QueryTerm) {
        if term.negated {
            return;
        }
        let trimmed = term.text.trim();
        if !trimmed.is_empty() {
            self.terms.insert(fold_case(trimmed));
        }
    }

    fn into_terms(self) -> Vec<String> {
        self.terms.into_iter().collect()
    }
}
