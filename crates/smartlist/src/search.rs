//! Free-text search over an item collection.
//!
//! Items are scanned linearly; each one is evaluated against the compiled
//! query, scored, and highlighted. Results are ranked by score, then by
//! more recent publish date, then by title, then by id.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::query::{Highlight, SearchQueryMatcher, MAX_SNIPPET_CONTEXT_CHARS};
use crate::sort::compare_text;
use crate::types::Item;

/// Caller-supplied search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Archived items are skipped unless this is set.
    pub include_archived: bool,
    pub max_results: Option<usize>,
    /// Context characters on each side of a highlight, at most 40.
    pub snippet_context_chars: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_archived: false,
            max_results: None,
            snippet_context_chars: MAX_SNIPPET_CONTEXT_CHARS,
        }
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<'a> {
    pub item: &'a Item,
    pub score: f64,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome<'a> {
    pub results: Vec<SearchResult<'a>>,
    /// Number of matches before `max_results` truncation.
    pub count: usize,
    pub truncated: bool,
    /// Number of items evaluated (after the archived exclusion).
    pub scanned: usize,
    pub highlight_terms: Vec<String>,
}

impl<'a> SearchOutcome<'a> {
    pub fn items(&self) -> impl Iterator<Item = &'a Item> + '_ {
        self.results.iter().map(|result| result.item)
    }
}

/// Parses `query` and searches `items`.
pub fn search<'a>(
    query: &str,
    items: impl IntoIterator<Item = &'a Item>,
    options: &SearchOptions,
) -> SearchOutcome<'a> {
    let matcher = SearchQueryMatcher::compile(query);
    search_with_matcher(&matcher, items, options)
}

/// Searches `items` with an already compiled matcher.
pub fn search_with_matcher<'a>(
    matcher: &SearchQueryMatcher,
    items: impl IntoIterator<Item = &'a Item>,
    options: &SearchOptions,
) -> SearchOutcome<'a> {
    let mut scanned = 0usize;
    let mut results = Vec::new();

    for item in items {
        if item.is_archived && !options.include_archived {
            continue;
        }
        scanned += 1;

        let Some(scored) = matcher.score_item(item, options.snippet_context_chars) else {
            continue;
        };
        results.push(SearchResult {
            item,
            score: scored.score,
            highlights: scored.highlights,
        });
    }

    results.sort_by(compare_results);
    let count = results.len();
    let truncated = options
        .max_results
        .is_some_and(|max_results| count > max_results);
    if let Some(max_results) = options.max_results {
        results.truncate(max_results);
    }

    log::debug!(
        "search scanned {scanned} items, matched {count}, returned {}",
        results.len()
    );

    SearchOutcome {
        results,
        count,
        truncated,
        scanned,
        highlight_terms: matcher.highlight_terms(),
    }
}

fn compare_results(left: &SearchResult<'_>, right: &SearchResult<'_>) -> Ordering {
    right
        .score
        .total_cmp(&left.score)
        .then_with(|| match (left.item.publish_date, right.item.publish_date) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| compare_text(&left.item.title, &right.item.title))
        .then_with(|| left.item.id.cmp(&right.item.id))
}
