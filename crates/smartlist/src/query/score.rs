//! Relevance scoring for matched items.

use super::evaluate::TermMatch;
use super::expression::SearchField;

const TITLE_BASE: f64 = 10.0;
const TITLE_WEIGHT: f64 = 3.0;
const COLLECTION_BASE: f64 = 7.0;
const COLLECTION_WEIGHT: f64 = 2.0;
const DESCRIPTION_BASE: f64 = 5.0;
const DESCRIPTION_WEIGHT: f64 = 1.0;
const METADATA_BASE: f64 = 3.0;
const METADATA_WEIGHT: f64 = 0.5;

/// Returns the `(base score, weight)` pair for a field.
pub fn field_score_constants(field: SearchField) -> (f64, f64) {
    match field {
        SearchField::Title => (TITLE_BASE, TITLE_WEIGHT),
        SearchField::CollectionName => (COLLECTION_BASE, COLLECTION_WEIGHT),
        SearchField::Description => (DESCRIPTION_BASE, DESCRIPTION_WEIGHT),
        SearchField::Duration | SearchField::PublishDate => (METADATA_BASE, METADATA_WEIGHT),
    }
}

/// Fraction of the field covered by the match. Phrases always count as 1.0.
pub fn completeness(hit: &TermMatch) -> f64 {
    if hit.is_phrase {
        return 1.0;
    }
    if hit.field_chars == 0 {
        return 0.0;
    }
    let matched = hit.char_range.len() as f64;
    (matched / hit.field_chars as f64).min(1.0)
}

pub fn score_term_match(hit: &TermMatch) -> f64 {
    let (base, weight) = field_score_constants(hit.field);
    base * weight * completeness(hit)
}

/// Sums the contribution of every leaf hit.
pub fn score_contributions(contributions: &[TermMatch]) -> f64 {
    contributions.iter().map(score_term_match).sum()
}
