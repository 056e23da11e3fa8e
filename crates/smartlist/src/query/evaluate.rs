//! Query evaluation against a single item.

use std::ops::Range;

use crate::types::Item;

use super::context::{FieldText, ItemQueryContext};
use super::expression::{QueryExpression, QueryTerm, SearchField};
use super::text_match::{char_offset, find_folded, find_phrase, fold_case};

/// A leaf term hit that contributes to scoring and highlighting.
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
    pub field: SearchField,
    /// The matched text as it appears in the field.
    pub matched: String,
    /// Char range of the match within the field.
    pub char_range: Range<usize>,
    /// Char length of the whole field.
    pub field_chars: usize,
    pub is_phrase: bool,
}

/// Result of evaluating an expression against one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub matched: bool,
    pub contributions: Vec<TermMatch>,
}

impl Evaluation {
    fn rejected() -> Self {
        Self::default()
    }

    fn accepted(contributions: Vec<TermMatch>) -> Self {
        Self {
            matched: true,
            contributions,
        }
    }
}

/// Evaluates `expression` against `item`.
pub fn evaluate_query(expression: &QueryExpression, item: &Item) -> Evaluation {
    let context = ItemQueryContext::new(item);
    evaluate_expression(expression, &context)
}

pub(crate) fn evaluate_expression(
    expression: &QueryExpression,
    context: &ItemQueryContext,
) -> Evaluation {
    match expression {
        QueryExpression::Term(term) => evaluate_term(term, context),
        QueryExpression::Not(inner) => {
            // Partial matches under a negation never contribute.
            let inner = evaluate_expression(inner, context);
            Evaluation {
                matched: !inner.matched,
                contributions: Vec::new(),
            }
        }
        QueryExpression::And(parts) => {
            let mut contributions = Vec::new();
            for part in parts {
                let evaluation = evaluate_expression(part, context);
                if !evaluation.matched {
                    return Evaluation::rejected();
                }
                contributions.extend(evaluation.contributions);
            }
            Evaluation::accepted(contributions)
        }
        QueryExpression::Or(parts) => parts
            .iter()
            .map(|part| evaluate_expression(part, context))
            .find(|evaluation| evaluation.matched)
            .unwrap_or_else(Evaluation::rejected),
    }
}

fn evaluate_term(term: &QueryTerm, context: &ItemQueryContext) -> Evaluation {
    if term.is_degenerate() {
        return Evaluation::accepted(Vec::new());
    }

    let needle = fold_case(&term.text);
    let hit = match term.field {
        Some(field) => find_in_field(field, &needle, term, context),
        None => SearchField::DEFAULT_ORDER
            .iter()
            .find_map(|field| find_in_field(*field, &needle, term, context)),
    };

    match (hit, term.negated) {
        (Some(hit), false) => Evaluation::accepted(vec![hit]),
        (None, false) => Evaluation::rejected(),
        (Some(_), true) => Evaluation::rejected(),
        (None, true) => Evaluation::accepted(Vec::new()),
    }
}

fn find_in_field(
    field: SearchField,
    needle: &str,
    term: &QueryTerm,
    context: &ItemQueryContext,
) -> Option<TermMatch> {
    let text = context.field(field)?;
    let range = if term.is_phrase {
        find_phrase(text.folded(), needle)?
    } else {
        let start = find_folded(text.folded(), needle)?;
        start..start + needle.len()
    };
    Some(term_match(field, text, range, term.is_phrase))
}

fn term_match(
    field: SearchField,
    text: &FieldText,
    bytes: Range<usize>,
    is_phrase: bool,
) -> TermMatch {
    let original = text.original();
    let start = char_offset(original, bytes.start);
    let matched = original.get(bytes).unwrap_or_default().to_string();
    let end = start + matched.chars().count();
    TermMatch {
        field,
        matched,
        char_range: start..end,
        field_chars: text.char_len(),
        is_phrase,
    }
}
