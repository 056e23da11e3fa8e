//! Query parser and tokenizer.
//!
//! Grammar:
//!
//! ```text
//! Query   := OrExpr
//! OrExpr  := AndExpr ("OR" AndExpr)*
//! AndExpr := Term ("AND"? Term)*
//! Term    := ["-"] [field ":"] (phrase | word)
//! ```
//!
//! The parser never fails. Unknown field prefixes, unterminated quotes and
//! stray keywords all degrade to literal text or are skipped.

use super::expression::{QueryExpression, QueryTerm, SearchField};

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToken {
    kind: QueryTokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTokenKind {
    Term(QueryTerm),
    And,
    Or,
}

// ---------------------------------------------------------------------------
// Query parser
// ---------------------------------------------------------------------------

pub struct QueryParser {
    tokens: Vec<QueryToken>,
    index: usize,
}

impl QueryParser {
    /// Parses a free-text query. Empty or whitespace-only input yields
    /// [`QueryExpression::identity`].
    pub fn parse(input: &str) -> QueryExpression {
        let tokens = tokenize_query_input(input);
        if tokens.is_empty() {
            return QueryExpression::identity();
        }

        let mut parser = Self { tokens, index: 0 };
        parser.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> QueryExpression {
        let mut branches = Vec::new();

        while !self.is_end() {
            // Leading and repeated OR separators carry no operand.
            if self.consume_or_keyword() {
                continue;
            }
            let branch = self.parse_and_expression();
            if !branch.is_identity() {
                branches.push(branch);
            }
        }

        match branches.len() {
            0 => QueryExpression::identity(),
            1 => branches.remove(0),
            _ => QueryExpression::Or(branches),
        }
    }

    fn parse_and_expression(&mut self) -> QueryExpression {
        let mut parts = Vec::new();

        while let Some(token) = self.peek() {
            match &token.kind {
                QueryTokenKind::Or => break,
                QueryTokenKind::And => self.index += 1,
                QueryTokenKind::Term(term) => {
                    parts.push(QueryExpression::Term(term.clone()));
                    self.index += 1;
                }
            }
        }

        match parts.len() {
            0 => QueryExpression::identity(),
            1 => parts.remove(0),
            _ => QueryExpression::And(parts),
        }
    }

    fn consume_or_keyword(&mut self) -> bool {
        matches!(
            self.peek().map(|token| &token.kind),
            Some(QueryTokenKind::Or)
        ) && {
            self.index += 1;
            true
        }
    }

    fn is_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self) -> Option<&QueryToken> {
        self.tokens.get(self.index)
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

fn tokenize_query_input(input: &str) -> Vec<QueryToken> {
    let mut tokens = Vec::new();
    let mut cursor = 0usize;

    while let Some(ch) = input[cursor..].chars().next() {
        if ch.is_whitespace() {
            cursor += ch.len_utf8();
            continue;
        }

        let (kind, next_cursor) = scan_token(input, cursor);
        tokens.push(QueryToken { kind });
        cursor = next_cursor;
    }

    tokens
}

fn scan_token(input: &str, start: usize) -> (QueryTokenKind, usize) {
    let word_end = end_of_word(input, start);
    let raw = &input[start..word_end];
    match raw {
        "AND" => return (QueryTokenKind::And, word_end),
        "OR" => return (QueryTokenKind::Or, word_end),
        _ => {}
    }

    let negated = raw.len() > 1 && raw.starts_with('-');
    let mut cursor = if negated { start + 1 } else { start };

    let mut field = None;
    let body = &input[cursor..word_end];
    if let Some(split) = body.find(':') {
        if let Some(known) = SearchField::lookup(&body[..split]) {
            field = Some(known);
            cursor += split + 1;
        }
    }

    if input[cursor..].starts_with('"') {
        if let Some((phrase, next_cursor)) = consume_quoted_phrase(input, cursor) {
            let term = QueryTerm {
                field,
                text: phrase,
                is_phrase: true,
                negated,
            };
            return (QueryTokenKind::Term(term), next_cursor);
        }
        // Unterminated quote: fall through and keep the quote as literal text.
    }

    let term = QueryTerm {
        field,
        text: input[cursor..word_end].to_string(),
        is_phrase: false,
        negated,
    };
    (QueryTokenKind::Term(term), word_end)
}

fn end_of_word(input: &str, start: usize) -> usize {
    input[start..]
        .char_indices()
        .find(|(_, ch)| ch.is_whitespace())
        .map(|(offset, _)| start + offset)
        .unwrap_or(input.len())
}

/// Consumes a `"..."` phrase starting at `start`, honoring `\"` escapes.
///
/// Returns `None` when the closing quote is missing. Internal whitespace is
/// collapsed to single spaces.
fn consume_quoted_phrase(input: &str, start: usize) -> Option<(String, usize)> {
    let mut phrase = String::new();
    let mut escaped = false;

    for (offset, ch) in input[start + 1..].char_indices() {
        if escaped {
            phrase.push(ch);
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == '"' {
            let next_cursor = start + 1 + offset + ch.len_utf8();
            let collapsed = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
            return Some((collapsed, next_cursor));
        }
        phrase.push(ch);
    }

    None
}
