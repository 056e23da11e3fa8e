//! Query expression types and AST nodes.

use serde::{Deserialize, Serialize};

/// An item field addressable from the query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    Title,
    CollectionName,
    Description,
    Duration,
    PublishDate,
}

impl SearchField {
    /// Unscoped terms try fields in this order; the first hit contributes.
    pub const DEFAULT_ORDER: [SearchField; 5] = [
        SearchField::Title,
        SearchField::CollectionName,
        SearchField::Description,
        SearchField::Duration,
        SearchField::PublishDate,
    ];

    /// Resolves a `field:` prefix. Unknown names return `None`.
    pub fn lookup(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "title" | "name" => Some(Self::Title),
            "collection" | "collectionname" | "show" | "podcast" | "feed" => {
                Some(Self::CollectionName)
            }
            "description" | "desc" | "notes" => Some(Self::Description),
            "duration" | "length" => Some(Self::Duration),
            "date" | "published" | "publishdate" => Some(Self::PublishDate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CollectionName => "collectionName",
            Self::Description => "description",
            Self::Duration => "duration",
            Self::PublishDate => "publishDate",
        }
    }
}

/// A parsed query expression (AST node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpression {
    Term(QueryTerm),
    Not(Box<QueryExpression>),
    And(Vec<QueryExpression>),
    Or(Vec<QueryExpression>),
}

/// A single query term (leaf node in the AST).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub field: Option<SearchField>,
    pub text: String,
    pub is_phrase: bool,
    pub negated: bool,
}

impl QueryTerm {
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            field: None,
            text: text.into(),
            is_phrase: false,
            negated: false,
        }
    }

    pub fn phrase(text: impl Into<String>) -> Self {
        Self {
            is_phrase: true,
            ..Self::word(text)
        }
    }

    pub fn in_field(mut self, field: SearchField) -> Self {
        self.field = Some(field);
        self
    }

    pub fn negate(mut self) -> Self {
        self.negated = true;
        self
    }

    /// A term with no text matches vacuously.
    pub fn is_degenerate(&self) -> bool {
        self.text.is_empty()
    }
}

impl QueryExpression {
    /// The always-true query produced by empty input.
    pub fn identity() -> Self {
        Self::And(Vec::new())
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::And(parts) if parts.is_empty())
    }
}

/// Checks if an expression contains at least one concrete term.
pub fn query_expression_has_terms(expression: &QueryExpression) -> bool {
    match expression {
        QueryExpression::Term(term) => !term.is_degenerate(),
        QueryExpression::Not(inner) => query_expression_has_terms(inner),
        QueryExpression::And(parts) | QueryExpression::Or(parts) => {
            parts.iter().any(query_expression_has_terms)
        }
    }
}
