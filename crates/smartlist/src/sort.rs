//! Deterministic ordering of filtered item lists.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::query::fold_case;
use crate::types::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    PublishDate,
    DateAdded,
    Title,
    CollectionName,
    Duration,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOrder {
    pub key: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn ascending(key: SortKey) -> Self {
        Self::new(key, SortDirection::Ascending)
    }

    pub fn descending(key: SortKey) -> Self {
        Self::new(key, SortDirection::Descending)
    }

    /// Total order over items: the key in the requested direction with
    /// absent values last, then `id` ascending.
    pub fn compare(&self, left: &Item, right: &Item) -> Ordering {
        self.compare_key(left, right)
            .then_with(|| left.id.cmp(&right.id))
    }

    fn compare_key(&self, left: &Item, right: &Item) -> Ordering {
        match self.key {
            SortKey::PublishDate => self.optional(left.publish_date, right.publish_date),
            SortKey::DateAdded => self.directed(left.date_added.cmp(&right.date_added)),
            SortKey::Title => self.directed(compare_text(&left.title, &right.title)),
            SortKey::CollectionName => {
                self.directed(compare_text(&left.collection_name, &right.collection_name))
            }
            SortKey::Duration => self.optional(left.duration_secs, right.duration_secs),
            SortKey::Rating => self.optional(left.rating, right.rating),
        }
    }

    fn directed(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    fn optional<T: Ord>(&self, left: Option<T>, right: Option<T>) -> Ordering {
        match (left, right) {
            (Some(left), Some(right)) => self.directed(left.cmp(&right)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::descending(SortKey::PublishDate)
    }
}

/// Case-insensitive comparison with a case-sensitive fallback so distinct
/// strings never compare equal.
pub(crate) fn compare_text(left: &str, right: &str) -> Ordering {
    fold_case(left)
        .cmp(&fold_case(right))
        .then_with(|| left.cmp(right))
}

/// Sorts items in place.
pub fn sort_items(items: &mut [&Item], order: SortOrder) {
    items.sort_by(|left, right| order.compare(left, right));
}
