//! Typed filter sets evaluated against an item collection.
//!
//! A [`FilterSet`] is a flat list of conditions combined with one
//! [`CombinationLogic`]. Archived items are dropped before the set's own
//! logic runs unless the set carries an `isArchived` condition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::fold_case;
use crate::sort::{sort_items, SortOrder};
use crate::temporal::trailing_window;
use crate::types::{CombinationLogic, DownloadStatus, Item, PlayStatus};

/// A named filter criterion with its operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FilterCriterion {
    PlayStatus(PlayStatus),
    DownloadStatus(DownloadStatus),
    IsFavorited(bool),
    IsBookmarked(bool),
    IsArchived(bool),
    RatingAtLeast(u8),
    PublishedWithinDays(u32),
    AddedWithinDays(u32),
    DurationAtLeast(u64),
    DurationAtMost(u64),
    CollectionName(String),
    TitleContains(String),
}

impl FilterCriterion {
    /// Tests the criterion, returning `None` when the item lacks the
    /// optional field the criterion reads.
    fn test(&self, item: &Item, now: DateTime<Utc>) -> Option<bool> {
        match self {
            Self::PlayStatus(status) => Some(item.play_status == *status),
            Self::DownloadStatus(status) => Some(item.download_status == *status),
            Self::IsFavorited(expected) => Some(item.is_favorited == *expected),
            Self::IsBookmarked(expected) => Some(item.is_bookmarked == *expected),
            Self::IsArchived(expected) => Some(item.is_archived == *expected),
            Self::RatingAtLeast(minimum) => item.rating.map(|rating| rating >= *minimum),
            Self::PublishedWithinDays(days) => item
                .publish_date
                .map(|published| trailing_window(now, *days).contains(published)),
            Self::AddedWithinDays(days) => {
                Some(trailing_window(now, *days).contains(item.date_added))
            }
            Self::DurationAtLeast(secs) => item.duration_secs.map(|duration| duration >= *secs),
            Self::DurationAtMost(secs) => item.duration_secs.map(|duration| duration <= *secs),
            Self::CollectionName(name) => {
                Some(fold_case(&item.collection_name) == fold_case(name))
            }
            Self::TitleContains(needle) => {
                Some(fold_case(&item.title).contains(fold_case(needle).as_str()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    pub criterion: FilterCriterion,
    #[serde(default)]
    pub negated: bool,
}

impl FilterCondition {
    pub fn new(criterion: FilterCriterion) -> Self {
        Self {
            criterion,
            negated: false,
        }
    }

    pub fn negated(criterion: FilterCriterion) -> Self {
        Self {
            criterion,
            negated: true,
        }
    }

    /// An absent optional field makes the condition false even when negated.
    pub fn matches(&self, item: &Item, now: DateTime<Utc>) -> bool {
        self.criterion
            .test(item, now)
            .is_some_and(|result| result != self.negated)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
    pub logic: CombinationLogic,
}

impl FilterSet {
    pub fn new(conditions: Vec<FilterCondition>, logic: CombinationLogic) -> Self {
        Self { conditions, logic }
    }

    /// Whether the set opts out of the default archived exclusion.
    pub fn mentions_archived(&self) -> bool {
        self.conditions
            .iter()
            .any(|condition| matches!(condition.criterion, FilterCriterion::IsArchived(_)))
    }

    pub fn matches(&self, item: &Item, now: DateTime<Utc>) -> bool {
        if item.is_archived && !self.mentions_archived() {
            return false;
        }
        self.logic
            .matches(&self.conditions, |condition| condition.matches(item, now))
    }
}

/// Filters and sorts `items`. Never returns more items than it was given.
pub fn evaluate_filter_set<'a>(
    items: impl IntoIterator<Item = &'a Item>,
    filter_set: &FilterSet,
    order: SortOrder,
    now: DateTime<Utc>,
) -> Vec<&'a Item> {
    let mut scanned = 0usize;
    let mut matched = items
        .into_iter()
        .inspect(|_| scanned += 1)
        .filter(|item| filter_set.matches(item, now))
        .collect::<Vec<_>>();
    sort_items(&mut matched, order);

    log::debug!(
        "filter set ({} conditions, {}) matched {} of {scanned} items",
        filter_set.conditions.len(),
        filter_set.logic,
        matched.len()
    );
    matched
}
