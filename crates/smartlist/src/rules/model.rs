//! Declarative rule records as persisted by callers.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::sort::SortOrder;
use crate::temporal::RelativePeriod;
use crate::types::CombinationLogic;

use super::compile::{compile_rule, InvalidRule};

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;

/// The item attribute a rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleType {
    PlayStatus,
    DownloadStatus,
    DateAdded,
    PublishDate,
    Duration,
    Rating,
    CollectionName,
    Title,
    Description,
    IsFavorited,
    IsBookmarked,
    IsArchived,
}

impl RuleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlayStatus => "playStatus",
            Self::DownloadStatus => "downloadStatus",
            Self::DateAdded => "dateAdded",
            Self::PublishDate => "publishDate",
            Self::Duration => "duration",
            Self::Rating => "rating",
            Self::CollectionName => "collectionName",
            Self::Title => "title",
            Self::Description => "description",
            Self::IsFavorited => "isFavorited",
            Self::IsBookmarked => "isBookmarked",
            Self::IsArchived => "isArchived",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    IsWithin,
    IsBetween,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    IsTrue,
    IsFalse,
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::IsWithin => "isWithin",
            Self::IsBetween => "isBetween",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanOrEqual => "greaterThanOrEqual",
            Self::LessThan => "lessThan",
            Self::LessThanOrEqual => "lessThanOrEqual",
            Self::IsTrue => "isTrue",
            Self::IsFalse => "isFalse",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operand of a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum RuleValue {
    #[default]
    None,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    Period(RelativePeriod),
    NumberRange { lo: f64, hi: f64 },
    DateRange { start: DateTime<Utc>, end: DateTime<Utc> },
}

impl RuleValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Date(_) => "date",
            Self::Period(_) => "period",
            Self::NumberRange { .. } => "numberRange",
            Self::DateRange { .. } => "dateRange",
        }
    }
}

impl From<&str> for RuleValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for RuleValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for RuleValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<RelativePeriod> for RuleValue {
    fn from(value: RelativePeriod) -> Self {
        Self::Period(value)
    }
}

impl From<DateTime<Utc>> for RuleValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub comparator: Comparator,
    #[serde(default)]
    pub value: RuleValue,
    #[serde(default)]
    pub negated: bool,
    #[serde(default)]
    pub exclude_favorites: bool,
    #[serde(default)]
    pub exclude_bookmarked: bool,
}

impl Rule {
    pub fn new(rule_type: RuleType, comparator: Comparator, value: impl Into<RuleValue>) -> Self {
        Self {
            rule_type,
            comparator,
            value: value.into(),
            negated: false,
            exclude_favorites: false,
            exclude_bookmarked: false,
        }
    }

    /// A rule with no operand, e.g. `isFavorited isTrue`.
    pub fn flag(rule_type: RuleType, comparator: Comparator) -> Self {
        Self::new(rule_type, comparator, RuleValue::None)
    }

    pub fn negate(mut self) -> Self {
        self.negated = true;
        self
    }

    pub fn excluding_favorites(mut self) -> Self {
        self.exclude_favorites = true;
        self
    }

    pub fn excluding_bookmarked(mut self) -> Self {
        self.exclude_bookmarked = true;
        self
    }
}

/// A named smart list or auto-archive rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
    pub logic: CombinationLogic,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

impl RuleSet {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rules: Vec<Rule>,
        logic: CombinationLogic,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rules,
            logic,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            last_evaluated: None,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn refresh_interval(&self) -> TimeDelta {
        i64::try_from(self.refresh_interval_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Lists the rules the engine will skip, with their positions.
    ///
    /// Validity does not depend on the evaluation instant or calendar.
    pub fn invalid_rules(&self) -> Vec<(usize, InvalidRule)> {
        let calendar = CalendarConfig::utc(Weekday::Mon);
        let now = DateTime::<Utc>::UNIX_EPOCH;
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| {
                compile_rule(rule, now, &calendar)
                    .err()
                    .map(|error| (index, error))
            })
            .collect()
    }
}
