//! Compilation of rules into typed predicates.
//!
//! Every `(rule type, comparator, value)` combination is resolved here,
//! once, into a typed predicate. Combinations outside the table are reported
//! as [`InvalidRule`] and skipped by the engine.

use chrono::{DateTime, Utc};

use crate::config::CalendarConfig;
use crate::query::fold_case;
use crate::temporal::{calendar_day_range, day_range, parse_calendar_date, DateRange};
use crate::types::{DownloadStatus, Item, PlayStatus};

use super::model::{Comparator, Rule, RuleType, RuleValue};

/// Why a rule cannot be evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidRule {
    #[error("comparator {comparator} does not apply to {rule_type}")]
    IncompatibleComparator {
        rule_type: RuleType,
        comparator: Comparator,
    },

    #[error("{rule_type} {comparator} cannot take a {found} value")]
    IncompatibleValue {
        rule_type: RuleType,
        comparator: Comparator,
        found: &'static str,
    },

    #[error("{0} requires bounds")]
    MissingBounds(Comparator),

    #[error("range lower bound is after upper bound")]
    ReversedRange,

    #[error("unknown {rule_type} value {value:?}")]
    UnknownStatus { rule_type: RuleType, value: String },

    #[error("text operand is empty")]
    EmptyText,

    #[error("cannot read {0:?} as a calendar date")]
    InvalidDate(String),

    #[error("cannot read {0:?} as a number")]
    InvalidNumber(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateField {
    DateAdded,
    PublishDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberField {
    Duration,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    CollectionName,
    Title,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagField {
    Favorited,
    Bookmarked,
    Archived,
}

/// Ordered comparison against fixed bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RangeTest<T> {
    Eq(T),
    Ne(T),
    Gt(T),
    Gte(T),
    Lt(T),
    Lte(T),
    /// Inclusive on both ends.
    Between(T, T),
    /// Half-open `[start, end)`.
    Within(T, T),
    Outside(T, T),
}

impl<T: PartialOrd> RangeTest<T> {
    fn test(&self, value: &T) -> bool {
        match self {
            Self::Eq(bound) => value == bound,
            Self::Ne(bound) => value != bound,
            Self::Gt(bound) => value > bound,
            Self::Gte(bound) => value >= bound,
            Self::Lt(bound) => value < bound,
            Self::Lte(bound) => value <= bound,
            Self::Between(lo, hi) => lo <= value && value <= hi,
            Self::Within(start, end) => start <= value && value < end,
            Self::Outside(start, end) => !(start <= value && value < end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TextTest {
    Equals(String),
    NotEquals(String),
    Contains(String),
    NotContains(String),
}

impl TextTest {
    fn test(&self, value: &str) -> bool {
        let folded = fold_case(value);
        match self {
            Self::Equals(needle) => folded == *needle,
            Self::NotEquals(needle) => folded != *needle,
            Self::Contains(needle) => folded.contains(needle.as_str()),
            Self::NotContains(needle) => !folded.contains(needle.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Play { expected: PlayStatus, equal: bool },
    Download { expected: DownloadStatus, equal: bool },
    Date { field: DateField, test: RangeTest<DateTime<Utc>> },
    Number { field: NumberField, test: RangeTest<f64> },
    Text { field: TextField, test: TextTest },
    Flag { field: FlagField, expected: bool },
}

impl Predicate {
    /// Returns `None` when the item lacks the optional field being read.
    fn test(&self, item: &Item) -> Option<bool> {
        match self {
            Self::Play { expected, equal } => Some((item.play_status == *expected) == *equal),
            Self::Download { expected, equal } => {
                Some((item.download_status == *expected) == *equal)
            }
            Self::Date { field, test } => {
                let value = match field {
                    DateField::DateAdded => Some(item.date_added),
                    DateField::PublishDate => item.publish_date,
                }?;
                Some(test.test(&value))
            }
            Self::Number { field, test } => {
                let value = match field {
                    NumberField::Duration => item.duration_secs.map(|secs| secs as f64),
                    NumberField::Rating => item.rating.map(f64::from),
                }?;
                Some(test.test(&value))
            }
            Self::Text { field, test } => {
                let value = match field {
                    TextField::CollectionName => &item.collection_name,
                    TextField::Title => &item.title,
                    TextField::Description => &item.description,
                };
                Some(test.test(value))
            }
            Self::Flag { field, expected } => {
                let value = match field {
                    FlagField::Favorited => item.is_favorited,
                    FlagField::Bookmarked => item.is_bookmarked,
                    FlagField::Archived => item.is_archived,
                };
                Some(value == *expected)
            }
        }
    }
}

/// A validated rule ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    rule_type: RuleType,
    predicate: Predicate,
    negated: bool,
    exclude_favorites: bool,
    exclude_bookmarked: bool,
}

impl CompiledRule {
    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    /// Missing optional fields fail the rule regardless of negation. The
    /// exclusion flags then remove favorited or bookmarked positives.
    pub fn matches(&self, item: &Item) -> bool {
        let Some(result) = self.predicate.test(item) else {
            return false;
        };
        if result == self.negated {
            return false;
        }
        let excluded = (self.exclude_favorites && item.is_favorited)
            || (self.exclude_bookmarked && item.is_bookmarked);
        !excluded
    }
}

/// Compiles one rule. Periods and calendar dates are resolved against
/// `now` and `calendar` here, once.
pub fn compile_rule(
    rule: &Rule,
    now: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> Result<CompiledRule, InvalidRule> {
    let predicate = match rule.rule_type {
        RuleType::PlayStatus => {
            let (status, equal) = compile_status(rule)?;
            let expected = status
                .parse::<PlayStatus>()
                .map_err(|()| unknown_status(rule, status))?;
            Predicate::Play { expected, equal }
        }
        RuleType::DownloadStatus => {
            let (status, equal) = compile_status(rule)?;
            let expected = status
                .parse::<DownloadStatus>()
                .map_err(|()| unknown_status(rule, status))?;
            Predicate::Download { expected, equal }
        }
        RuleType::DateAdded => Predicate::Date {
            field: DateField::DateAdded,
            test: compile_date_test(rule, now, calendar)?,
        },
        RuleType::PublishDate => Predicate::Date {
            field: DateField::PublishDate,
            test: compile_date_test(rule, now, calendar)?,
        },
        RuleType::Duration => Predicate::Number {
            field: NumberField::Duration,
            test: compile_number_test(rule)?,
        },
        RuleType::Rating => Predicate::Number {
            field: NumberField::Rating,
            test: compile_number_test(rule)?,
        },
        RuleType::CollectionName => Predicate::Text {
            field: TextField::CollectionName,
            test: compile_text_test(rule)?,
        },
        RuleType::Title => Predicate::Text {
            field: TextField::Title,
            test: compile_text_test(rule)?,
        },
        RuleType::Description => Predicate::Text {
            field: TextField::Description,
            test: compile_text_test(rule)?,
        },
        RuleType::IsFavorited => Predicate::Flag {
            field: FlagField::Favorited,
            expected: compile_flag(rule)?,
        },
        RuleType::IsBookmarked => Predicate::Flag {
            field: FlagField::Bookmarked,
            expected: compile_flag(rule)?,
        },
        RuleType::IsArchived => Predicate::Flag {
            field: FlagField::Archived,
            expected: compile_flag(rule)?,
        },
    };

    Ok(CompiledRule {
        rule_type: rule.rule_type,
        predicate,
        negated: rule.negated,
        exclude_favorites: rule.exclude_favorites,
        exclude_bookmarked: rule.exclude_bookmarked,
    })
}

fn incompatible_comparator(rule: &Rule) -> InvalidRule {
    InvalidRule::IncompatibleComparator {
        rule_type: rule.rule_type,
        comparator: rule.comparator,
    }
}

fn incompatible_value(rule: &Rule) -> InvalidRule {
    InvalidRule::IncompatibleValue {
        rule_type: rule.rule_type,
        comparator: rule.comparator,
        found: rule.value.kind(),
    }
}

fn unknown_status(rule: &Rule, value: &str) -> InvalidRule {
    InvalidRule::UnknownStatus {
        rule_type: rule.rule_type,
        value: value.to_string(),
    }
}

fn compile_status(rule: &Rule) -> Result<(&str, bool), InvalidRule> {
    let equal = match rule.comparator {
        Comparator::Equals => true,
        Comparator::NotEquals => false,
        _ => return Err(incompatible_comparator(rule)),
    };
    match &rule.value {
        RuleValue::Text(status) => Ok((status.as_str(), equal)),
        _ => Err(incompatible_value(rule)),
    }
}

fn compile_flag(rule: &Rule) -> Result<bool, InvalidRule> {
    match (rule.comparator, &rule.value) {
        (Comparator::IsTrue, _) => Ok(true),
        (Comparator::IsFalse, _) => Ok(false),
        (Comparator::Equals, RuleValue::Bool(expected)) => Ok(*expected),
        (Comparator::NotEquals, RuleValue::Bool(expected)) => Ok(!*expected),
        (Comparator::Equals | Comparator::NotEquals, _) => Err(incompatible_value(rule)),
        _ => Err(incompatible_comparator(rule)),
    }
}

fn compile_text_test(rule: &Rule) -> Result<TextTest, InvalidRule> {
    let make: fn(String) -> TextTest = match rule.comparator {
        Comparator::Equals => TextTest::Equals,
        Comparator::NotEquals => TextTest::NotEquals,
        Comparator::Contains => TextTest::Contains,
        Comparator::NotContains => TextTest::NotContains,
        _ => return Err(incompatible_comparator(rule)),
    };
    let RuleValue::Text(text) = &rule.value else {
        return Err(incompatible_value(rule));
    };
    if text.trim().is_empty() {
        return Err(InvalidRule::EmptyText);
    }
    Ok(make(fold_case(text)))
}

fn compile_number_test(rule: &Rule) -> Result<RangeTest<f64>, InvalidRule> {
    if rule.comparator == Comparator::IsBetween {
        return match rule.value {
            RuleValue::NumberRange { lo, hi } if lo.is_finite() && hi.is_finite() => {
                if lo > hi {
                    Err(InvalidRule::ReversedRange)
                } else {
                    Ok(RangeTest::Between(lo, hi))
                }
            }
            RuleValue::None => Err(InvalidRule::MissingBounds(rule.comparator)),
            _ => Err(incompatible_value(rule)),
        };
    }

    let make: fn(f64) -> RangeTest<f64> = match rule.comparator {
        Comparator::Equals => RangeTest::Eq,
        Comparator::NotEquals => RangeTest::Ne,
        Comparator::GreaterThan => RangeTest::Gt,
        Comparator::GreaterThanOrEqual => RangeTest::Gte,
        Comparator::LessThan => RangeTest::Lt,
        Comparator::LessThanOrEqual => RangeTest::Lte,
        _ => return Err(incompatible_comparator(rule)),
    };
    let bound = match &rule.value {
        RuleValue::Number(number) => *number,
        RuleValue::Text(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| InvalidRule::InvalidNumber(raw.clone()))?,
        _ => return Err(incompatible_value(rule)),
    };
    if !bound.is_finite() {
        return Err(InvalidRule::InvalidNumber(bound.to_string()));
    }
    Ok(make(bound))
}

/// A date operand: an exact instant, or a whole local calendar day.
enum DateOperand {
    Instant(DateTime<Utc>),
    Day(DateRange),
}

fn compile_date_test(
    rule: &Rule,
    now: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> Result<RangeTest<DateTime<Utc>>, InvalidRule> {
    match rule.comparator {
        Comparator::IsWithin => {
            return match rule.value {
                RuleValue::Period(period) => {
                    let range = period.resolve(now, calendar);
                    Ok(RangeTest::Within(range.start(), range.end()))
                }
                RuleValue::None => Err(InvalidRule::MissingBounds(rule.comparator)),
                _ => Err(incompatible_value(rule)),
            };
        }
        Comparator::IsBetween => {
            return match rule.value {
                RuleValue::DateRange { start, end } if start > end => {
                    Err(InvalidRule::ReversedRange)
                }
                RuleValue::DateRange { start, end } => Ok(RangeTest::Between(start, end)),
                RuleValue::None => Err(InvalidRule::MissingBounds(rule.comparator)),
                _ => Err(incompatible_value(rule)),
            };
        }
        Comparator::Equals
        | Comparator::NotEquals
        | Comparator::GreaterThan
        | Comparator::GreaterThanOrEqual
        | Comparator::LessThan
        | Comparator::LessThanOrEqual => {}
        _ => return Err(incompatible_comparator(rule)),
    }

    let operand = match &rule.value {
        RuleValue::Date(instant) => DateOperand::Instant(*instant),
        RuleValue::Text(raw) => {
            let date =
                parse_calendar_date(raw).ok_or_else(|| InvalidRule::InvalidDate(raw.clone()))?;
            DateOperand::Day(calendar_day_range(date, calendar))
        }
        _ => return Err(incompatible_value(rule)),
    };

    let test = match (rule.comparator, operand) {
        // Equality always means the same local calendar day.
        (Comparator::Equals, DateOperand::Instant(instant)) => {
            let day = day_range(instant, calendar);
            RangeTest::Within(day.start(), day.end())
        }
        (Comparator::NotEquals, DateOperand::Instant(instant)) => {
            let day = day_range(instant, calendar);
            RangeTest::Outside(day.start(), day.end())
        }
        (Comparator::Equals, DateOperand::Day(day)) => RangeTest::Within(day.start(), day.end()),
        (Comparator::NotEquals, DateOperand::Day(day)) => {
            RangeTest::Outside(day.start(), day.end())
        }
        (Comparator::GreaterThan, DateOperand::Instant(instant)) => RangeTest::Gt(instant),
        (Comparator::GreaterThanOrEqual, DateOperand::Instant(instant)) => RangeTest::Gte(instant),
        (Comparator::LessThan, DateOperand::Instant(instant)) => RangeTest::Lt(instant),
        (Comparator::LessThanOrEqual, DateOperand::Instant(instant)) => RangeTest::Lte(instant),
        (Comparator::GreaterThan, DateOperand::Day(day)) => RangeTest::Gte(day.end()),
        (Comparator::GreaterThanOrEqual, DateOperand::Day(day)) => RangeTest::Gte(day.start()),
        (Comparator::LessThan, DateOperand::Day(day)) => RangeTest::Lt(day.start()),
        (Comparator::LessThanOrEqual, DateOperand::Day(day)) => RangeTest::Lt(day.end()),
        _ => return Err(incompatible_comparator(rule)),
    };
    Ok(test)
}
