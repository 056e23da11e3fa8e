//! Core record types shared by search, filtering, and rule evaluation.
//!
//! Items are owned by the caller (the item source); the engine only ever
//! borrows them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Playback progress of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayStatus {
    Unplayed,
    InProgress,
    Played,
}

impl PlayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unplayed => "unplayed",
            Self::InProgress => "inProgress",
            Self::Played => "played",
        }
    }
}

impl FromStr for PlayStatus {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize_token(raw).as_str() {
            "unplayed" | "new" => Ok(Self::Unplayed),
            "inprogress" | "started" | "partial" => Ok(Self::InProgress),
            "played" | "finished" => Ok(Self::Played),
            _ => Err(()),
        }
    }
}

/// Local availability of an item's media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DownloadStatus {
    NotDownloaded,
    Queued,
    Downloading,
    Downloaded,
    Failed,
}

impl DownloadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotDownloaded => "notDownloaded",
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Downloaded => "downloaded",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for DownloadStatus {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize_token(raw).as_str() {
            "notdownloaded" | "none" | "remote" => Ok(Self::NotDownloaded),
            "queued" | "pending" => Ok(Self::Queued),
            "downloading" => Ok(Self::Downloading),
            "downloaded" | "local" => Ok(Self::Downloaded),
            "failed" | "error" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

/// A content record in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub collection_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
    pub date_added: DateTime<Utc>,
    pub play_status: PlayStatus,
    pub download_status: DownloadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub is_favorited: bool,
    #[serde(default)]
    pub is_bookmarked: bool,
    #[serde(default)]
    pub is_archived: bool,
}

impl Item {
    /// Creates an unplayed, not-downloaded item with no optional metadata.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        collection_name: impl Into<String>,
        date_added: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            collection_name: collection_name.into(),
            duration_secs: None,
            publish_date: None,
            date_added,
            play_status: PlayStatus::Unplayed,
            download_status: DownloadStatus::NotDownloaded,
            rating: None,
            is_favorited: false,
            is_bookmarked: false,
            is_archived: false,
        }
    }

    /// Human-readable duration, e.g. `1h 5m`, `45m`, `30s`.
    pub fn formatted_duration(&self) -> Option<String> {
        self.duration_secs.map(format_duration)
    }

    /// Publish date rendered as `2025-01-10 January 10, 2025` (UTC).
    pub fn formatted_publish_date(&self) -> Option<String> {
        self.publish_date.map(|date| {
            format!(
                "{} {}",
                date.format("%Y-%m-%d"),
                date.format("%B %-d, %Y")
            )
        })
    }
}

fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    match (hours, minutes) {
        (0, 0) => format!("{total_secs}s"),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// How the conditions of a filter or rule set are combined.
///
/// Only `And` and `Or` exist in memory; any other persisted value is
/// rejected with [`EngineError::InvalidLogic`] at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CombinationLogic {
    #[default]
    And,
    Or,
}

impl CombinationLogic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Applies the logic to a list of predicates.
    ///
    /// An empty list matches everything regardless of the logic.
    pub fn matches<T>(self, predicates: &[T], mut test: impl FnMut(&T) -> bool) -> bool {
        if predicates.is_empty() {
            return true;
        }
        match self {
            Self::And => predicates.iter().all(|predicate| test(predicate)),
            Self::Or => predicates.iter().any(|predicate| test(predicate)),
        }
    }
}

impl fmt::Display for CombinationLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CombinationLogic {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "AND" | "and" | "all" => Ok(Self::And),
            "OR" | "or" | "any" => Ok(Self::Or),
            other => Err(EngineError::InvalidLogic(other.to_string())),
        }
    }
}

impl TryFrom<String> for CombinationLogic {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CombinationLogic> for String {
    fn from(logic: CombinationLogic) -> Self {
        logic.as_str().to_string()
    }
}

fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !matches!(ch, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}
