//! Engine configuration passed explicitly into evaluation calls.

use std::path::Path;

use chrono::{FixedOffset, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::search::SearchOptions;

pub const ENGINE_CONFIG_VERSION: &str = "1.0.0";

const MAX_OFFSET_MINUTES: u32 = 24 * 60;

/// Calendar conventions used to resolve week/month-relative periods.
///
/// Has no `Default`. Callers choose the week start and offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CalendarConfigRecord", into = "CalendarConfigRecord")]
pub struct CalendarConfig {
    week_start: Weekday,
    offset: FixedOffset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarConfigRecord {
    week_start: Weekday,
    utc_offset_minutes: i32,
}

impl CalendarConfig {
    pub fn new(week_start: Weekday, utc_offset_minutes: i32) -> Result<Self> {
        if utc_offset_minutes.unsigned_abs() >= MAX_OFFSET_MINUTES {
            return Err(EngineError::InvalidConfig(format!(
                "utc offset {utc_offset_minutes} minutes is out of range"
            )));
        }
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).ok_or_else(|| {
            EngineError::InvalidConfig(format!(
                "utc offset {utc_offset_minutes} minutes is out of range"
            ))
        })?;
        Ok(Self { week_start, offset })
    }

    /// Calendar anchored at UTC with the given first day of the week.
    pub fn utc(week_start: Weekday) -> Self {
        Self {
            week_start,
            offset: chrono::Offset::fix(&chrono::Utc),
        }
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn utc_offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }
}

impl TryFrom<CalendarConfigRecord> for CalendarConfig {
    type Error = EngineError;

    fn try_from(record: CalendarConfigRecord) -> Result<Self> {
        Self::new(record.week_start, record.utc_offset_minutes)
    }
}

impl From<CalendarConfig> for CalendarConfigRecord {
    fn from(config: CalendarConfig) -> Self {
        Self {
            week_start: config.week_start,
            utc_offset_minutes: config.utc_offset_minutes(),
        }
    }
}

/// Persistable engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub version: String,
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub search: SearchOptions,
}

impl EngineConfig {
    pub fn new(calendar: CalendarConfig) -> Self {
        Self {
            version: ENGINE_CONFIG_VERSION.to_string(),
            calendar,
            search: SearchOptions::default(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        if config.version != ENGINE_CONFIG_VERSION {
            return Err(EngineError::InvalidConfig(format!(
                "unsupported config version {:?} (expected {ENGINE_CONFIG_VERSION})",
                config.version
            )));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_vec_pretty(self)?;
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, serialized)?;
        std::fs::rename(&tmp_path, path)?;
        log::debug!("saved engine config to {}", path.display());
        Ok(())
    }
}
