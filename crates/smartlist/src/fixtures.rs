//! Item builders shared by unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::types::Item;

pub(crate) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    at_time(year, month, day, 0, 0, 0)
}

pub(crate) fn at_time(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .expect("valid test timestamp")
}

/// An item in the "Daily Tech" collection added on 2025-01-01.
pub(crate) fn item(id: &str, title: &str) -> Item {
    Item::new(id, title, "Daily Tech", at(2025, 1, 1))
}

pub(crate) fn item_in(id: &str, title: &str, collection: &str) -> Item {
    Item::new(id, title, collection, at(2025, 1, 1))
}

pub(crate) fn ids(items: &[&Item]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}
