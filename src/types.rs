/// Shared request types used across handlers and services
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer};

use crate::config;

/// `?page=&per_page=` query parameters. Pages are 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Pagination {
    /// SQL `LIMIT` and `OFFSET`, clamped to the configured page sizes
    pub fn limit_offset(&self) -> (i64, i64) {
        let api = &config::config().api;
        self.limit_offset_with(api.default_page_size, api.max_page_size)
    }

    pub fn limit_offset_with(&self, default_size: u32, max_size: u32) -> (i64, i64) {
        let per_page = self.per_page.unwrap_or(default_size).clamp(1, max_size.max(1));
        let page = self.page.unwrap_or(1).max(1);
        (per_page as i64, (page as i64 - 1) * per_page as i64)
    }
}

/// Inclusive date range; missing bounds default to the last 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub const DEFAULT_DAYS: i64 = 30;

    pub fn resolve(from: Option<NaiveDate>, to: Option<NaiveDate>, today: NaiveDate) -> Self {
        let to = to.unwrap_or(today);
        let from = from.unwrap_or(to - Duration::days(Self::DEFAULT_DAYS - 1));
        if from > to {
            Self { from: to, to: from }
        } else {
            Self { from, to }
        }
    }
}

/// Distinguishes an absent JSON field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH bodies. Use with `#[serde(default, deserialize_with = "nullable")]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
