// Period tags and the date windows they select.

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;

/// Named reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Weekly,
    Monthly,
    General,
}

impl Period {
    pub const DEFAULT_TAG: &'static str = "general";

    /// Parse a period tag. Absent and unrecognized tags resolve to
    /// `General`, which applies no date filter.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_lowercase()).as_deref() {
            Some("weekly") => Period::Weekly,
            Some("monthly") => Period::Monthly,
            _ => Period::General,
        }
    }

    /// Whether `tag` names one of the known periods.
    pub fn is_known_tag(tag: &str) -> bool {
        matches!(
            tag.trim().to_lowercase().as_str(),
            "weekly" | "monthly" | "general"
        )
    }

    /// Inclusive date range ending `today`, or `None` for no bound.
    pub fn resolve(self, today: NaiveDate) -> Option<DateRange> {
        let start = match self {
            Period::Weekly => today.checked_sub_days(Days::new(7))?,
            Period::Monthly => today.checked_sub_months(Months::new(1))?,
            Period::General => return None,
        };
        Some(DateRange { start, end: today })
    }
}

/// Inclusive `[start, end]` date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
