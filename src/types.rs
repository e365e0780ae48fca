use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Timestamps keep whatever offset the input carried. Naive input is held as
/// wall-clock time at a zero offset.
pub type Timestamp = DateTime<FixedOffset>;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One CSV row as it comes off the wire. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub ride_id: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub member_casual: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub ride_id: Option<String>,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    /// `None` when the cell was blank; such trips are counted in the total
    /// but belong to no user-type group.
    pub member_casual: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedFields {
    /// Elapsed minutes, negative when `ended_at < started_at`.
    pub ride_length: f64,
    pub month: &'static str,
    pub day_of_week: &'static str,
    pub hour: u32,
}

/// A borrowed record paired with its derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip<'a> {
    pub record: &'a TripRecord,
    pub derived: DerivedFields,
}

impl Trip<'_> {
    pub fn user_type(&self) -> Option<&str> {
        self.record.member_casual.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub total_trips: usize,
    pub date_range: Option<DateRange>,
    /// Distinct user types in order of first appearance.
    pub user_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTypeCount {
    pub user_type: String,
    pub trips: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTypeDuration {
    pub user_type: String,
    pub avg_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRow<K> {
    pub key: K,
    /// Trip counts aligned with [`GroupedView::user_types`].
    pub values: Vec<u64>,
}

/// Counts keyed by one time dimension, one series per user type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedView<K> {
    pub user_types: Vec<String>,
    pub rows: Vec<GroupedRow<K>>,
}

impl<K> GroupedView<K> {
    pub fn empty() -> Self {
        GroupedView {
            user_types: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The `(key, count)` series for one user type, in row order.
    pub fn series(&self, user_type: &str) -> Option<Vec<(&K, u64)>> {
        let col = self.user_types.iter().position(|u| u == user_type)?;
        Some(self.rows.iter().map(|r| (&r.key, r.values[col])).collect())
    }

    pub fn max_value(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|r| r.values.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTypeHighlight {
    pub user_type: String,
    pub avg_minutes: f64,
    pub busiest_month: Option<String>,
    pub busiest_weekday: Option<String>,
    pub peak_hour: Option<u32>,
}

/// Everything the renderers need, computed in one pass over the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub overview: DatasetOverview,
    pub user_type_counts: Vec<UserTypeCount>,
    pub avg_duration: Vec<UserTypeDuration>,
    pub monthly: GroupedView<String>,
    pub weekly: GroupedView<String>,
    pub hourly: GroupedView<u32>,
    pub highlights: Vec<UserTypeHighlight>,
}
