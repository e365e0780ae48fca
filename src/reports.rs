use crate::derive::derive_all;
use crate::types::{
    DateRange, DatasetOverview, GroupedRow, GroupedView, Trip, TripRecord, UsageReport,
    UserTypeCount, UserTypeDuration, UserTypeHighlight, MONTH_NAMES, WEEKDAY_NAMES,
};
use crate::util::average;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

/// Build every view the report shows. Pure: same records, same report.
pub fn generate_report(records: &[TripRecord]) -> UsageReport {
    if records.is_empty() {
        warn!("dataset is empty; every view will be empty");
    }
    let trips = derive_all(records);
    let overview = generate_overview(records);
    let user_type_counts = user_type_counts(&trips);
    let avg_duration = avg_duration_by_user_type(&trips);
    let monthly = monthly_volume(&trips);
    let weekly = weekly_volume(&trips);
    let hourly = hourly_volume(&trips);
    let highlights = generate_highlights(&avg_duration, &monthly, &weekly, &hourly);
    debug!(
        trips = trips.len(),
        user_types = overview.user_types.len(),
        hours = hourly.rows.len(),
        "aggregates computed"
    );
    UsageReport {
        overview,
        user_type_counts,
        avg_duration,
        monthly,
        weekly,
        hourly,
        highlights,
    }
}

pub fn generate_overview(records: &[TripRecord]) -> DatasetOverview {
    let date_range = records
        .iter()
        .map(|r| r.started_at)
        .fold(None, |acc: Option<DateRange>, ts| match acc {
            None => Some(DateRange { start: ts, end: ts }),
            Some(range) => Some(DateRange {
                start: if ts < range.start { ts } else { range.start },
                end: if ts > range.end { ts } else { range.end },
            }),
        });

    let mut seen: HashSet<&str> = HashSet::new();
    let mut user_types = Vec::new();
    for r in records {
        if let Some(u) = r.member_casual.as_deref() {
            if seen.insert(u) {
                user_types.push(u.to_string());
            }
        }
    }

    DatasetOverview {
        total_trips: records.len(),
        date_range,
        user_types,
    }
}

/// Trips per user type, most frequent first (ties by name).
pub fn user_type_counts(trips: &[Trip<'_>]) -> Vec<UserTypeCount> {
    let mut map: BTreeMap<&str, u64> = BTreeMap::new();
    for t in trips {
        if let Some(u) = t.user_type() {
            *map.entry(u).or_default() += 1;
        }
    }
    let mut rows: Vec<UserTypeCount> = map
        .into_iter()
        .map(|(user_type, trips)| UserTypeCount {
            user_type: user_type.to_string(),
            trips,
        })
        .collect();
    rows.sort_by(|a, b| b.trips.cmp(&a.trips).then_with(|| a.user_type.cmp(&b.user_type)));
    rows
}

/// Mean ride length per user type, ordered by name.
pub fn avg_duration_by_user_type(trips: &[Trip<'_>]) -> Vec<UserTypeDuration> {
    let mut map: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for t in trips {
        if let Some(u) = t.user_type() {
            map.entry(u).or_default().push(t.derived.ride_length);
        }
    }
    map.into_iter()
        .map(|(user_type, lengths)| UserTypeDuration {
            user_type: user_type.to_string(),
            avg_minutes: average(&lengths),
        })
        .collect()
}

pub fn monthly_volume(trips: &[Trip<'_>]) -> GroupedView<String> {
    grouped_counts(trips, Some(&MONTH_NAMES[..]), |t| t.derived.month.to_string())
}

pub fn weekly_volume(trips: &[Trip<'_>]) -> GroupedView<String> {
    grouped_counts(trips, Some(&WEEKDAY_NAMES[..]), |t| {
        t.derived.day_of_week.to_string()
    })
}

/// Only hours that occur in the data appear, ascending.
pub fn hourly_volume(trips: &[Trip<'_>]) -> GroupedView<u32> {
    grouped_counts(trips, None::<&[u32]>, |t| t.derived.hour)
}

/// Count trips by `(key, user type)` and unstack user types into columns.
///
/// With `order` set, rows follow it exactly and keys with no trips get a zero
/// row, even when no trip has a user type (rows then carry no values);
/// without it, rows are the observed keys in natural order.
fn grouped_counts<K, O, F>(trips: &[Trip<'_>], order: Option<&[O]>, key_of: F) -> GroupedView<K>
where
    K: Ord + Clone,
    O: Clone + Into<K>,
    F: Fn(&Trip<'_>) -> K,
{
    let mut counts: BTreeMap<(K, &str), u64> = BTreeMap::new();
    let mut user_types: BTreeSet<&str> = BTreeSet::new();
    let mut keys: BTreeSet<K> = BTreeSet::new();
    for t in trips {
        let Some(u) = t.user_type() else { continue };
        let key = key_of(t);
        user_types.insert(u);
        keys.insert(key.clone());
        *counts.entry((key, u)).or_default() += 1;
    }
    if trips.is_empty() {
        return GroupedView::empty();
    }

    let row_keys: Vec<K> = match order {
        Some(order) => order.iter().cloned().map(Into::into).collect(),
        None => keys.into_iter().collect(),
    };
    let rows = row_keys
        .into_iter()
        .map(|key| {
            let values = user_types
                .iter()
                .map(|u| counts.get(&(key.clone(), *u)).copied().unwrap_or(0))
                .collect();
            GroupedRow { key, values }
        })
        .collect();

    GroupedView {
        user_types: user_types.into_iter().map(str::to_string).collect(),
        rows,
    }
}

/// Per user type: mean duration plus the busiest month, weekday and hour.
/// Ties go to the earliest key in the view's order.
pub fn generate_highlights(
    avg_duration: &[UserTypeDuration],
    monthly: &GroupedView<String>,
    weekly: &GroupedView<String>,
    hourly: &GroupedView<u32>,
) -> Vec<UserTypeHighlight> {
    avg_duration
        .iter()
        .map(|d| UserTypeHighlight {
            user_type: d.user_type.clone(),
            avg_minutes: d.avg_minutes,
            busiest_month: peak_key(monthly, &d.user_type).cloned(),
            busiest_weekday: peak_key(weekly, &d.user_type).cloned(),
            peak_hour: peak_key(hourly, &d.user_type).copied(),
        })
        .collect()
}

fn peak_key<'a, K>(view: &'a GroupedView<K>, user_type: &str) -> Option<&'a K> {
    let series = view.series(user_type)?;
    let mut best: Option<(&K, u64)> = None;
    for (key, count) in series {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, c)) if c >= count => {}
            _ => best = Some((key, count)),
        }
    }
    best.map(|(k, _)| k)
}
