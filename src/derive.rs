use crate::types::{DerivedFields, Trip, TripRecord, MONTH_NAMES, WEEKDAY_NAMES};
use crate::util::minutes_between;
use chrono::{Datelike, Timelike};

/// Per-trip fields, read off `started_at` in its own offset.
pub fn derive_fields(record: &TripRecord) -> DerivedFields {
    let start = &record.started_at;
    DerivedFields {
        ride_length: minutes_between(start, &record.ended_at),
        month: MONTH_NAMES[start.month0() as usize],
        day_of_week: WEEKDAY_NAMES[start.weekday().num_days_from_monday() as usize],
        hour: start.hour(),
    }
}

pub fn derive_all(records: &[TripRecord]) -> Vec<Trip<'_>> {
    records
        .iter()
        .map(|r| Trip {
            record: r,
            derived: derive_fields(r),
        })
        .collect()
}
