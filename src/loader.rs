use crate::error::ReportError;
use crate::types::{RawRow, TripRecord};
use crate::util::parse_timestamp;
use csv::ReaderBuilder;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const REQUIRED_COLUMNS: [&str; 3] = ["started_at", "ended_at", "member_casual"];

const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub bytes_read: usize,
    pub remote: bool,
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Read the raw CSV bytes from a URL (one GET, no retry) or a local path.
#[instrument(level = "debug")]
pub fn fetch_source(source: &str) -> Result<Vec<u8>, ReportError> {
    if is_remote(source) {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ReportError::unavailable(source, e))?;
        let resp = client
            .get(source)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ReportError::unavailable(source, e))?;
        let bytes = resp.bytes().map_err(|e| ReportError::unavailable(source, e))?;
        Ok(bytes.to_vec())
    } else {
        std::fs::read(source).map_err(|e| ReportError::unavailable(source, e))
    }
}

/// Fetch and parse every trip in `source`.
///
/// Any failure (unreachable source, missing column, bad row, unparsable
/// timestamp) rejects the whole dataset.
pub fn load_trips(source: &str) -> Result<(Vec<TripRecord>, LoadReport), ReportError> {
    info!(source, "loading trips");
    let bytes = fetch_source(source)?;
    let records = parse_trips(source, &bytes)?;
    let report = LoadReport {
        total_rows: records.len(),
        bytes_read: bytes.len(),
        remote: is_remote(source),
    };
    info!(
        rows = report.total_rows,
        bytes = report.bytes_read,
        remote = report.remote,
        "trips loaded"
    );
    Ok((records, report))
}

pub fn parse_trips(source: &str, bytes: &[u8]) -> Result<Vec<TripRecord>, ReportError> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);

    let headers = rdr
        .headers()
        .map_err(|e| ReportError::unavailable(source, e))?
        .clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .collect();
    if !missing.is_empty() {
        return Err(ReportError::unavailable(
            source,
            format!("missing required column(s): {}", missing.join(", ")),
        ));
    }
    debug!(columns = headers.len(), "header validated");

    let mut records = Vec::new();
    let mut raw = csv::StringRecord::new();
    while rdr
        .read_record(&mut raw)
        .map_err(|e| ReportError::unavailable(source, e))?
    {
        // Physical line where the record starts; quoted fields may span lines.
        let line = raw.position().map(|p| p.line()).unwrap_or(0);
        let row: RawRow = raw
            .deserialize(Some(&headers))
            .map_err(|e| ReportError::unavailable(source, format!("line {}: {}", line, e)))?;
        let started_at = required_timestamp(source, line, "started_at", row.started_at.as_deref())?;
        let ended_at = required_timestamp(source, line, "ended_at", row.ended_at.as_deref())?;
        let member_casual = row.member_casual.filter(|s| !s.is_empty());
        records.push(TripRecord {
            ride_id: row.ride_id.filter(|s| !s.is_empty()),
            started_at,
            ended_at,
            member_casual,
        });
    }
    Ok(records)
}

fn required_timestamp(
    source: &str,
    line: u64,
    column: &str,
    value: Option<&str>,
) -> Result<crate::types::Timestamp, ReportError> {
    let raw = value.unwrap_or("");
    parse_timestamp(raw).ok_or_else(|| {
        ReportError::unavailable(
            source,
            format!("line {}: cannot parse {} value {:?}", line, column, raw),
        )
    })
}
