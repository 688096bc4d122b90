use crate::error::{IngestError, Result};
use crate::source::RawRecord;
use chrono::{NaiveDate, NaiveDateTime};
use salesdw::models::CleanRecord;

fn is_complete(record: &RawRecord) -> bool {
    let has_timestamp = record
        .timestamp
        .as_deref()
        .map(|ts| !ts.trim().is_empty())
        .unwrap_or(false);
    let has_price = record.price.map(|p| !p.is_nan()).unwrap_or(false);
    has_timestamp && has_price && record.user_id.is_some()
}

/// Drops every row with at least one missing field. A NaN price counts as missing.
pub fn drop_rows_with_missing(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let before = records.len();
    let kept: Vec<RawRecord> = records.into_iter().filter(is_complete).collect();
    if kept.len() < before {
        log::warn!("Dropped {} rows with missing values", before - kept.len());
    }
    kept
}

/// Parses a timestamp with `format`. Date-only formats resolve to midnight.
pub fn parse_timestamp(raw: &str, format: &str) -> std::result::Result<NaiveDateTime, String> {
    let raw = raw.trim();
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
        return Ok(datetime);
    }
    NaiveDate::parse_from_str(raw, format)
        .map_err(|e| format!("'{raw}' does not match '{format}': {e}"))?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("'{raw}' has no midnight"))
}

/// Converts complete rows to `CleanRecord`s, deriving year, semester,
/// trimester and month from the parsed timestamp.
///
/// Expects the output of `drop_rows_with_missing`; a row still missing a field
/// is reported as a parse error.
pub fn transform_timestamp(records: &[RawRecord], format: &str) -> Result<Vec<CleanRecord>> {
    records
        .iter()
        .map(|record| {
            let missing = |field: &str| IngestError::Parse {
                line: record.line,
                message: format!("missing {field}"),
            };
            let raw_ts = record.timestamp.as_deref().ok_or_else(|| missing("timestamp"))?;
            let price = record.price.ok_or_else(|| missing("price"))?;
            let user_id = record.user_id.ok_or_else(|| missing("user_id"))?;
            let timestamp = parse_timestamp(raw_ts, format).map_err(|message| {
                IngestError::Parse {
                    line: record.line,
                    message,
                }
            })?;
            Ok(CleanRecord::new(user_id, price, timestamp))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TIMESTAMP_FORMAT;
    use salesdw::models::TimeParts;

    fn raw(ts: Option<&str>, price: Option<f64>, user: Option<i64>, line: u64) -> RawRecord {
        RawRecord {
            timestamp: ts.map(str::to_string),
            price,
            user_id: user,
            line,
        }
    }

    #[test]
    fn drops_incomplete_rows_and_keeps_order() {
        let records = vec![
            raw(Some("1/1/2021"), Some(1.0), Some(1), 2),
            raw(None, Some(2.0), Some(2), 3),
            raw(Some("1/3/2021"), Some(f64::NAN), Some(3), 4),
            raw(Some("1/4/2021"), Some(4.0), None, 5),
            raw(Some("  "), Some(5.0), Some(5), 6),
            raw(Some("1/6/2021"), Some(0.0), Some(6), 7),
        ];
        let kept = drop_rows_with_missing(records);
        let lines: Vec<u64> = kept.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 7]);
    }

    #[test]
    fn derives_time_parts_from_month_day_year() {
        let records = vec![raw(Some("8/15/2021"), Some(12.0), Some(9), 2)];
        let clean = transform_timestamp(&records, DEFAULT_TIMESTAMP_FORMAT).unwrap();
        assert_eq!(clean.len(), 1);
        assert_eq!(clean[0].user_id, 9);
        assert_eq!(clean[0].timestamp.to_string(), "2021-08-15 00:00:00");
        assert_eq!(
            clean[0].parts,
            TimeParts {
                year: 2021,
                semester: 2,
                trimester: 3,
                month: 8
            }
        );
    }

    #[test]
    fn keeps_time_of_day_for_datetime_formats() {
        let ts = parse_timestamp("2021-03-04 10:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(ts.to_string(), "2021-03-04 10:30:00");
    }

    #[test]
    fn malformed_timestamp_names_the_line() {
        let records = vec![
            raw(Some("1/1/2021"), Some(1.0), Some(1), 2),
            raw(Some("2021-13-45"), Some(1.0), Some(1), 3),
        ];
        let err = transform_timestamp(&records, DEFAULT_TIMESTAMP_FORMAT).unwrap_err();
        assert!(matches!(err, IngestError::Parse { line: 3, .. }));
    }
}
