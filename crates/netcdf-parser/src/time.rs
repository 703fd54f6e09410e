//! CF-convention time decoding.
//!
//! Time coordinates are stored as offsets from a reference date described by
//! the variable's `units` attribute, e.g. `"hours since 2020-01-01 00:00:00"`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};

/// Format used when logging a selected time slice.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decode a CF time value into a UTC timestamp.
///
/// Returns `None` when the units string is not of the form
/// `"<unit> since <reference>"` or the unit is not one of
/// seconds/minutes/hours/days, and when the offset falls outside the
/// range chrono can represent.
pub fn decode_cf_time(value: f64, units: &str) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let (unit, reference) = units.split_once(" since ")?;
    let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
        "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
        "minutes" | "minute" | "mins" | "min" => 60.0,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3600.0,
        "days" | "day" | "d" => 86400.0,
        _ => return None,
    };
    let reference = parse_reference(reference.trim())?;
    let millis = (value * seconds_per_unit * 1000.0).round() as i64;
    let offset = TimeDelta::try_milliseconds(millis)?;
    reference.checked_add_signed(offset)
}

fn parse_reference(s: &str) -> Option<DateTime<Utc>> {
    // Drop a trailing zone designator, CF references are UTC in practice.
    let s = s
        .trim_end_matches(" UTC")
        .trim_end_matches('Z')
        .trim_end_matches(" +00:00");

    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
