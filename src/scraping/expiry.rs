use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// Expiry timestamp for an event listed at `date_input`.
///
/// An event expires at 02:00 UTC on the UTC calendar day after its listed
/// date. The venue's own timezone is deliberately ignored.
pub fn compute_expires_at(date_input: &str) -> Option<String> {
    let listed = parse_event_instant(date_input)?;
    let expires = expiry_for(listed)?;
    Some(expires.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

fn expiry_for(listed: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let next_day = listed.date_naive().succ_opt()?;
    let cutoff = NaiveTime::from_hms_opt(2, 0, 0)?;
    Some(Utc.from_utc_datetime(&next_day.and_time(cutoff)))
}

/// Date-times without an offset, and bare dates, are read as UTC.
fn parse_event_instant(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATE_TIME_FORMATS.iter() {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}
