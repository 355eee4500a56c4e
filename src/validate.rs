use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

pub fn parse_date(raw: &str) -> Option<Date> {
    // `[year]` accepts a leading sign; stored dates must stay plain YYYY-MM-DD.
    if raw.len() != 10 || !raw.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

pub fn parse_time(raw: &str) -> Option<Time> {
    Time::parse(raw, format_description!("[hour]:[minute]:[second]")).ok()
}

pub fn validate_date(raw: &str) -> bool {
    parse_date(raw).is_some()
}

pub fn validate_time(raw: &str) -> bool {
    parse_time(raw).is_some()
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Whole days between installation and removal, or `today` while still installed.
pub fn days_installed(installed: &str, removal: Option<&str>, today: Date) -> Option<i64> {
    let start = parse_date(installed)?;
    let end = match removal {
        Some(raw) => parse_date(raw)?,
        None => today,
    };
    Some((end - start).whole_days())
}
