//! Locale-invariant primitive parsing
//!
//! Text is always read with a fixed, culture-independent format. Numbers
//! accept a decimal point and `,` thousands separators; the optional
//! decimal-comma fallback additionally accepts `"3,5"` and `"1.234,5"`.
//! Dates are ISO-8601 plus caller-supplied `chrono` format strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use uuid::Uuid;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Ticks per second in the timespan text format (100 ns resolution).
const TICKS_PER_SECOND: u32 = 10_000_000;

/// Parse a whole number. A leading `+` is accepted.
pub fn parse_integer(s: &str) -> Option<i128> {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    s.parse::<i128>().ok()
}

/// Parse a floating-point number.
///
/// Tries the invariant form first (`1234.5`, `1,234.5`, `1e3`); when
/// `decimal_comma` is set, falls back to the decimal-comma form
/// (`1234,5`, `1.234,5`).
pub fn parse_float(s: &str, decimal_comma: bool) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }

    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');

    // "1,234.5" or "1,234"
    let thousands_comma = match (last_comma, last_dot) {
        (Some(c), Some(d)) => c < d,
        (Some(_), None) => !decimal_comma,
        _ => false,
    };
    if thousands_comma && valid_grouping(s, ',', '.') {
        if let Ok(v) = s.replace(',', "").parse::<f64>() {
            return Some(v);
        }
    }

    if decimal_comma {
        if let Some(c) = last_comma {
            if last_dot.is_none_or(|d| d < c) && s.matches(',').count() == 1 {
                let normalized = s.replace('.', "").replace(',', ".");
                if let Ok(v) = normalized.parse::<f64>() {
                    return Some(v);
                }
            }
        }
    }
    None
}

/// Thousands groups after the first must have exactly three digits.
fn valid_grouping(s: &str, group: char, decimal: char) -> bool {
    let integral = s.split(decimal).next().unwrap_or(s);
    let mut groups = integral.split(group);
    let first_ok = groups
        .next()
        .is_some_and(|g| !g.is_empty() && g.len() <= 4);
    first_ok && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse a boolean against caller-supplied literals, case-insensitively.
pub fn parse_bool<S: AsRef<str>>(s: &str, true_literals: &[S], false_literals: &[S]) -> Option<bool> {
    let s = s.trim();
    if true_literals.iter().any(|l| l.as_ref().eq_ignore_ascii_case(s)) {
        Some(true)
    } else if false_literals.iter().any(|l| l.as_ref().eq_ignore_ascii_case(s)) {
        Some(false)
    } else {
        None
    }
}

/// Parse a single character. Surrounding whitespace is not trimmed.
pub fn parse_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Parse a calendar date. Date-time text is accepted and truncated.
pub fn parse_date<S: AsRef<str>>(s: &str, extra_formats: &[S]) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .copied()
        .chain(extra_formats.iter().map(AsRef::as_ref))
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime::<&str>(s, &[]).map(|dt| dt.date()))
}

/// Parse a date and time without offset.
///
/// Date-only text yields midnight; RFC 3339 text with an offset is
/// normalised to UTC.
pub fn parse_datetime<S: AsRef<str>>(s: &str, extra_formats: &[S]) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .copied()
        .chain(extra_formats.iter().map(AsRef::as_ref))
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a UTC instant. Text without an offset is taken as UTC.
pub fn parse_datetime_utc<S: AsRef<str>>(s: &str, extra_formats: &[S]) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_datetime(s, extra_formats).map(|dt| dt.and_utc()))
}

/// Parse a timespan in `[-][d.]hh:mm[:ss[.fffffff]]` form.
pub fn parse_timespan(s: &str) -> Option<TimeDelta> {
    let s = s.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let (days, hours) = match parts[0].split_once('.') {
        Some((d, h)) => (d.parse::<i64>().ok()?, h.parse::<i64>().ok()?),
        None => (0, parts[0].parse::<i64>().ok()?),
    };
    let minutes = parts[1].parse::<i64>().ok()?;
    let (seconds, ticks) = match parts.get(2) {
        Some(sec) => match sec.split_once('.') {
            Some((whole, frac)) => (whole.parse::<i64>().ok()?, parse_ticks(frac)?),
            None => (sec.parse::<i64>().ok()?, 0),
        },
        None => (0, 0),
    };

    if days < 0 || !(0..24).contains(&hours) || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return None;
    }

    let total = TimeDelta::try_days(days)?
        .checked_add(&TimeDelta::try_hours(hours)?)?
        .checked_add(&TimeDelta::try_minutes(minutes)?)?
        .checked_add(&TimeDelta::try_seconds(seconds)?)?
        .checked_add(&TimeDelta::nanoseconds(ticks as i64 * 100))?;
    Some(if negative { -total } else { total })
}

fn parse_ticks(frac: &str) -> Option<u32> {
    if frac.is_empty() || frac.len() > 7 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: u32 = frac.parse().ok()?;
    Some(digits * 10u32.pow(7 - frac.len() as u32))
}

/// Render a timespan as `[-][d.]hh:mm:ss[.fffffff]`.
pub fn format_timespan(span: TimeDelta) -> String {
    let negative = span < TimeDelta::zero();
    let span = span.abs();
    let total_secs = span.num_seconds();
    let ticks = span.subsec_nanos() as u32 / 100;

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{}.", days));
    }
    out.push_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds));
    if ticks > 0 {
        out.push_str(&format!(".{:07}", ticks % TICKS_PER_SECOND));
    }
    out
}

/// Parse a GUID in hyphenated, simple, braced or URN form.
pub fn parse_guid(s: &str) -> Option<Uuid> {
    Uuid::parse_str(s.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer(" 42 "), Some(42));
        assert_eq!(parse_integer("+7"), Some(7));
        assert_eq!(parse_integer("-300"), Some(-300));
        assert_eq!(parse_integer("4.2"), None);
    }

    #[test]
    fn test_parse_float_invariant() {
        assert_eq!(parse_float("3.5", false), Some(3.5));
        assert_eq!(parse_float("1,234.5", false), Some(1234.5));
        assert_eq!(parse_float("1e3", false), Some(1000.0));
        assert_eq!(parse_float("3,5", false), None);
        assert_eq!(parse_float("", true), None);
    }

    #[test]
    fn test_parse_float_decimal_comma() {
        assert_eq!(parse_float("3,5", true), Some(3.5));
        assert_eq!(parse_float("1.234,5", true), Some(1234.5));
        assert_eq!(parse_float("-0,25", true), Some(-0.25));
        assert_eq!(parse_float("1,2,3", true), None);
    }

    #[test]
    fn test_parse_bool() {
        let t = ["true", "1", "yes"];
        let f = ["false", "0", "no"];
        assert_eq!(parse_bool("TRUE", &t, &f), Some(true));
        assert_eq!(parse_bool(" no ", &t, &f), Some(false));
        assert_eq!(parse_bool("maybe", &t, &f), None);
    }

    #[test]
    fn test_parse_dates() {
        let none: &[&str] = &[];
        assert_eq!(parse_date("2024-02-29", none), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(
            parse_date("29/02/2024", &["%d/%m/%Y"]),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        let dt = parse_datetime("2024-02-29T13:05:00", none).unwrap();
        assert_eq!(dt.to_string(), "2024-02-29 13:05:00");
        let midnight = parse_datetime("2024-02-29", none).unwrap();
        assert_eq!(midnight.to_string(), "2024-02-29 00:00:00");
        let utc = parse_datetime_utc("2024-02-29T13:05:00+02:00", none).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-02-29T11:05:00+00:00");
    }

    #[test]
    fn test_timespan_text() {
        let span = parse_timespan("1.02:03:04.5").unwrap();
        assert_eq!(span.num_milliseconds(), ((26 * 60 + 3) * 60 + 4) * 1000 + 500);
        assert_eq!(format_timespan(span), "1.02:03:04.5000000");
        assert_eq!(parse_timespan("-00:30"), Some(-TimeDelta::minutes(30)));
        assert_eq!(format_timespan(-TimeDelta::minutes(30)), "-00:30:00");
        assert_eq!(parse_timespan("25:00:00"), None);
        assert_eq!(parse_timespan("abc"), None);
    }

    #[test]
    fn test_parse_guid() {
        let id = parse_guid("{67e55044-10b1-426f-9247-bb680e5fe0c8}").unwrap();
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert!(parse_guid("not-a-guid").is_none());
    }
}
