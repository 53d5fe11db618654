//! PHP-style date specifiers (`Y-m-d H:i:s`) on top of chrono.
//!
//! Each recognised character expands to a date component. `\x` emits `x`
//! literally and every other character is copied as is.
//!
//! Zone names are not available, so `e` and `T` print the numeric offset.

use std::fmt::{self, Write};

use chrono::{DateTime, Datelike, NaiveDate, Offset, TimeZone, Timelike};

use crate::error::FormatError;

/// Specifier used when a placeholder carries an empty parameter.
pub const DEFAULT_DATE_FORMAT: &str = "r";

/// Formats `date` according to the PHP-style specifier `spec`.
pub fn format_date<Tz>(date: &DateTime<Tz>, spec: &str) -> Result<String, FormatError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let spec = if spec.is_empty() {
        DEFAULT_DATE_FORMAT
    } else {
        spec
    };
    let mut out = String::with_capacity(spec.len() * 4);
    let mut chars = spec.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => return Err(FormatError::TrailingEscape(spec.to_string())),
            }
            continue;
        }
        // writing to a String cannot fail
        let _ = push_component(&mut out, date, c);
    }
    Ok(out)
}

fn push_component<Tz>(out: &mut String, date: &DateTime<Tz>, c: char) -> fmt::Result
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match c {
        // day
        'd' => write!(out, "{}", date.format("%d")),
        'D' => write!(out, "{}", date.format("%a")),
        'j' => write!(out, "{}", date.day()),
        'l' => write!(out, "{}", date.format("%A")),
        'N' => write!(out, "{}", date.weekday().number_from_monday()),
        'S' => out.write_str(ordinal_suffix(date.day())),
        'w' => write!(out, "{}", date.weekday().num_days_from_sunday()),
        'z' => write!(out, "{}", date.ordinal0()),
        // week
        'W' => write!(out, "{:02}", date.iso_week().week()),
        // month
        'F' => write!(out, "{}", date.format("%B")),
        'm' => write!(out, "{}", date.format("%m")),
        'M' => write!(out, "{}", date.format("%b")),
        'n' => write!(out, "{}", date.month()),
        't' => write!(out, "{}", days_in_month(date.year(), date.month())),
        // year
        'L' => out.write_str(if is_leap_year(date.year()) { "1" } else { "0" }),
        'o' => write!(out, "{}", date.iso_week().year()),
        'Y' => write!(out, "{}", date.year()),
        'y' => write!(out, "{}", date.format("%y")),
        // time
        'a' => write!(out, "{}", date.format("%P")),
        'A' => write!(out, "{}", date.format("%p")),
        'g' => write!(out, "{}", date.hour12().1),
        'G' => write!(out, "{}", date.hour()),
        'h' => write!(out, "{}", date.format("%I")),
        'H' => write!(out, "{}", date.format("%H")),
        'i' => write!(out, "{}", date.format("%M")),
        's' => write!(out, "{}", date.format("%S")),
        'u' => write!(out, "{:06}", date.timestamp_subsec_micros()),
        'v' => write!(out, "{:03}", date.timestamp_subsec_millis()),
        'B' => write!(out, "{:03}", swatch_beat(date.timestamp())),
        // timezone
        'e' | 'T' => write!(out, "{}", date.format("%Z")),
        'I' => out.write_str(if is_daylight_saving(date) { "1" } else { "0" }),
        'Z' => write!(out, "{}", date.offset().fix().local_minus_utc()),
        'O' => write!(out, "{}", date.format("%z")),
        'P' => write!(out, "{}", date.format("%:z")),
        'p' => {
            if date.offset().fix().local_minus_utc() == 0 {
                out.write_char('Z')
            } else {
                write!(out, "{}", date.format("%:z"))
            }
        }
        // full date/time
        'c' => write!(out, "{}", date.format("%Y-%m-%dT%H:%M:%S%:z")),
        'r' => write!(out, "{}", date.format("%a, %d %b %Y %H:%M:%S %z")),
        'U' => write!(out, "{}", date.timestamp()),
        other => out.write_char(other),
    }
}

/// Internet time: thousandths of a day in UTC+1.
fn swatch_beat(timestamp: i64) -> i64 {
    ((timestamp + 3600).rem_euclid(86_400) * 10 / 864) % 1000
}

/// True when the offset is ahead of the smaller of the January and July
/// offsets of the same year.
fn is_daylight_saving<Tz: TimeZone>(date: &DateTime<Tz>) -> bool {
    let offset_on = |month: u32| {
        NaiveDate::from_ymd_opt(date.year(), month, 1)
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|utc| {
                date.timezone()
                    .offset_from_utc_datetime(&utc)
                    .fix()
                    .local_minus_utc()
            })
    };
    let current = date.offset().fix().local_minus_utc();
    match (offset_on(1), offset_on(7)) {
        (Some(january), Some(july)) => current > january.min(july),
        _ => false,
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn sample() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 7, 8, 9)
            .single()
            .unwrap()
            .with_nanosecond(123_456_000)
            .unwrap()
    }

    #[test]
    fn test_compact_date() {
        assert_eq!(format_date(&sample(), "Ymd").unwrap(), "20240305");
        assert_eq!(
            format_date(&sample(), "Y-m-d H:i:s").unwrap(),
            "2024-03-05 07:08:09"
        );
    }

    #[test]
    fn test_textual_components() {
        assert_eq!(format_date(&sample(), "D, d M Y").unwrap(), "Tue, 05 Mar 2024");
        assert_eq!(format_date(&sample(), "l jS F").unwrap(), "Tuesday 5th March");
        assert_eq!(format_date(&sample(), "g:i a / h A / G").unwrap(), "7:08 am / 07 AM / 7");
    }

    #[test]
    fn test_numeric_components() {
        // 2024 is a leap year: 31 + 29 + 5 days, zero based
        assert_eq!(format_date(&sample(), "N w z t L").unwrap(), "2 2 64 31 1");
        assert_eq!(format_date(&sample(), "W o y n").unwrap(), "10 2024 24 3");
        assert_eq!(format_date(&sample(), "u v").unwrap(), "123456 123");
        assert_eq!(
            format_date(&sample(), "U").unwrap(),
            sample().timestamp().to_string()
        );
    }

    #[test]
    fn test_timezone_components() {
        assert_eq!(format_date(&sample(), "O P p").unwrap(), "+0200 +02:00 +02:00");
        let utc = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).single().unwrap();
        assert_eq!(format_date(&utc, "p").unwrap(), "Z");
        assert_eq!(format_date(&sample(), "Z I").unwrap(), "7200 0");
        assert_eq!(format_date(&utc, "Z").unwrap(), "0");
    }

    #[test]
    fn test_swatch_internet_time() {
        // 05:08:09 UTC is 06:08:09 in UTC+1
        assert_eq!(format_date(&sample(), "B").unwrap(), "255");
        let midnight = Utc.with_ymd_and_hms(2024, 3, 5, 23, 0, 0).single().unwrap();
        assert_eq!(format_date(&midnight, "B").unwrap(), "000");
    }

    #[test]
    fn test_full_formats() {
        assert_eq!(
            format_date(&sample(), "r").unwrap(),
            "Tue, 05 Mar 2024 07:08:09 +0200"
        );
        assert_eq!(format_date(&sample(), "c").unwrap(), "2024-03-05T07:08:09+02:00");
        assert_eq!(
            format_date(&sample(), "").unwrap(),
            format_date(&sample(), "r").unwrap()
        );
    }

    #[test]
    fn test_escapes_and_literals() {
        assert_eq!(format_date(&sample(), "\\Y\\m\\d: Ymd").unwrap(), "Ymd: 20240305");
        assert_eq!(format_date(&sample(), "Y/m/d #").unwrap(), "2024/03/05 #");
        assert_eq!(
            format_date(&sample(), "Ymd\\"),
            Err(FormatError::TrailingEscape("Ymd\\".into()))
        );
    }

    #[test]
    fn test_ordinal_suffix() {
        let cases = [
            (1, "st"),
            (2, "nd"),
            (3, "rd"),
            (4, "th"),
            (11, "th"),
            (12, "th"),
            (13, "th"),
            (21, "st"),
            (22, "nd"),
            (23, "rd"),
            (31, "st"),
        ];
        for (day, suffix) in cases {
            assert_eq!(ordinal_suffix(day), suffix, "day {day}");
        }
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
        assert_eq!(days_in_month(2023, 4), 30);
    }
}
