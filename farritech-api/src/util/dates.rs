//! Calendar date helpers shared by the reply processor and schedule filters.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Like [`ISO_DATE`] but month and day may drop their leading zero.
const LOOSE_DATE: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month padding:none]-[day padding:none]");

/// Today's date in UTC.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Parse the date part of a stored date string.
///
/// Accepts `YYYY-MM-DD` (or `YYYY-M-D`) alone or as the date part of a
/// datetime (`2099-01-01T09:30`). Anything else is `None`.
pub fn parse_date(raw: &str) -> Option<Date> {
    let head = raw.trim().split(['T', ' ']).next()?;
    Date::parse(head, LOOSE_DATE).ok()
}

pub fn format_date(date: Date) -> String {
    date.format(ISO_DATE).unwrap_or_default()
}

/// `date` shifted by `days`, saturating at the calendar bounds.
pub fn add_days(date: Date, days: i64) -> Date {
    date.checked_add(Duration::days(days)).unwrap_or(if days < 0 {
        Date::MIN
    } else {
        Date::MAX
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_parse_date_plain() {
        assert_eq!(parse_date("2099-01-01"), Some(date!(2099 - 01 - 01)));
    }

    #[test]
    fn test_parse_date_datetime_prefix() {
        assert_eq!(parse_date(" 2026-10-16T09:30:00Z"), Some(date!(2026 - 10 - 16)));
    }

    #[test]
    fn test_parse_date_unpadded() {
        assert_eq!(parse_date("2099-1-5"), Some(date!(2099 - 01 - 05)));
        assert_eq!(parse_date("2099-1-05 08:00"), Some(date!(2099 - 01 - 05)));
    }

    #[test]
    fn test_parse_date_invalid() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date("2026-13-01"), None);
        assert_eq!(parse_date("10/16/2026"), None);
    }

    #[test]
    fn test_format_and_add_days() {
        let start = add_days(date!(2026 - 10 - 16), 14);
        assert_eq!(format_date(start), "2026-10-30");
        assert_eq!(add_days(date!(2026 - 03 - 01), -1), date!(2026 - 02 - 28));
    }
}
