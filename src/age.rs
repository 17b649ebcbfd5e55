//! How long a GitHub account has existed, as "X years, Y months, Z days".
//!
//! chrono has no year/month/day difference, so the borrowing is done here:
//! a negative day count borrows the length of the month(s) before `today`, and
//! a negative month count borrows a year.

use chrono::{DateTime, Datelike, NaiveDate};

/// Parse the profile's `created_at` (RFC 3339, e.g. `2011-01-25T18:44:36Z`).
pub fn parse_created_at(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.date_naive())
}

pub fn account_age(created: NaiveDate, today: NaiveDate) -> String {
    if today < created {
        return format_span(0, 0, 0);
    }

    let mut years = today.year() - created.year();
    let mut months = today.month() as i32 - created.month() as i32;
    let mut days = today.day() as i32 - created.day() as i32;

    // Borrowing once can still leave days negative when the creation day is
    // later than the previous month's length (created on the 31st, say).
    let mut cursor = today;
    while days < 0 {
        months -= 1;
        let (year, month) = previous_month(cursor);
        days += days_in_month(year, month) as i32;
        cursor = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(cursor);
    }

    while months < 0 {
        years -= 1;
        months += 12;
    }

    format_span(years, months, days)
}

fn format_span(years: i32, months: i32, days: i32) -> String {
    format!(
        "{years} year{}, {months} month{}, {days} day{}",
        plural(years),
        plural(months),
        plural(days)
    )
}

fn plural(n: i32) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn previous_month(date: NaiveDate) -> (i32, u32) {
    if date.month() == 1 {
        (date.year() - 1, 12)
    } else {
        (date.year(), date.month() - 1)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
