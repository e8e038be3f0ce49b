/// Common calendar helper functions.
use chrono::{Datelike, NaiveDate, Weekday};

/// Returns `true` if provided year is leap.
#[inline]
pub(crate) fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Returns number of days in specified month.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    if month == 0 || month > 12 {
        panic!("Invalid month: {month}");
    }

    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => unreachable!(),
    }
}

/// Calculates day of week for specified date.
pub(crate) fn weekday(year: i32, month: u32, day: u32) -> Weekday {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date.weekday(),
        None => panic!("Invalid date: {year:04}-{month:02}-{day:02}"),
    }
}

/// Returns day in the month of the last occurrence of the specified day
/// of the week (zero-based, Sunday is 0), stepping back from the end of
/// the month.
pub(crate) fn last_weekday_of_month(year: i32, month: u32, dow: u32) -> u32 {
    let mut day = days_in_month(year, month);

    while weekday(year, month, day).num_days_from_sunday() != dow % 7 {
        day -= 1;
    }

    day
}

/// Returns date of the weekday (not Saturday or Sunday) nearest to the
/// specified day of the month.
///
/// Shift-only variant: Saturday resolves to the preceding day and Sunday
/// to the following day even when that leaves the month, in which case
/// `None` is returned and the caller treats the day as matching nothing.
/// Also `None` when `day` exceeds the month length.
pub(crate) fn nearest_weekday(year: i32, month: u32, day: u32) -> Option<u32> {
    if day == 0 || day > days_in_month(year, month) {
        return None;
    }

    match weekday(year, month, day) {
        Weekday::Sat => (day > 1).then_some(day - 1),
        Weekday::Sun => (day < days_in_month(year, month)).then_some(day + 1),
        _ => Some(day),
    }
}
