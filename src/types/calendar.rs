use chrono::{Datelike, Duration, NaiveDate};

pub(crate) fn days_in_month(year: i32, month: u32) -> Option<u32> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (next_month_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_day_of_next_month = NaiveDate::from_ymd_opt(next_month_year, next_month, 1)?;
    let last_day_of_current_month = first_day_of_next_month - Duration::days(1);
    Some(last_day_of_current_month.day())
}

/// Builds a date, pulling the day back to the last day of the month when the
/// month is shorter (29 February in a common year becomes 28 February).
pub(crate) fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last_day = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last_day))
}

/// Every date from `start` to `end`, both inclusive. Empty when `start > end`.
pub(crate) fn dates_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |date| *date <= end)
}
