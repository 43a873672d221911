use time::format_description::BorrowedFormatItem;
use time::macros::{date, format_description};
use time::{Date, Month};

/// Earliest date the remote API serves data for.
pub const EARLIEST_DATE: Date = date!(2019 - 01 - 01);

/// `[year]-[month]-[day]`, the date form used in API paths and payloads.
pub const DATE_FMT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A half-open date range `[from, to)` small enough for a single
/// time-series request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: Date,
    pub to: Date,
}

fn jan_first(year: i32) -> Date {
    Date::from_calendar_date(year, Month::January, 1).expect("January 1 is always valid")
}

/// Split `[start, today)` into consecutive sub-ranges no larger than one
/// calendar year, in chronological order.
///
/// The remote API does not serve arbitrarily large spans, so every fetch
/// goes through this planner. Chronological order lets the engine
/// concatenate chunk results without a final sort. Empty when
/// `start >= today`.
pub fn plan_chunks(start: Date, today: Date) -> Vec<DateRange> {
    let mut chunks = Vec::new();
    if start >= today {
        return chunks;
    }

    for year in start.year()..=today.year() {
        let from = start.max(jan_first(year));
        let to = today.min(jan_first(year + 1));
        if from < to {
            chunks.push(DateRange { from, to });
        }
    }

    chunks
}
