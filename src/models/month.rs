//! Calendar month arithmetic.

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month of a specific year.
///
/// Ordering is chronological. Deserialization applies the same `1..=12`
/// check as [`YearMonth::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawYearMonth")]
pub struct YearMonth {
    /// Calendar year.
    year: i32,
    /// Month number, `1..=12`.
    month: u32,
}

impl YearMonth {
    /// Creates a month, returning `None` unless `month` is in `1..=12`.
    #[inline]
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= 12 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Returns the month that contains `date`.
    #[inline]
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[inline]
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month number, `1..=12`.
    #[inline]
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Returns `true` if `date` falls within this month.
    #[inline]
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// First day of the month.
    ///
    /// Returns `None` only for years outside chrono's supported range.
    #[inline]
    #[must_use]
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Returns the `day`-th day of the month, if it exists.
    #[inline]
    #[must_use]
    pub fn day(self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    /// The following month, rolling into January of the next year.
    ///
    /// Returns `None` past the last representable year.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        if self.month < 12 {
            return Some(Self {
                year: self.year,
                month: self.month + 1,
            });
        }
        match self.year.checked_add(1) {
            Some(year) => Some(Self { year, month: 1 }),
            None => None,
        }
    }

    /// The preceding month, rolling back into December of the previous year.
    ///
    /// Returns `None` before the first representable year.
    #[inline]
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        if self.month > 1 {
            return Some(Self {
                year: self.year,
                month: self.month - 1,
            });
        }
        match self.year.checked_sub(1) {
            Some(year) => Some(Self { year, month: 12 }),
            None => None,
        }
    }

    /// Number of days in the month.
    #[inline]
    #[must_use]
    pub const fn days(self) -> u32 {
        match self.month {
            2 if is_leap_year(self.year) => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Weekday of the 1st counted from Sunday (Sunday = 0 ... Saturday = 6).
    ///
    /// This is the number of blank cells before day 1 in a Sunday-first grid.
    #[inline]
    #[must_use]
    pub fn leading_blanks(self) -> u32 {
        self.first_day()
            .map_or(0, |date| date.weekday().num_days_from_sunday())
    }

    /// English month name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.month {
            1 => "January",
            2 => "February",
            3 => "March",
            4 => "April",
            5 => "May",
            6 => "June",
            7 => "July",
            8 => "August",
            9 => "September",
            10 => "October",
            11 => "November",
            _ => "December",
        }
    }
}

impl core::fmt::Display for YearMonth {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.name(), self.year)
    }
}

/// Wire form of [`YearMonth`] before the month range is checked.
#[derive(Deserialize)]
struct RawYearMonth {
    /// Calendar year.
    year: i32,
    /// Month number as received.
    month: u32,
}

impl TryFrom<RawYearMonth> for YearMonth {
    type Error = String;

    #[inline]
    fn try_from(raw: RawYearMonth) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month)
            .ok_or_else(|| format!("month must be within 1..=12, got {}", raw.month))
    }
}

/// Gregorian leap year rule.
const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
