//! Calendar windows for the day/week/month/year event listings.
//!
//! A [`DateWindow`] is a half-open UTC interval `[start, end)` computed from a
//! reference date and a [`Granularity`]. Weeks start on Monday. An event
//! belongs to a window when its own interval intersects it, see
//! [`DateWindow::overlaps`].

use std::{fmt, ops::RangeInclusive, str::FromStr};

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Format accepted for the `date` query parameter.
pub const REFERENCE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Years a reference date may fall in. Postgres `timestamptz` cannot hold
/// the far ends of chrono's range.
pub const REFERENCE_YEARS: RangeInclusive<i32> = 1..=9999;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("A reference date is required (expected YYYY-MM-DD).")]
    MissingDate,

    #[error("Invalid date format: {0:?} (expected YYYY-MM-DD).")]
    InvalidDate(String),

    #[error("Invalid granularity: {0:?} (expected one of day, week, month, year).")]
    InvalidGranularity(String),

    #[error("Date {0} is outside the supported calendar range.")]
    OutOfRange(NaiveDate),
}

/// Size of the window an event listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Granularity::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| RangeError::InvalidGranularity(s.to_string()))
    }
}

/// Parse the raw `date` query parameter.
///
/// Absent and blank values are both rejected; there is no implicit "today".
pub fn parse_reference_date(raw: Option<&str>) -> Result<NaiveDate, RangeError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let raw = raw.ok_or(RangeError::MissingDate)?;

    let date = NaiveDate::parse_from_str(raw, REFERENCE_DATE_FORMAT)
        .map_err(|_| RangeError::InvalidDate(raw.to_string()))?;

    if !REFERENCE_YEARS.contains(&date.year()) {
        return Err(RangeError::OutOfRange(date));
    }
    Ok(date)
}

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Compute the window of `granularity` containing `reference`.
    pub fn resolve(reference: NaiveDate, granularity: Granularity) -> Result<Self, RangeError> {
        let out_of_range = || RangeError::OutOfRange(reference);

        let (first, next) = match granularity {
            Granularity::Day => (reference, reference.succ_opt().ok_or_else(out_of_range)?),
            Granularity::Week => {
                let offset = reference.weekday().num_days_from_monday();
                let monday = reference
                    .checked_sub_days(Days::new(offset.into()))
                    .ok_or_else(out_of_range)?;
                let next = monday
                    .checked_add_days(Days::new(7))
                    .ok_or_else(out_of_range)?;
                (monday, next)
            }
            Granularity::Month => {
                let first = reference.with_day(1).ok_or_else(out_of_range)?;
                let next = if reference.month() == 12 {
                    NaiveDate::from_ymd_opt(reference.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(reference.year(), reference.month() + 1, 1)
                }
                .ok_or_else(out_of_range)?;
                (first, next)
            }
            Granularity::Year => {
                let first =
                    NaiveDate::from_ymd_opt(reference.year(), 1, 1).ok_or_else(out_of_range)?;
                let next = NaiveDate::from_ymd_opt(reference.year() + 1, 1, 1)
                    .ok_or_else(out_of_range)?;
                (first, next)
            }
        };

        Ok(Self {
            start: midnight(first).ok_or_else(out_of_range)?,
            end: midnight(next).ok_or_else(out_of_range)?,
        })
    }

    /// Whether an event spanning `[start, end]` intersects this window.
    ///
    /// An event ending exactly at the window start still matches; one
    /// starting exactly at the window end does not.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end >= self.start
    }

    pub fn width(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Every calendar day covered by the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let count = self.width().num_days().max(0) as usize;
        self.start.date_naive().iter_days().take(count)
    }

    /// Group `items` under each day of the window they overlap.
    ///
    /// Items are cloned into every day they touch, preserving input order.
    pub fn split_days<T, F>(&self, items: &[T], span: F) -> Result<Vec<(NaiveDate, Vec<T>)>, RangeError>
    where
        T: Clone,
        F: Fn(&T) -> (DateTime<Utc>, DateTime<Utc>),
    {
        self.days()
            .map(|day| {
                let window = DateWindow::resolve(day, Granularity::Day)?;
                let matching = items
                    .iter()
                    .filter(|item| {
                        let (start, end) = span(item);
                        window.overlaps(start, end)
                    })
                    .cloned()
                    .collect();
                Ok((day, matching))
            })
            .collect()
    }
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}
