use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LeaseError, Result};

/// Day-inclusive date range. A missing bound is unbounded: `None` as start
/// means "since forever", `None` as end means "open-ended".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateInterval {
    /// create interval, which may be invalid (see `is_valid`)
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// both bounds known
    pub fn closed(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// open-ended from `start`
    pub fn starting(start: NaiveDate) -> Self {
        Self::new(Some(start), None)
    }

    /// everything up to and including `end`
    pub fn ending(end: NaiveDate) -> Self {
        Self::new(None, Some(end))
    }

    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// the calendar month containing `date`
    pub fn month_of(date: NaiveDate) -> Result<Self> {
        let (start, end) = month_bounds(date)?;
        Ok(Self::closed(start, end))
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn is_open_ended(&self) -> bool {
        self.end.is_none()
    }

    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    /// return self when valid, an `InvalidInterval` error otherwise
    pub fn validate(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(LeaseError::InvalidInterval { interval: self })
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| s <= date) && self.end.map_or(true, |e| date <= e)
    }

    /// true when every day of `other` is in self
    pub fn contains_interval(&self, other: &DateInterval) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }
        let start_ok = match (self.start, other.start) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a <= b,
        };
        let end_ok = match (self.end, other.end) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => b <= a,
        };
        start_ok && end_ok
    }

    /// true iff both ranges share at least one day
    pub fn overlaps(&self, other: &DateInterval) -> bool {
        self.intersection(other).is_some()
    }

    /// common days of both ranges, none when disjoint or either is invalid
    pub fn intersection(&self, other: &DateInterval) -> Option<DateInterval> {
        if !self.is_valid() || !other.is_valid() {
            return None;
        }
        let candidate = DateInterval::new(
            later_start(self.start, other.start),
            earlier_end(self.end, other.end),
        );
        candidate.is_valid().then_some(candidate)
    }

    /// number of days, none for unbounded or invalid ranges
    pub fn days(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => Some((end - start).num_days() + 1),
            _ => None,
        }
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(start) => write!(f, "{}", start)?,
            None => write!(f, "..")?,
        }
        write!(f, "/")?;
        match self.end {
            Some(end) => write!(f, "{}", end),
            None => write!(f, ".."),
        }
    }
}

fn later_start(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

fn earlier_end(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

pub(crate) fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt().ok_or_else(|| LeaseError::date_overflow(date))
}

pub(crate) fn previous_day(date: NaiveDate) -> Result<NaiveDate> {
    date.pred_opt().ok_or_else(|| LeaseError::date_overflow(date))
}

pub(crate) fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| LeaseError::date_overflow(date))
}

pub(crate) fn subtract_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| LeaseError::date_overflow(date))
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.day0() as i64)
}

pub(crate) fn month_bounds(date: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let start = first_of_month(date);
    Ok((start, last_of_month(start)?))
}

pub(crate) fn last_of_month(date: NaiveDate) -> Result<NaiveDate> {
    previous_day(add_months(first_of_month(date), 1)?)
}
