use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{LeaseError, Result};
use crate::interval::{add_months, next_day, previous_day, DateInterval};

/// invoicing frequency, periods are aligned to the calendar year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoicingFrequency {
    MonthlyInAdvance,
    MonthlyInArrears,
    QuarterlyInAdvance,
    QuarterlyInArrears,
    SemiYearlyInAdvance,
    YearlyInAdvance,
    YearlyInArrears,
}

impl InvoicingFrequency {
    /// length of one invoicing period in months
    pub fn months(&self) -> u32 {
        match self {
            InvoicingFrequency::MonthlyInAdvance | InvoicingFrequency::MonthlyInArrears => 1,
            InvoicingFrequency::QuarterlyInAdvance | InvoicingFrequency::QuarterlyInArrears => 3,
            InvoicingFrequency::SemiYearlyInAdvance => 6,
            InvoicingFrequency::YearlyInAdvance | InvoicingFrequency::YearlyInArrears => 12,
        }
    }

    pub fn periods_per_year(&self) -> u32 {
        12 / self.months()
    }

    pub fn in_advance(&self) -> bool {
        matches!(
            self,
            InvoicingFrequency::MonthlyInAdvance
                | InvoicingFrequency::QuarterlyInAdvance
                | InvoicingFrequency::SemiYearlyInAdvance
                | InvoicingFrequency::YearlyInAdvance
        )
    }

    /// the invoicing period containing `date`
    pub fn period_containing(&self, date: NaiveDate) -> Result<DateInterval> {
        let months = self.months();
        let start_month0 = date.month0() - date.month0() % months;
        let start = NaiveDate::from_ymd_opt(date.year(), start_month0 + 1, 1)
            .ok_or_else(|| LeaseError::date_overflow(date))?;
        let end = previous_day(add_months(start, months)?)?;
        Ok(DateInterval::closed(start, end))
    }

    /// the period following `period`
    pub fn next_period(&self, period: &DateInterval) -> Result<DateInterval> {
        let end = period.end().ok_or_else(|| LeaseError::validation("invoicing period must be bounded"))?;
        self.period_containing(next_day(end)?)
    }

    /// date the charge of `period` falls due
    pub fn due_date(&self, period: &DateInterval) -> Result<NaiveDate> {
        let bounds = (period.start(), period.end());
        match bounds {
            (Some(start), Some(_)) if self.in_advance() => Ok(start),
            (Some(_), Some(end)) => next_day(end),
            _ => Err(LeaseError::validation("invoicing period must be bounded")),
        }
    }

    /// periods starting with the one containing `from`, while their due date is before `due_before`
    pub fn periods_due_before(&self, from: NaiveDate, due_before: NaiveDate) -> Result<Vec<InvoicingPeriod>> {
        let mut periods = Vec::new();
        let mut period = self.period_containing(from)?;
        loop {
            let due_date = self.due_date(&period)?;
            if due_date >= due_before {
                break;
            }
            periods.push(InvoicingPeriod { interval: period, due_date });
            period = self.next_period(&period)?;
        }
        Ok(periods)
    }
}

/// one calendar-aligned invoicing period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoicingPeriod {
    pub interval: DateInterval,
    pub due_date: NaiveDate,
}

/// how often an item's terms roll over (and get reindexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexationFrequency {
    /// a single open-ended term, nothing generated
    Never,
    /// on the anniversary of the term start
    Yearly,
    /// on the first of january
    CalendarYear,
}

impl IndexationFrequency {
    /// months between two index readings
    pub fn months(&self) -> Option<u32> {
        match self {
            IndexationFrequency::Never => None,
            IndexationFrequency::Yearly | IndexationFrequency::CalendarYear => Some(12),
        }
    }

    /// start date of the term following one that starts on `start`
    pub fn next_date(&self, start: NaiveDate) -> Result<Option<NaiveDate>> {
        match self {
            IndexationFrequency::Never => Ok(None),
            IndexationFrequency::Yearly => add_months(start, 12).map(Some),
            IndexationFrequency::CalendarYear => NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
                .map(Some)
                .ok_or_else(|| LeaseError::date_overflow(start)),
        }
    }
}
