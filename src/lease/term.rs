use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Percentage};
use crate::errors::Result;
use crate::interval::{month_bounds, previous_day, DateInterval};

/// a time-bounded annual value within a lease item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseTerm {
    /// stable identifier within the owning item, assigned on insertion
    pub sequence: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// annual base amount
    pub value: Money,
    pub kind: TermKind,
}

/// the two concrete term shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TermKind {
    Fixed,
    Indexable(Indexation),
}

/// indexation state of an indexable term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indexation {
    pub base_index_start_date: NaiveDate,
    pub base_index_end_date: NaiveDate,
    pub next_index_start_date: Option<NaiveDate>,
    pub next_index_end_date: Option<NaiveDate>,
    /// defaults to the term start
    pub indexation_application_date: Option<NaiveDate>,
    pub base_index_value: Option<Decimal>,
    pub next_index_value: Option<Decimal>,
    pub indexation_percentage: Option<Percentage>,
    pub indexed_value: Option<Money>,
}

/// outcome of (re)indexing a term
#[derive(Debug, Clone, PartialEq)]
pub enum IndexationStatus {
    /// no next index period, the base value applies
    NotApplicable,
    /// waiting for an index value to be published
    Pending,
    Applied {
        percentage: Percentage,
        indexed_value: Money,
    },
}

impl Indexation {
    /// index readings of the months containing `base_month` and `next_month`
    pub fn monthly(base_month: NaiveDate, next_month: Option<NaiveDate>) -> Result<Self> {
        let (base_start, base_end) = month_bounds(base_month)?;
        let next = next_month.map(month_bounds).transpose()?;
        Ok(Self {
            base_index_start_date: base_start,
            base_index_end_date: base_end,
            next_index_start_date: next.map(|(start, _)| start),
            next_index_end_date: next.map(|(_, end)| end),
            indexation_application_date: None,
            base_index_value: None,
            next_index_value: None,
            indexation_percentage: None,
            indexed_value: None,
        })
    }

    pub fn with_application_date(mut self, date: NaiveDate) -> Self {
        self.indexation_application_date = Some(date);
        self
    }

    pub fn base_index_period(&self) -> DateInterval {
        DateInterval::closed(self.base_index_start_date, self.base_index_end_date)
    }

    pub fn next_index_period(&self) -> Option<DateInterval> {
        match (self.next_index_start_date, self.next_index_end_date) {
            (Some(start), Some(end)) => Some(DateInterval::closed(start, end)),
            (Some(start), None) => Some(DateInterval::closed(start, start)),
            _ => None,
        }
    }

    /// drop derived values, leaving the term at its base value
    pub(crate) fn reset(&mut self) {
        self.base_index_value = None;
        self.next_index_value = None;
        self.indexation_percentage = None;
        self.indexed_value = None;
    }

    pub fn status(&self) -> IndexationStatus {
        match (self.indexation_percentage, self.indexed_value) {
            (Some(percentage), Some(indexed_value)) => IndexationStatus::Applied {
                percentage,
                indexed_value,
            },
            _ if self.next_index_start_date.is_none() => IndexationStatus::NotApplicable,
            _ => IndexationStatus::Pending,
        }
    }
}

impl LeaseTerm {
    /// plain term with a fixed annual value
    pub fn fixed(start_date: NaiveDate, end_date: Option<NaiveDate>, value: Money) -> Self {
        Self {
            sequence: 0,
            start_date,
            end_date,
            value,
            kind: TermKind::Fixed,
        }
    }

    /// term whose value escalates with a price index
    pub fn indexable(
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        value: Money,
        indexation: Indexation,
    ) -> Self {
        Self {
            sequence: 0,
            start_date,
            end_date,
            value,
            kind: TermKind::Indexable(indexation),
        }
    }

    pub fn interval(&self) -> DateInterval {
        DateInterval::new(Some(self.start_date), self.end_date)
    }

    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn indexation(&self) -> Option<&Indexation> {
        match &self.kind {
            TermKind::Indexable(indexation) => Some(indexation),
            TermKind::Fixed => None,
        }
    }

    pub(crate) fn indexation_mut(&mut self) -> Option<&mut Indexation> {
        match &mut self.kind {
            TermKind::Indexable(indexation) => Some(indexation),
            TermKind::Fixed => None,
        }
    }

    pub fn indexation_percentage(&self) -> Option<Percentage> {
        self.indexation().and_then(|i| i.indexation_percentage)
    }

    pub fn indexed_value(&self) -> Option<Money> {
        self.indexation().and_then(|i| i.indexed_value)
    }

    /// value in force once indexation has been applied
    pub fn effective_value(&self) -> Money {
        self.indexed_value().unwrap_or(self.value)
    }

    /// annual value per sub-interval of the term
    pub fn value_segments(&self) -> Result<Vec<(DateInterval, Money)>> {
        let indexed = match &self.kind {
            TermKind::Fixed => None,
            TermKind::Indexable(indexation) => indexation
                .indexed_value
                .map(|value| (value, indexation.indexation_application_date)),
        };

        match indexed {
            None => Ok(vec![(self.interval(), self.value)]),
            Some((indexed_value, Some(applies_from)))
                if applies_from > self.start_date && self.interval().contains(applies_from) =>
            {
                Ok(vec![
                    (DateInterval::closed(self.start_date, previous_day(applies_from)?), self.value),
                    (DateInterval::new(Some(applies_from), self.end_date), indexed_value),
                ])
            }
            Some((indexed_value, _)) => Ok(vec![(self.interval(), indexed_value)]),
        }
    }
}
