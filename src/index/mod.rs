pub mod indexation;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{LeaseError, Result};
use crate::interval::{first_of_month, DateInterval};

pub use indexation::{IndexationCalculator, IndexationResult};

/// A published reading of a price index series.
///
/// Only built through [`IndexValue::new`], so every reading handed out by a
/// repository is strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexValue {
    series: String,
    /// month the reading applies to
    date: NaiveDate,
    value: Decimal,
}

impl IndexValue {
    /// readings are strictly positive, the date is normalised to the first of the month
    pub fn new(series: &str, date: NaiveDate, value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(LeaseError::validation(format!(
                "index value for {} on {} must be positive, got {}",
                series, date, value
            )));
        }
        Ok(Self {
            series: series.to_string(),
            date: first_of_month(date),
            value,
        })
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn value(&self) -> Decimal {
        self.value
    }
}

/// lookup of index values
pub trait IndexValueRepository {
    /// the single value of `series` dated within `period`; more than one is a data error
    fn find(&self, series: &str, period: &DateInterval) -> Result<Option<IndexValue>>;
}

/// in-memory index value repository
#[derive(Debug, Clone, Default)]
pub struct IndexValues {
    values: Vec<IndexValue>,
}

impl IndexValues {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// record a reading, unique per (series, month)
    pub fn new_index_value(&mut self, series: &str, date: NaiveDate, value: Decimal) -> Result<&IndexValue> {
        let index_value = IndexValue::new(series, date, value)?;
        if self
            .values
            .iter()
            .any(|v| v.series == index_value.series && v.date == index_value.date)
        {
            return Err(LeaseError::DataIntegrity {
                context: format!("index {}", series),
                message: format!("value for {} already recorded", index_value.date),
            });
        }
        self.values.push(index_value);
        Ok(&self.values[self.values.len() - 1])
    }

    pub fn all_values(&self, series: &str) -> Vec<&IndexValue> {
        let mut values: Vec<&IndexValue> = self.values.iter().filter(|v| v.series == series).collect();
        values.sort_by_key(|v| v.date);
        values
    }
}

impl IndexValueRepository for IndexValues {
    fn find(&self, series: &str, period: &DateInterval) -> Result<Option<IndexValue>> {
        let matches: Vec<&IndexValue> = self
            .values
            .iter()
            .filter(|v| v.series == series && period.contains(v.date))
            .collect();

        match matches.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some((*single).clone())),
            _ => Err(LeaseError::DataIntegrity {
                context: format!("index {} in {}", series, period),
                message: format!("{} values found, expected one", matches.len()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ld(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_lookup_by_month() {
        let mut values = IndexValues::new();
        values.new_index_value("ISTAT-FOI", ld(2013, 11, 1), dec!(110)).unwrap();
        values.new_index_value("ISTAT-FOI", ld(2014, 12, 1), dec!(115)).unwrap();

        let november = DateInterval::month_of(ld(2013, 11, 1)).unwrap();
        let found = values.find("ISTAT-FOI", &november).unwrap().unwrap();
        assert_eq!(found.value(), dec!(110));
        assert_eq!(found.date(), ld(2013, 11, 1));

        let january = DateInterval::month_of(ld(2014, 1, 1)).unwrap();
        assert!(values.find("ISTAT-FOI", &january).unwrap().is_none());
        assert!(values.find("CPI-UK", &november).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_value_rejected() {
        let mut values = IndexValues::new();
        values.new_index_value("ISTAT-FOI", ld(2013, 11, 1), dec!(110)).unwrap();
        let err = values.new_index_value("ISTAT-FOI", ld(2013, 11, 15), dec!(111)).unwrap_err();
        assert!(matches!(err, LeaseError::DataIntegrity { .. }));
    }

    #[test]
    fn test_non_positive_value_rejected() {
        let mut values = IndexValues::new();
        let err = values.new_index_value("ISTAT-FOI", ld(2013, 11, 1), dec!(0)).unwrap_err();
        assert!(matches!(err, LeaseError::Validation { .. }));
        assert!(values.all_values("ISTAT-FOI").is_empty());

        // other repositories can only hand out readings built the same way
        assert!(IndexValue::new("ISTAT-FOI", ld(2013, 11, 1), dec!(0)).is_err());
        assert!(IndexValue::new("ISTAT-FOI", ld(2013, 11, 1), dec!(-110)).is_err());
    }

    #[test]
    fn test_multiple_matches_is_a_data_error() {
        let mut values = IndexValues::new();
        values.new_index_value("ISTAT-FOI", ld(2013, 11, 1), dec!(110)).unwrap();
        values.new_index_value("ISTAT-FOI", ld(2013, 12, 1), dec!(111)).unwrap();

        let two_months = DateInterval::closed(ld(2013, 11, 1), ld(2013, 12, 31));
        let err = values.find("ISTAT-FOI", &two_months).unwrap_err();
        assert!(matches!(err, LeaseError::DataIntegrity { .. }));
        assert_eq!(values.all_values("ISTAT-FOI").len(), 2);
    }
}
