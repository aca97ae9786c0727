use rust_decimal::Decimal;

use crate::config::IndexationConfig;
use crate::decimal::{round_half_up, Money, Percentage};
use crate::errors::{LeaseError, Result};
use crate::index::IndexValue;
use crate::interval::DateInterval;

/// escalation of a base value between two index readings
#[derive(Debug, Clone, PartialEq)]
pub struct IndexationResult {
    pub base_index_value: Decimal,
    pub next_index_value: Decimal,
    pub percentage: Percentage,
    pub indexed_value: Money,
}

/// indexation calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexationCalculator {
    config: IndexationConfig,
}

impl IndexationCalculator {
    pub fn new(config: IndexationConfig) -> Self {
        Self { config }
    }

    /// percentage change between two readings, rounded to the configured scale
    pub fn percentage(&self, base_index: &IndexValue, next_index: &IndexValue) -> Percentage {
        // readings are positive by construction
        let ratio = next_index.value() / base_index.value() - Decimal::ONE;
        Percentage::from_decimal(round_half_up(
            ratio * Decimal::ONE_HUNDRED,
            self.config.percentage_scale,
        ))
    }

    /// escalate `base_value`; a missing reading is reported as `MissingIndexValue`
    pub fn calculate(
        &self,
        series: &str,
        base_value: Money,
        base: (&DateInterval, Option<&IndexValue>),
        next: (&DateInterval, Option<&IndexValue>),
    ) -> Result<IndexationResult> {
        let base_index = base.1.ok_or_else(|| LeaseError::MissingIndexValue {
            series: series.to_string(),
            period: *base.0,
        })?;
        let next_index = next.1.ok_or_else(|| LeaseError::MissingIndexValue {
            series: series.to_string(),
            period: *next.0,
        })?;

        let percentage = self.percentage(base_index, next_index);
        let indexed_value = base_value.escalate(percentage, self.config.value_scale);

        Ok(IndexationResult {
            base_index_value: base_index.value(),
            next_index_value: next_index.value(),
            percentage,
            indexed_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ld(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reading(date: NaiveDate, value: Decimal) -> IndexValue {
        IndexValue::new("ISTAT-FOI", date, value).unwrap()
    }

    #[test]
    fn test_istat_indexation() {
        let calculator = IndexationCalculator::default();
        let base_period = DateInterval::month_of(ld(2013, 11, 1)).unwrap();
        let next_period = DateInterval::month_of(ld(2014, 12, 1)).unwrap();
        let base = reading(ld(2013, 11, 1), dec!(110));
        let next = reading(ld(2014, 12, 1), dec!(115));

        let result = calculator
            .calculate(
                "ISTAT-FOI",
                Money::from_major(150_000),
                (&base_period, Some(&base)),
                (&next_period, Some(&next)),
            )
            .unwrap();

        assert_eq!(result.percentage, Percentage::from_decimal(dec!(4.5)));
        assert_eq!(result.indexed_value, Money::from_str_exact("156750.00").unwrap());
    }

    #[test]
    fn test_unchanged_index_keeps_value() {
        let calculator = IndexationCalculator::default();
        let period = DateInterval::month_of(ld(2014, 1, 1)).unwrap();
        let same = reading(ld(2014, 1, 1), dec!(107.3));
        let value = Money::from_str_exact("98765.43").unwrap();

        let result = calculator
            .calculate("ISTAT-FOI", value, (&period, Some(&same)), (&period, Some(&same)))
            .unwrap();
        assert_eq!(result.percentage, Percentage::ZERO);
        assert_eq!(result.indexed_value, value);
    }

    #[test]
    fn test_deflation() {
        let calculator = IndexationCalculator::default();
        let period = DateInterval::month_of(ld(2014, 1, 1)).unwrap();
        let base = reading(ld(2014, 1, 1), dec!(100));
        let next = reading(ld(2015, 1, 1), dec!(98));

        let result = calculator
            .calculate("ISTAT-FOI", Money::from_major(1_000), (&period, Some(&base)), (&period, Some(&next)))
            .unwrap();
        assert_eq!(result.percentage, Percentage::from_decimal(dec!(-2.0)));
        assert_eq!(result.indexed_value, Money::from_major(980));
    }

    #[test]
    fn test_missing_value_is_recoverable() {
        let calculator = IndexationCalculator::default();
        let base_period = DateInterval::month_of(ld(2013, 11, 1)).unwrap();
        let next_period = DateInterval::month_of(ld(2014, 12, 1)).unwrap();
        let base = reading(ld(2013, 11, 1), dec!(110));

        let err = calculator
            .calculate(
                "ISTAT-FOI",
                Money::from_major(150_000),
                (&base_period, Some(&base)),
                (&next_period, None),
            )
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(
            err,
            LeaseError::MissingIndexValue {
                series: "ISTAT-FOI".to_string(),
                period: next_period,
            }
        );
    }

    #[test]
    fn test_configurable_scale() {
        let calculator = IndexationCalculator::new(IndexationConfig {
            percentage_scale: 2,
            value_scale: 2,
        });
        let base = reading(ld(2013, 11, 1), dec!(110));
        let next = reading(ld(2014, 12, 1), dec!(115));
        assert_eq!(calculator.percentage(&base, &next).as_decimal(), dec!(4.55));
    }
}
