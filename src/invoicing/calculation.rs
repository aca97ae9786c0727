use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::errors::{LeaseError, Result};
use crate::interval::DateInterval;
use crate::lease::{InvoicingPeriod, LeaseItem};

/// amount of one lease item for one invoicing period
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodCalculation {
    pub period: InvoicingPeriod,
    /// span of the charged days, the full period when nothing is charged
    pub effective_interval: DateInterval,
    pub amount: Money,
    pub lease_term_start: Option<NaiveDate>,
}

/// Prorate the item's annual values over `period`.
///
/// Each term segment contributes `value * days / (periods_per_year * period_days)`
/// for the days it shares with the period and `lease_interval`; the sum is
/// rounded once.
pub fn calculate_period(
    item: &LeaseItem,
    period: &InvoicingPeriod,
    lease_interval: &DateInterval,
) -> Result<PeriodCalculation> {
    let period_days = period.interval.days().ok_or_else(|| LeaseError::DataIntegrity {
        context: format!("lease {} item {}", item.lease_reference, item.charge),
        message: format!("invoicing period {} is unbounded", period.interval),
    })?;
    let denominator = Decimal::from(item.invoicing_frequency.periods_per_year()) * Decimal::from(period_days);

    let chargeable = match period.interval.intersection(lease_interval) {
        Some(chargeable) => chargeable,
        None => return Ok(nothing_charged(period)),
    };

    let mut total = Decimal::ZERO;
    let mut charged: Option<(NaiveDate, NaiveDate)> = None;
    let mut lease_term_start = None;

    for term in item.terms() {
        for (segment, value) in term.value_segments()? {
            let overlap = match segment.intersection(&chargeable) {
                Some(overlap) => overlap,
                None => continue,
            };
            let (start, end, days) = match (overlap.start(), overlap.end(), overlap.days()) {
                (Some(start), Some(end), Some(days)) => (start, end, days),
                _ => continue,
            };

            total += value.as_decimal() * Decimal::from(days) / denominator;
            charged = Some(match charged {
                Some((first, last)) => (first.min(start), last.max(end)),
                None => (start, end),
            });
            if lease_term_start.is_none() {
                lease_term_start = Some(term.start_date);
            }
        }
    }

    Ok(match charged {
        Some((start, end)) => PeriodCalculation {
            period: *period,
            effective_interval: DateInterval::closed(start, end),
            amount: Money::from_decimal(total),
            lease_term_start,
        },
        None => nothing_charged(period),
    })
}

fn nothing_charged(period: &InvoicingPeriod) -> PeriodCalculation {
    PeriodCalculation {
        period: *period,
        effective_interval: period.interval,
        amount: Money::ZERO,
        lease_term_start: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeaseItemConfig;
    use crate::lease::{Indexation, Lease, LeaseTerm};
    use crate::types::LeaseItemId;

    fn ld(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quarter(start: NaiveDate, end: NaiveDate) -> InvoicingPeriod {
        InvoicingPeriod {
            interval: DateInterval::closed(start, end),
            due_date: start,
        }
    }

    fn lease() -> (Lease, LeaseItemId, LeaseItemId) {
        let mut lease = Lease::builder("OXF-MIRACL-005")
            .property("OXF")
            .unit("OXF-005")
            .landlord("HELLOWORLD")
            .tenant("MIRACLE")
            .start_date(ld(2013, 11, 7))
            .build()
            .unwrap();
        let rent = lease.new_item(LeaseItemConfig::rent("ITA_RENT", "ISTAT-FOI")).unwrap();
        lease
            .add_term(
                rent,
                LeaseTerm::indexable(
                    ld(2013, 11, 7),
                    Some(ld(2014, 12, 31)),
                    Money::from_major(150_000),
                    Indexation::monthly(ld(2013, 11, 1), None).unwrap(),
                ),
            )
            .unwrap();
        let sc = lease.new_item(LeaseItemConfig::service_charge("ITA_SERVICE_CHARGE")).unwrap();
        lease
            .add_term(sc, LeaseTerm::fixed(ld(2013, 11, 7), None, Money::from_major(12_400)))
            .unwrap();
        lease
            .add_term(sc, LeaseTerm::fixed(ld(2014, 1, 1), None, Money::from_major(13_000)))
            .unwrap();
        (lease, rent, sc)
    }

    #[test]
    fn test_first_partial_quarter() {
        let (lease, rent, sc) = lease();
        let q4 = quarter(ld(2013, 10, 1), ld(2013, 12, 31));

        let rent_q4 = calculate_period(lease.item(rent).unwrap(), &q4, &lease.effective_interval()).unwrap();
        assert_eq!(rent_q4.amount, Money::from_str_exact("22418.48").unwrap());
        assert_eq!(rent_q4.effective_interval, DateInterval::closed(ld(2013, 11, 7), ld(2013, 12, 31)));
        assert_eq!(rent_q4.lease_term_start, Some(ld(2013, 11, 7)));

        let sc_q4 = calculate_period(lease.item(sc).unwrap(), &q4, &lease.effective_interval()).unwrap();
        assert_eq!(sc_q4.amount, Money::from_str_exact("1853.26").unwrap());
    }

    #[test]
    fn test_full_quarter() {
        let (lease, rent, sc) = lease();
        let q1 = quarter(ld(2014, 1, 1), ld(2014, 3, 31));
        let interval = lease.effective_interval();

        assert_eq!(calculate_period(lease.item(rent).unwrap(), &q1, &interval).unwrap().amount, Money::from_major(37_500));
        assert_eq!(calculate_period(lease.item(sc).unwrap(), &q1, &interval).unwrap().amount, Money::from_major(3_250));
    }

    #[test]
    fn test_termination_clips_period() {
        let (lease, rent, _) = lease();
        let q3 = quarter(ld(2014, 7, 1), ld(2014, 9, 30));
        let terminated = DateInterval::closed(ld(2013, 11, 7), ld(2014, 7, 31));

        let calc = calculate_period(lease.item(rent).unwrap(), &q3, &terminated).unwrap();
        assert_eq!(calc.amount, Money::from_str_exact("12635.87").unwrap());
        assert_eq!(calc.effective_interval, DateInterval::closed(ld(2014, 7, 1), ld(2014, 7, 31)));
    }

    #[test]
    fn test_nothing_charged_keeps_full_period() {
        let (lease, rent, _) = lease();
        let q4 = quarter(ld(2014, 10, 1), ld(2014, 12, 31));
        let terminated = DateInterval::closed(ld(2013, 11, 7), ld(2014, 6, 30));

        let calc = calculate_period(lease.item(rent).unwrap(), &q4, &terminated).unwrap();
        assert!(calc.amount.is_zero());
        assert_eq!(calc.effective_interval, q4.interval);

        // past the last term
        let q1 = quarter(ld(2015, 1, 1), ld(2015, 3, 31));
        let calc = calculate_period(lease.item(rent).unwrap(), &q1, &lease.effective_interval()).unwrap();
        assert!(calc.amount.is_zero());
    }
}
