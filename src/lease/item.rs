use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LeaseError, Result};
use crate::index::{IndexValue, IndexValueRepository, IndexationCalculator};
use crate::interval::{add_months, first_of_month, next_day, previous_day, subtract_months, DateInterval};
use crate::lease::frequency::{IndexationFrequency, InvoicingFrequency};
use crate::lease::term::{Indexation, IndexationStatus, LeaseTerm, TermKind};
use crate::types::{LeaseItemId, LeaseItemType};

/// a chargeable component of a lease with its chain of terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseItem {
    pub id: LeaseItemId,
    pub lease_reference: String,
    pub item_type: LeaseItemType,
    /// position among the lease's items of the same type, starting at 1
    pub sequence: u32,
    /// charge reference, used as invoice item description
    pub charge: String,
    pub invoicing_frequency: InvoicingFrequency,
    pub indexation_frequency: IndexationFrequency,
    pub index_series: Option<String>,
    terms: Vec<LeaseTerm>,
}

/// result of (re)indexing one term
#[derive(Debug, Clone, PartialEq)]
pub struct TermIndexation {
    pub lease_item_id: LeaseItemId,
    pub term_sequence: u32,
    pub status: IndexationStatus,
    /// index window still waiting for a published value
    pub missing_period: Option<DateInterval>,
    /// whether the derived values differ from the previous verification
    pub changed: bool,
}

impl LeaseItem {
    pub(crate) fn new(
        lease_reference: &str,
        item_type: LeaseItemType,
        sequence: u32,
        charge: &str,
        invoicing_frequency: InvoicingFrequency,
        indexation_frequency: IndexationFrequency,
        index_series: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            lease_reference: lease_reference.to_string(),
            item_type,
            sequence,
            charge: charge.to_string(),
            invoicing_frequency,
            indexation_frequency,
            index_series,
            terms: Vec::new(),
        }
    }

    pub fn terms(&self) -> &[LeaseTerm] {
        &self.terms
    }

    pub fn first(&self) -> Option<&LeaseTerm> {
        self.terms.first()
    }

    pub fn last(&self) -> Option<&LeaseTerm> {
        self.terms.last()
    }

    pub fn term(&self, sequence: u32) -> Option<&LeaseTerm> {
        self.terms.iter().find(|t| t.sequence == sequence)
    }

    fn position(&self, sequence: u32) -> Option<usize> {
        self.terms.iter().position(|t| t.sequence == sequence)
    }

    /// term preceding the one with `sequence` in the chain
    pub fn previous(&self, sequence: u32) -> Option<&LeaseTerm> {
        let position = self.position(sequence)?;
        position.checked_sub(1).and_then(|p| self.terms.get(p))
    }

    /// term following the one with `sequence` in the chain
    pub fn next(&self, sequence: u32) -> Option<&LeaseTerm> {
        let position = self.position(sequence)?;
        self.terms.get(position + 1)
    }

    /// the term in force on `date`
    pub fn find_term(&self, date: NaiveDate) -> Result<Option<&LeaseTerm>> {
        let matches: Vec<&LeaseTerm> = self.terms.iter().filter(|t| t.interval().contains(date)).collect();
        match matches.as_slice() {
            [] => Ok(None),
            [term] => Ok(Some(*term)),
            _ => Err(LeaseError::DataIntegrity {
                context: format!("lease {} item {} on {}", self.lease_reference, self.charge, date),
                message: format!("{} terms in force, expected one", matches.len()),
            }),
        }
    }

    /// interval covered by the whole chain
    pub fn interval(&self) -> Option<DateInterval> {
        let first = self.first()?;
        let last = self.last()?;
        Some(DateInterval::new(Some(first.start_date), last.end_date))
    }

    fn next_term_sequence(&self) -> u32 {
        self.terms.iter().map(|t| t.sequence).max().unwrap_or(0) + 1
    }

    /// insert a term by start date, closing an open-ended predecessor; returns its sequence
    pub fn add_term(&mut self, mut term: LeaseTerm) -> Result<u32> {
        let requested = term.interval().validate()?;

        if matches!(term.kind, TermKind::Indexable(_)) && self.index_series.is_none() {
            return Err(LeaseError::validation(format!(
                "item {} has no index series, indexable terms are not allowed",
                self.charge
            )));
        }
        if self.terms.iter().any(|t| t.start_date == term.start_date) {
            return Err(LeaseError::validation(format!(
                "item {} already has a term starting {}",
                self.charge, term.start_date
            )));
        }

        let position = self.terms.iter().take_while(|t| t.start_date < term.start_date).count();

        if let Some(predecessor) = position.checked_sub(1).and_then(|p| self.terms.get(p)) {
            if let Some(end) = predecessor.end_date {
                if end >= term.start_date {
                    return Err(LeaseError::OverlappingInterval {
                        existing: predecessor.interval(),
                        requested,
                    });
                }
                if next_day(end)? != term.start_date {
                    return Err(LeaseError::validation(format!(
                        "gap between term ending {} and term starting {}",
                        end, term.start_date
                    )));
                }
            }
        }

        if let Some(successor) = self.terms.get(position) {
            match term.end_date {
                Some(end) if end < successor.start_date => {
                    if next_day(end)? != successor.start_date {
                        return Err(LeaseError::validation(format!(
                            "gap between term ending {} and term starting {}",
                            end, successor.start_date
                        )));
                    }
                }
                _ => {
                    return Err(LeaseError::OverlappingInterval {
                        existing: successor.interval(),
                        requested,
                    })
                }
            }
        }

        let closing_end = previous_day(term.start_date)?;
        if let Some(predecessor) = position.checked_sub(1).and_then(|p| self.terms.get_mut(p)) {
            if predecessor.end_date.is_none() {
                predecessor.end_date = Some(closing_end);
            }
        }

        term.sequence = self.next_term_sequence();
        let sequence = term.sequence;
        self.terms.insert(position, term);
        Ok(sequence)
    }

    /// roll the chain forward until `horizon`, never past `lease_interval`; returns new sequences
    pub(crate) fn generate_terms(&mut self, horizon: NaiveDate, lease_interval: &DateInterval) -> Result<Vec<u32>> {
        let mut created = Vec::new();

        loop {
            let last = match self.terms.last() {
                Some(last) => last,
                None => break,
            };
            let next_start = match last.end_date {
                Some(end) => next_day(end)?,
                None => match self.indexation_frequency.next_date(last.start_date)? {
                    Some(date) => date,
                    None => break,
                },
            };
            if next_start > horizon || !lease_interval.contains(next_start) {
                break;
            }
            if self.indexation_frequency == IndexationFrequency::Never && last.end_date.is_some() {
                // the chain was closed by hand
                break;
            }

            let successor = self.successor_of(last, next_start)?;
            created.push(self.add_term(successor)?);
        }

        Ok(created)
    }

    fn successor_of(&self, previous: &LeaseTerm, start_date: NaiveDate) -> Result<LeaseTerm> {
        match &previous.kind {
            TermKind::Fixed => Ok(LeaseTerm::fixed(start_date, None, previous.value)),
            TermKind::Indexable(indexation) => {
                let base_period = indexation
                    .next_index_period()
                    .unwrap_or_else(|| indexation.base_index_period());
                let next_period = match indexation.next_index_period() {
                    Some(period) => self.shift_index_period(&period)?,
                    None => DateInterval::month_of(subtract_months(first_of_month(start_date), 1)?)?,
                };

                let next = Indexation {
                    base_index_start_date: required_bound(base_period.start(), &base_period)?,
                    base_index_end_date: required_bound(base_period.end(), &base_period)?,
                    next_index_start_date: next_period.start(),
                    next_index_end_date: next_period.end(),
                    indexation_application_date: Some(start_date),
                    base_index_value: None,
                    next_index_value: None,
                    indexation_percentage: None,
                    indexed_value: None,
                };
                Ok(LeaseTerm::indexable(start_date, None, previous.effective_value(), next))
            }
        }
    }

    fn shift_index_period(&self, period: &DateInterval) -> Result<DateInterval> {
        let months = self.indexation_frequency.months().unwrap_or(12);
        let start = add_months(required_bound(period.start(), period)?, months)?;
        let end = previous_day(add_months(next_day(required_bound(period.end(), period)?)?, months)?)?;
        Ok(DateInterval::closed(start, end))
    }

    /// reindex every indexable term in chain order
    pub(crate) fn index_terms(
        &mut self,
        indices: &impl IndexValueRepository,
        calculator: &IndexationCalculator,
    ) -> Result<Vec<TermIndexation>> {
        let mut outcomes = Vec::new();
        let series = self.index_series.clone();
        let item_context = format!("lease {} item {}", self.lease_reference, self.charge);

        for position in 0..self.terms.len() {
            let inherited: Option<Money> = position
                .checked_sub(1)
                .and_then(|p| self.terms.get(p))
                .map(|previous| previous.effective_value());

            let lease_item_id = self.id;
            let term = &mut self.terms[position];
            let term_sequence = term.sequence;
            let term_start = term.start_date;
            if let Some(value) = inherited {
                if term.indexation().is_some() {
                    term.value = value;
                }
            }
            let base_value = term.value;
            let indexation = match term.indexation_mut() {
                Some(indexation) => indexation,
                None => continue,
            };

            let before = indexation.clone();
            indexation.reset();

            let (next_period, series) = match (indexation.next_index_period(), series.as_deref()) {
                (Some(period), Some(series)) => (period, series),
                _ => {
                    outcomes.push(TermIndexation {
                        lease_item_id,
                        term_sequence,
                        status: indexation.status(),
                        missing_period: None,
                        changed: before != *indexation,
                    });
                    continue;
                }
            };
            let base_period = indexation.base_index_period();

            let lookup = |period: &DateInterval| {
                indices.find(series, period).map_err(|e| match e {
                    LeaseError::DataIntegrity { context, message } => LeaseError::DataIntegrity {
                        context: format!("{} term starting {}, {}", item_context, term_start, context),
                        message,
                    },
                    other => other,
                })
            };
            let base_index = lookup(&base_period)?;
            let next_index = lookup(&next_period)?;
            indexation.base_index_value = base_index.as_ref().map(IndexValue::value);
            indexation.next_index_value = next_index.as_ref().map(IndexValue::value);

            let missing_period = match calculator.calculate(
                series,
                base_value,
                (&base_period, base_index.as_ref()),
                (&next_period, next_index.as_ref()),
            ) {
                Ok(result) => {
                    indexation.indexation_percentage = Some(result.percentage);
                    indexation.indexed_value = Some(result.indexed_value);
                    None
                }
                Err(LeaseError::MissingIndexValue { period, .. }) => Some(period),
                Err(e) => return Err(e),
            };

            outcomes.push(TermIndexation {
                lease_item_id,
                term_sequence,
                status: indexation.status(),
                missing_period,
                changed: before != *indexation,
            });
        }

        Ok(outcomes)
    }
}

fn required_bound(bound: Option<NaiveDate>, period: &DateInterval) -> Result<NaiveDate> {
    bound.ok_or(LeaseError::InvalidInterval { interval: *period })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Percentage;
    use crate::index::IndexValues;
    use rust_decimal_macros::dec;

    fn ld(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rent_item() -> LeaseItem {
        LeaseItem::new(
            "OXF-MIRACL-005",
            LeaseItemType::Rent,
            1,
            "ITA_RENT",
            InvoicingFrequency::QuarterlyInAdvance,
            IndexationFrequency::CalendarYear,
            Some("ISTAT-FOI".to_string()),
        )
    }

    fn first_rent_term() -> LeaseTerm {
        LeaseTerm::indexable(
            ld(2013, 11, 7),
            Some(ld(2014, 12, 31)),
            Money::from_major(150_000),
            Indexation::monthly(ld(2013, 11, 1), None).unwrap(),
        )
    }

    #[test]
    fn test_add_term_closes_open_predecessor() {
        let mut item = rent_item();
        item.add_term(LeaseTerm::fixed(ld(2013, 11, 7), None, Money::from_major(12_400))).unwrap();
        let second = item.add_term(LeaseTerm::fixed(ld(2014, 1, 1), None, Money::from_major(13_000))).unwrap();

        assert_eq!(second, 2);
        assert_eq!(item.first().unwrap().end_date, Some(ld(2013, 12, 31)));
        assert!(item.last().unwrap().is_open_ended());
        assert_eq!(item.previous(2).unwrap().sequence, 1);
        assert_eq!(item.next(1).unwrap().sequence, 2);
        assert!(item.next(2).is_none());
        assert!(item.previous(1).is_none());
    }

    #[test]
    fn test_add_term_rejects_overlap_and_gap() {
        let mut item = rent_item();
        item.add_term(LeaseTerm::fixed(ld(2014, 1, 1), Some(ld(2014, 12, 31)), Money::from_major(1))).unwrap();

        let overlap = item
            .add_term(LeaseTerm::fixed(ld(2014, 6, 1), None, Money::from_major(1)))
            .unwrap_err();
        assert!(matches!(overlap, LeaseError::OverlappingInterval { .. }));

        let gap = item
            .add_term(LeaseTerm::fixed(ld(2015, 2, 1), None, Money::from_major(1)))
            .unwrap_err();
        assert!(matches!(gap, LeaseError::Validation { .. }));

        let duplicate = item
            .add_term(LeaseTerm::fixed(ld(2014, 1, 1), None, Money::from_major(1)))
            .unwrap_err();
        assert!(matches!(duplicate, LeaseError::Validation { .. }));

        // an open-ended term cannot precede an existing one
        let before = item
            .add_term(LeaseTerm::fixed(ld(2013, 1, 1), None, Money::from_major(1)))
            .unwrap_err();
        assert!(matches!(before, LeaseError::OverlappingInterval { .. }));

        item.add_term(LeaseTerm::fixed(ld(2013, 1, 1), Some(ld(2013, 12, 31)), Money::from_major(1))).unwrap();
        assert_eq!(item.first().unwrap().start_date, ld(2013, 1, 1));
        assert_eq!(item.terms().len(), 2);
    }

    #[test]
    fn test_add_term_rejects_invalid_interval() {
        let mut item = rent_item();
        let err = item
            .add_term(LeaseTerm::fixed(ld(2014, 2, 1), Some(ld(2014, 1, 1)), Money::from_major(1)))
            .unwrap_err();
        assert!(matches!(err, LeaseError::InvalidInterval { .. }));
        assert!(item.terms().is_empty());
    }

    #[test]
    fn test_indexable_term_requires_series() {
        let mut item = rent_item();
        item.index_series = None;
        let err = item.add_term(first_rent_term()).unwrap_err();
        assert!(matches!(err, LeaseError::Validation { .. }));
    }

    #[test]
    fn test_find_term() {
        let mut item = rent_item();
        item.add_term(first_rent_term()).unwrap();
        assert_eq!(item.find_term(ld(2014, 7, 1)).unwrap().unwrap().sequence, 1);
        assert!(item.find_term(ld(2015, 1, 1)).unwrap().is_none());
        assert!(item.find_term(ld(2013, 11, 6)).unwrap().is_none());
    }

    #[test]
    fn test_generated_term_windows() {
        let mut item = rent_item();
        item.add_term(first_rent_term()).unwrap();

        let created = item
            .generate_terms(ld(2016, 3, 31), &DateInterval::starting(ld(2013, 11, 7)))
            .unwrap();
        assert_eq!(created, vec![2, 3]);

        let second = item.term(2).unwrap();
        assert_eq!(second.start_date, ld(2015, 1, 1));
        assert_eq!(second.end_date, Some(ld(2015, 12, 31)));
        let indexation = second.indexation().unwrap();
        assert_eq!(indexation.base_index_period(), DateInterval::month_of(ld(2013, 11, 1)).unwrap());
        assert_eq!(indexation.next_index_period(), Some(DateInterval::month_of(ld(2014, 12, 1)).unwrap()));
        assert_eq!(indexation.indexation_application_date, Some(ld(2015, 1, 1)));

        let third = item.term(3).unwrap();
        assert!(third.is_open_ended());
        let indexation = third.indexation().unwrap();
        assert_eq!(indexation.base_index_period(), DateInterval::month_of(ld(2014, 12, 1)).unwrap());
        assert_eq!(indexation.next_index_period(), Some(DateInterval::month_of(ld(2015, 12, 1)).unwrap()));
    }

    #[test]
    fn test_generation_stops_at_lease_end() {
        let mut item = rent_item();
        item.add_term(first_rent_term()).unwrap();
        let created = item
            .generate_terms(ld(2016, 3, 31), &DateInterval::closed(ld(2013, 11, 7), ld(2014, 6, 30)))
            .unwrap();
        assert!(created.is_empty());
        assert_eq!(item.terms().len(), 1);
    }

    #[test]
    fn test_never_frequency_generates_nothing() {
        let mut item = LeaseItem::new(
            "OXF-MIRACL-005",
            LeaseItemType::ServiceCharge,
            1,
            "ITA_SERVICE_CHARGE",
            InvoicingFrequency::QuarterlyInAdvance,
            IndexationFrequency::Never,
            None,
        );
        item.add_term(LeaseTerm::fixed(ld(2014, 1, 1), None, Money::from_major(13_000))).unwrap();
        let created = item.generate_terms(ld(2020, 1, 1), &DateInterval::unbounded()).unwrap();
        assert!(created.is_empty());
    }

    #[test]
    fn test_index_terms_applies_and_reinherits() {
        let mut item = rent_item();
        item.add_term(first_rent_term()).unwrap();
        item.generate_terms(ld(2015, 4, 1), &DateInterval::starting(ld(2013, 11, 7))).unwrap();

        let mut indices = IndexValues::new();
        indices.new_index_value("ISTAT-FOI", ld(2013, 11, 1), dec!(110)).unwrap();

        let calculator = IndexationCalculator::default();
        let outcomes = item.index_terms(&indices, &calculator).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status, IndexationStatus::NotApplicable);
        assert_eq!(outcomes[1].status, IndexationStatus::Pending);
        assert_eq!(outcomes[1].missing_period, Some(DateInterval::month_of(ld(2014, 12, 1)).unwrap()));
        assert_eq!(item.term(2).unwrap().effective_value(), Money::from_major(150_000));

        indices.new_index_value("ISTAT-FOI", ld(2014, 12, 1), dec!(115)).unwrap();
        let outcomes = item.index_terms(&indices, &calculator).unwrap();
        assert!(outcomes[1].changed);
        assert_eq!(
            outcomes[1].status,
            IndexationStatus::Applied {
                percentage: Percentage::from_decimal(dec!(4.5)),
                indexed_value: Money::from_major(156_750),
            }
        );

        // unchanged data leaves the chain as it was
        let again = item.index_terms(&indices, &calculator).unwrap();
        assert!(!again[1].changed);

        // a changed first term flows into its successor
        item.terms[0].value = Money::from_major(160_000);
        item.index_terms(&indices, &calculator).unwrap();
        assert_eq!(item.term(2).unwrap().value, Money::from_major(160_000));
        assert_eq!(item.term(2).unwrap().effective_value(), Money::from_major(167_200));
    }

    #[test]
    fn test_ambiguous_index_lookup_names_the_term() {
        // two readings published for the same month
        struct Republished(Vec<IndexValue>);
        impl IndexValueRepository for Republished {
            fn find(&self, series: &str, period: &DateInterval) -> Result<Option<IndexValue>> {
                let matches: Vec<&IndexValue> = self
                    .0
                    .iter()
                    .filter(|v| v.series() == series && period.contains(v.date()))
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

        let mut item = rent_item();
        item.add_term(first_rent_term()).unwrap();
        item.generate_terms(ld(2015, 4, 1), &DateInterval::starting(ld(2013, 11, 7))).unwrap();
        let indices = Republished(vec![
            IndexValue::new("ISTAT-FOI", ld(2013, 11, 1), dec!(110)).unwrap(),
            IndexValue::new("ISTAT-FOI", ld(2013, 11, 20), dec!(110.4)).unwrap(),
        ]);

        let err = item.index_terms(&indices, &IndexationCalculator::default()).unwrap_err();
        match err {
            LeaseError::DataIntegrity { context, message } => {
                assert!(context.contains("lease OXF-MIRACL-005 item ITA_RENT"));
                assert!(context.contains("term starting 2015-01-01"));
                assert!(context.contains("index ISTAT-FOI"));
                assert_eq!(message, "2 values found, expected one");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
