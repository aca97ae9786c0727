use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LeaseError, Result};
use crate::interval::DateInterval;

/// service charge budget of a property over an interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub property_reference: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Budget {
    pub fn interval(&self) -> DateInterval {
        DateInterval::new(Some(self.start_date), self.end_date)
    }
}

/// in-memory budget repository
#[derive(Debug, Clone, Default)]
pub struct Budgets {
    budgets: Vec<Budget>,
}

impl Budgets {
    pub fn new() -> Self {
        Self { budgets: Vec::new() }
    }

    /// budgets of one property may not overlap
    pub fn new_budget(
        &mut self,
        property_reference: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<&Budget> {
        let requested = DateInterval::new(Some(start_date), end_date).validate()?;
        if let Some(existing) = self
            .find_by_property(property_reference)
            .into_iter()
            .find(|b| b.interval().overlaps(&requested))
        {
            return Err(LeaseError::OverlappingInterval {
                existing: existing.interval(),
                requested,
            });
        }

        self.budgets.push(Budget {
            id: Uuid::new_v4(),
            property_reference: property_reference.to_string(),
            start_date,
            end_date,
        });
        Ok(&self.budgets[self.budgets.len() - 1])
    }

    /// the budget starting on `start_date`, created when missing
    pub fn find_or_create_budget(
        &mut self,
        property_reference: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<&Budget> {
        match self
            .budgets
            .iter()
            .position(|b| b.property_reference == property_reference && b.start_date == start_date)
        {
            Some(position) => Ok(&self.budgets[position]),
            None => self.new_budget(property_reference, start_date, end_date),
        }
    }

    pub fn find_by_property(&self, property_reference: &str) -> Vec<&Budget> {
        self.budgets
            .iter()
            .filter(|b| b.property_reference == property_reference)
            .collect()
    }

    pub fn find_by_property_and_start_date(&self, property_reference: &str, start_date: NaiveDate) -> Option<&Budget> {
        self.budgets
            .iter()
            .find(|b| b.property_reference == property_reference && b.start_date == start_date)
    }

    pub fn all_budgets(&self) -> &[Budget] {
        &self.budgets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ld(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_overlapping_budget_rejected() {
        let mut budgets = Budgets::new();
        budgets.new_budget("OXF", ld(2015, 1, 1), Some(ld(2015, 12, 31))).unwrap();

        let err = budgets.new_budget("OXF", ld(2015, 6, 1), Some(ld(2016, 5, 31))).unwrap_err();
        assert!(matches!(err, LeaseError::OverlappingInterval { .. }));

        // another property is unaffected
        budgets.new_budget("KAL", ld(2015, 6, 1), Some(ld(2016, 5, 31))).unwrap();
        budgets.new_budget("OXF", ld(2016, 1, 1), None).unwrap();
        assert_eq!(budgets.find_by_property("OXF").len(), 2);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let mut budgets = Budgets::new();
        let err = budgets.new_budget("OXF", ld(2015, 12, 31), Some(ld(2015, 1, 1))).unwrap_err();
        assert!(matches!(err, LeaseError::InvalidInterval { .. }));
        assert!(budgets.all_budgets().is_empty());
    }

    #[test]
    fn test_find_or_create() {
        let mut budgets = Budgets::new();
        let id = budgets.find_or_create_budget("OXF", ld(2015, 1, 1), Some(ld(2015, 12, 31))).unwrap().id;
        let again = budgets.find_or_create_budget("OXF", ld(2015, 1, 1), Some(ld(2015, 12, 31))).unwrap().id;
        assert_eq!(id, again);
        assert_eq!(budgets.all_budgets().len(), 1);
        assert_eq!(budgets.find_by_property_and_start_date("OXF", ld(2015, 1, 1)).unwrap().id, id);
        assert!(budgets.find_by_property_and_start_date("OXF", ld(2016, 1, 1)).is_none());
    }
}
