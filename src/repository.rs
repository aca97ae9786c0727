use tracing::debug;

use crate::errors::{LeaseError, Result};
use crate::lease::Lease;

/// lookup of leases by reference
pub trait LeaseRepository {
    fn find_by_reference(&self, reference: &str) -> Result<&Lease>;

    fn find_by_reference_mut(&mut self, reference: &str) -> Result<&mut Lease>;
}

/// in-memory lease repository
#[derive(Debug, Clone, Default)]
pub struct Leases {
    leases: Vec<Lease>,
}

impl Leases {
    pub fn new() -> Self {
        Self { leases: Vec::new() }
    }

    /// Store a lease. References are unique and leases on the same unit
    /// may not overlap.
    pub fn add(&mut self, lease: Lease) -> Result<&mut Lease> {
        if self.leases.iter().any(|l| l.reference == lease.reference) {
            return Err(LeaseError::validation(format!(
                "lease reference {} already exists",
                lease.reference
            )));
        }
        if let Some(existing) = self
            .leases
            .iter()
            .find(|l| l.unit_reference == lease.unit_reference && l.interval().overlaps(&lease.interval()))
        {
            return Err(LeaseError::OverlappingInterval {
                existing: existing.interval(),
                requested: lease.interval(),
            });
        }

        debug!(lease = %lease.reference, unit = %lease.unit_reference, "lease added");
        self.leases.push(lease);
        let last = self.leases.len() - 1;
        Ok(&mut self.leases[last])
    }

    pub fn find_by_property(&self, property_reference: &str) -> Vec<&Lease> {
        self.leases
            .iter()
            .filter(|l| l.property_reference == property_reference)
            .collect()
    }

    pub fn all_leases(&self) -> &[Lease] {
        &self.leases
    }
}

impl LeaseRepository for Leases {
    fn find_by_reference(&self, reference: &str) -> Result<&Lease> {
        self.leases
            .iter()
            .find(|l| l.reference == reference)
            .ok_or_else(|| LeaseError::LeaseNotFound {
                reference: reference.to_string(),
            })
    }

    fn find_by_reference_mut(&mut self, reference: &str) -> Result<&mut Lease> {
        self.leases
            .iter_mut()
            .find(|l| l.reference == reference)
            .ok_or_else(|| LeaseError::LeaseNotFound {
                reference: reference.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ld(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lease(reference: &str, unit: &str, start: NaiveDate, end: Option<NaiveDate>) -> Lease {
        let mut builder = Lease::builder(reference)
            .property("OXF")
            .unit(unit)
            .landlord("HELLOWORLD")
            .tenant("MIRACLE")
            .start_date(start);
        if let Some(end) = end {
            builder = builder.end_date(end);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_find_by_reference() {
        let mut leases = Leases::new();
        leases.add(lease("OXF-MIRACL-005", "OXF-005", ld(2013, 11, 7), None)).unwrap();

        assert_eq!(leases.find_by_reference("OXF-MIRACL-005").unwrap().unit_reference, "OXF-005");
        let err = leases.find_by_reference("OXF-POISON-003").unwrap_err();
        assert!(matches!(err, LeaseError::LeaseNotFound { .. }));

        leases
            .find_by_reference_mut("OXF-MIRACL-005")
            .unwrap()
            .name = "Miracle".to_string();
        assert_eq!(leases.find_by_property("OXF")[0].name, "Miracle");
    }

    #[test]
    fn test_duplicate_reference_rejected() {
        let mut leases = Leases::new();
        leases.add(lease("OXF-MIRACL-005", "OXF-005", ld(2013, 11, 7), None)).unwrap();
        let err = leases.add(lease("OXF-MIRACL-005", "OXF-006", ld(2013, 11, 7), None)).unwrap_err();
        assert!(matches!(err, LeaseError::Validation { .. }));
    }

    #[test]
    fn test_overlapping_leases_on_unit_rejected() {
        let mut leases = Leases::new();
        leases
            .add(lease("OXF-TOPMODEL-001", "OXF-001", ld(2010, 7, 15), Some(ld(2022, 7, 14))))
            .unwrap();

        let err = leases
            .add(lease("OXF-MEDIAX-002", "OXF-001", ld(2022, 7, 14), None))
            .unwrap_err();
        assert!(matches!(err, LeaseError::OverlappingInterval { .. }));

        leases.add(lease("OXF-MEDIAX-002", "OXF-001", ld(2022, 7, 15), None)).unwrap();
        leases.add(lease("OXF-POISON-003", "OXF-003", ld(2011, 1, 1), None)).unwrap();
        assert_eq!(leases.all_leases().len(), 3);
    }
}
