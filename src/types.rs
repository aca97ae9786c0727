use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a lease item
pub type LeaseItemId = Uuid;

/// unique identifier for an invoice
pub type InvoiceId = Uuid;

/// unique identifier for an invoice item
pub type InvoiceItemId = Uuid;

/// lease item types, declared in invoice item order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeaseItemType {
    Rent,
    ServiceCharge,
    TurnoverRent,
    Discount,
}

/// invoice lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// calculated, still replaced by the next run
    New,
    /// numbered and counted as history
    Approved,
    /// sent out, terminal
    Invoiced,
    /// withdrawn, ignored by calculations
    Cancelled,
}

impl InvoiceStatus {
    /// statuses whose items count as already invoiced
    pub fn counts_as_history(&self) -> bool {
        matches!(self, InvoiceStatus::Approved | InvoiceStatus::Invoiced)
    }
}

/// invoice calculation run type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceRunType {
    /// invoice periods that were never invoiced
    NormalRun,
    /// reconcile every period up to the window end against history
    RetroRun,
}

/// which lease items a calculation run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceCalculationSelection {
    RentAndServiceCharge,
    Rent,
    ServiceCharge,
    TurnoverRent,
    AllItems,
}

impl InvoiceCalculationSelection {
    pub fn includes(&self, item_type: LeaseItemType) -> bool {
        match self {
            InvoiceCalculationSelection::RentAndServiceCharge => {
                matches!(item_type, LeaseItemType::Rent | LeaseItemType::ServiceCharge)
            }
            InvoiceCalculationSelection::Rent => item_type == LeaseItemType::Rent,
            InvoiceCalculationSelection::ServiceCharge => item_type == LeaseItemType::ServiceCharge,
            InvoiceCalculationSelection::TurnoverRent => item_type == LeaseItemType::TurnoverRent,
            InvoiceCalculationSelection::AllItems => true,
        }
    }
}

/// payment method agreed with the tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    DirectDebit,
    BankTransfer,
    Cheque,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_order() {
        let mut types = vec![
            LeaseItemType::TurnoverRent,
            LeaseItemType::ServiceCharge,
            LeaseItemType::Rent,
        ];
        types.sort();
        assert_eq!(
            types,
            vec![LeaseItemType::Rent, LeaseItemType::ServiceCharge, LeaseItemType::TurnoverRent]
        );
    }

    #[test]
    fn test_selection() {
        let selection = InvoiceCalculationSelection::RentAndServiceCharge;
        assert!(selection.includes(LeaseItemType::Rent));
        assert!(selection.includes(LeaseItemType::ServiceCharge));
        assert!(!selection.includes(LeaseItemType::TurnoverRent));
        assert!(InvoiceCalculationSelection::AllItems.includes(LeaseItemType::Discount));
    }

    #[test]
    fn test_history_statuses() {
        assert!(!InvoiceStatus::New.counts_as_history());
        assert!(InvoiceStatus::Approved.counts_as_history());
        assert!(InvoiceStatus::Invoiced.counts_as_history());
        assert!(!InvoiceStatus::Cancelled.counts_as_history());
    }
}
