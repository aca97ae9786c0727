pub mod numerator;
pub mod store;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LeaseError, Result};
use crate::interval::DateInterval;
use crate::lease::Lease;
use crate::types::{
    InvoiceId, InvoiceItemId, InvoiceRunType, InvoiceStatus, LeaseItemId, LeaseItemType, PaymentMethod,
};

pub use numerator::Numerator;
pub use store::{InvoiceStore, Invoices};

/// one calculated charge on an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: InvoiceItemId,
    pub lease_item_id: LeaseItemId,
    pub lease_item_type: LeaseItemType,
    pub lease_item_sequence: u32,
    /// start of the term the charge was calculated from
    pub lease_term_start: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub effective_interval: DateInterval,
    /// negative amounts are credits
    pub net_amount: Money,
    pub description: String,
    pub run_type: InvoiceRunType,
}

impl InvoiceItem {
    /// sort key: latest period first, then item type, then item sequence
    pub(crate) fn ordering_key(&self) -> (std::cmp::Reverse<Option<NaiveDate>>, LeaseItemType, u32) {
        (
            std::cmp::Reverse(self.effective_interval.start()),
            self.lease_item_type,
            self.lease_item_sequence,
        )
    }
}

/// invoice header data for a new invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub lease_reference: String,
    pub property_reference: String,
    pub seller: String,
    pub buyer: String,
    pub payment_method: PaymentMethod,
    pub currency: String,
    pub due_date: NaiveDate,
}

impl InvoiceDraft {
    pub fn for_lease(lease: &Lease, due_date: NaiveDate) -> Self {
        Self {
            lease_reference: lease.reference.clone(),
            property_reference: lease.property_reference.clone(),
            seller: lease.landlord.clone(),
            buyer: lease.tenant.clone(),
            payment_method: lease.payment_method,
            currency: lease.currency.clone(),
            due_date,
        }
    }

    /// same lease, parties, payment method and currency
    pub fn matches(&self, invoice: &Invoice) -> bool {
        invoice.lease_reference == self.lease_reference
            && invoice.seller == self.seller
            && invoice.buyer == self.buyer
            && invoice.payment_method == self.payment_method
            && invoice.currency == self.currency
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// creation order within the store
    pub sequence: u64,
    pub lease_reference: String,
    pub property_reference: String,
    pub seller: String,
    pub buyer: String,
    pub payment_method: PaymentMethod,
    pub currency: String,
    pub due_date: NaiveDate,
    // lifecycle state only changes through the store transitions
    invoice_date: Option<NaiveDate>,
    status: InvoiceStatus,
    temporary_number: String,
    invoice_number: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    invoiced_at: Option<DateTime<Utc>>,
    items: Vec<InvoiceItem>,
}

impl Invoice {
    pub(crate) fn new(draft: InvoiceDraft, sequence: u64, temporary_number: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            lease_reference: draft.lease_reference,
            property_reference: draft.property_reference,
            seller: draft.seller,
            buyer: draft.buyer,
            payment_method: draft.payment_method,
            currency: draft.currency,
            due_date: draft.due_date,
            invoice_date: None,
            status: InvoiceStatus::New,
            temporary_number,
            invoice_number: None,
            approved_at: None,
            invoiced_at: None,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn invoice_date(&self) -> Option<NaiveDate> {
        self.invoice_date
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn invoiced_at(&self) -> Option<DateTime<Utc>> {
        self.invoiced_at
    }

    /// permanent number once approved, the placeholder before
    pub fn number(&self) -> &str {
        self.invoice_number.as_deref().unwrap_or(&self.temporary_number)
    }

    pub fn total(&self) -> Money {
        self.items.iter().map(|i| i.net_amount).sum()
    }

    fn ensure_new(&self, action: &'static str) -> Result<()> {
        if self.status == InvoiceStatus::New {
            Ok(())
        } else {
            Err(LeaseError::IllegalStateTransition {
                invoice_id: self.id,
                status: self.status,
                action,
            })
        }
    }

    /// append items, keeping them ordered
    pub fn add_items(&mut self, items: impl IntoIterator<Item = InvoiceItem>) -> Result<()> {
        self.ensure_new("add items to")?;
        self.items.extend(items);
        self.items.sort_by_key(InvoiceItem::ordering_key);
        Ok(())
    }

    /// drop matching items of a NEW invoice, returns how many went
    pub(crate) fn remove_items(&mut self, predicate: impl Fn(&InvoiceItem) -> bool) -> Result<usize> {
        self.ensure_new("remove items from")?;
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        Ok(before - self.items.len())
    }

    pub(crate) fn mark_approved(&mut self, number: String, at: DateTime<Utc>) -> Result<()> {
        self.ensure_new("approve")?;
        self.status = InvoiceStatus::Approved;
        self.invoice_number = Some(number);
        self.approved_at = Some(at);
        Ok(())
    }

    pub(crate) fn mark_invoiced(&mut self, invoice_date: NaiveDate, at: DateTime<Utc>) -> Result<()> {
        if self.status != InvoiceStatus::Approved {
            return Err(LeaseError::IllegalStateTransition {
                invoice_id: self.id,
                status: self.status,
                action: "invoice",
            });
        }
        self.status = InvoiceStatus::Invoiced;
        self.invoice_date = Some(invoice_date);
        self.invoiced_at = Some(at);
        Ok(())
    }

    pub(crate) fn mark_cancelled(&mut self) -> Result<()> {
        match self.status {
            InvoiceStatus::New | InvoiceStatus::Approved => {
                self.status = InvoiceStatus::Cancelled;
                Ok(())
            }
            status => Err(LeaseError::IllegalStateTransition {
                invoice_id: self.id,
                status,
                action: "cancel",
            }),
        }
    }
}
