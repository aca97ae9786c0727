use std::collections::HashMap;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::info;

use crate::config::{EngineConfig, InvoicingConfig};
use crate::errors::{LeaseError, Result};
use crate::invoice::{Invoice, InvoiceDraft, InvoiceItem, Numerator};
use crate::types::{InvoiceId, InvoiceStatus, LeaseItemId};

/// storage of invoices and their numbering
pub trait InvoiceStore {
    fn create_invoice(&mut self, draft: InvoiceDraft) -> Result<&mut Invoice>;

    /// invoices of a lease in creation order
    fn find_invoices(&self, lease_reference: &str) -> Vec<&Invoice>;

    fn invoice(&self, id: InvoiceId) -> Result<&Invoice>;

    fn invoice_mut(&mut self, id: InvoiceId) -> Result<&mut Invoice>;

    fn remove_invoice(&mut self, id: InvoiceId) -> Result<Invoice>;

    /// next permanent number of the property's numerator
    fn next_number(&mut self, property_reference: &str) -> Result<String>;

    /// latest NEW invoice accepting items for `draft`
    fn find_open_invoice(&self, draft: &InvoiceDraft) -> Option<InvoiceId> {
        self.find_invoices(&draft.lease_reference)
            .into_iter()
            .filter(|i| i.status() == InvoiceStatus::New && draft.matches(i))
            .max_by_key(|i| i.sequence)
            .map(|i| i.id)
    }

    /// approved and invoiced items of a lease item
    fn history_for(&self, lease_reference: &str, lease_item_id: LeaseItemId) -> Vec<InvoiceItem> {
        self.find_invoices(lease_reference)
            .into_iter()
            .filter(|i| i.status().counts_as_history())
            .flat_map(|i| i.items().iter())
            .filter(|item| item.lease_item_id == lease_item_id)
            .cloned()
            .collect()
    }

    /// Drop matching items from the lease's NEW invoices and remove the
    /// invoices left empty. Returns the number of items removed.
    fn remove_new_items<F>(&mut self, lease_reference: &str, predicate: F) -> Result<usize>
    where
        F: Fn(&InvoiceItem) -> bool,
    {
        let open: Vec<InvoiceId> = self
            .find_invoices(lease_reference)
            .into_iter()
            .filter(|i| i.status() == InvoiceStatus::New)
            .map(|i| i.id)
            .collect();

        let mut removed = 0;
        for id in open {
            let invoice = self.invoice_mut(id)?;
            let count = invoice.remove_items(&predicate)?;
            removed += count;
            if count > 0 && invoice.items().is_empty() {
                self.remove_invoice(id)?;
            }
        }
        Ok(removed)
    }

    /// NEW -> APPROVED, assigning the permanent number; approving twice is a no-op
    fn approve(&mut self, id: InvoiceId, time_provider: &SafeTimeProvider) -> Result<&Invoice> {
        let invoice = self.invoice(id)?;
        match invoice.status() {
            InvoiceStatus::Approved => {}
            InvoiceStatus::New => {
                let property_reference = invoice.property_reference.clone();
                let number = self.next_number(&property_reference)?;
                self.invoice_mut(id)?.mark_approved(number, time_provider.now())?;
                let invoice = self.invoice(id)?;
                info!(invoice = %invoice.number(), lease = %invoice.lease_reference, "invoice approved");
            }
            status => {
                return Err(LeaseError::IllegalStateTransition {
                    invoice_id: id,
                    status,
                    action: "approve",
                })
            }
        }
        self.invoice(id)
    }

    /// APPROVED -> INVOICED
    fn invoice_on(&mut self, id: InvoiceId, invoice_date: NaiveDate, time_provider: &SafeTimeProvider) -> Result<&Invoice> {
        self.invoice_mut(id)?.mark_invoiced(invoice_date, time_provider.now())?;
        self.invoice(id)
    }

    /// NEW or APPROVED -> CANCELLED
    fn cancel(&mut self, id: InvoiceId) -> Result<&Invoice> {
        self.invoice_mut(id)?.mark_cancelled()?;
        self.invoice(id)
    }
}

/// in-memory invoice store
#[derive(Debug, Clone, Default)]
pub struct Invoices {
    invoices: Vec<Invoice>,
    numerators: HashMap<String, Numerator>,
    last_sequence: u64,
    config: InvoicingConfig,
}

impl Invoices {
    pub fn new() -> Self {
        Self::default()
    }

    /// store numbering placeholders with the engine's invoicing settings
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            config: config.invoicing.clone(),
            ..Self::default()
        }
    }

    /// register the numerator used when approving invoices of a property
    pub fn create_invoice_number_numerator(
        &mut self,
        property_reference: &str,
        format: &str,
        last_increment: u64,
    ) -> Result<&Numerator> {
        if self.numerators.contains_key(property_reference) {
            return Err(LeaseError::validation(format!(
                "property {} already has an invoice numerator",
                property_reference
            )));
        }
        let numerator = Numerator::new(property_reference, format, last_increment)?;
        Ok(self
            .numerators
            .entry(property_reference.to_string())
            .or_insert(numerator))
    }

    pub fn numerator(&self, property_reference: &str) -> Option<&Numerator> {
        self.numerators.get(property_reference)
    }

    pub fn all_invoices(&self) -> &[Invoice] {
        &self.invoices
    }
}

impl InvoiceStore for Invoices {
    fn create_invoice(&mut self, draft: InvoiceDraft) -> Result<&mut Invoice> {
        self.last_sequence += 1;
        let temporary_number = self.config.temporary_number(self.last_sequence);
        self.invoices.push(Invoice::new(draft, self.last_sequence, temporary_number));
        let last = self.invoices.len() - 1;
        Ok(&mut self.invoices[last])
    }

    fn find_invoices(&self, lease_reference: &str) -> Vec<&Invoice> {
        self.invoices
            .iter()
            .filter(|i| i.lease_reference == lease_reference)
            .collect()
    }

    fn invoice(&self, id: InvoiceId) -> Result<&Invoice> {
        self.invoices
            .iter()
            .find(|i| i.id == id)
            .ok_or(LeaseError::InvoiceNotFound { id })
    }

    fn invoice_mut(&mut self, id: InvoiceId) -> Result<&mut Invoice> {
        self.invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(LeaseError::InvoiceNotFound { id })
    }

    fn remove_invoice(&mut self, id: InvoiceId) -> Result<Invoice> {
        let position = self
            .invoices
            .iter()
            .position(|i| i.id == id)
            .ok_or(LeaseError::InvoiceNotFound { id })?;
        Ok(self.invoices.remove(position))
    }

    fn next_number(&mut self, property_reference: &str) -> Result<String> {
        self.numerators
            .get_mut(property_reference)
            .ok_or_else(|| LeaseError::NumeratorNotFound {
                property_reference: property_reference.to_string(),
            })?
            .next()
    }
}
