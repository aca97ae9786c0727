//! serialization support for invoices and lease items
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Percentage};
use crate::interval::DateInterval;
use crate::invoice::Invoice;
use crate::lease::{IndexationStatus, LeaseItem, LeaseTerm};
use crate::types::{InvoiceId, InvoiceRunType, InvoiceStatus, LeaseItemId, LeaseItemType};

/// serializable view of an invoice
#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceView {
    pub id: InvoiceId,
    pub number: String,
    pub status: InvoiceStatus,
    pub lease_reference: String,
    pub seller: String,
    pub buyer: String,
    pub currency: String,
    pub due_date: NaiveDate,
    pub invoice_date: Option<NaiveDate>,
    pub total: Money,
    pub items: Vec<InvoiceItemView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceItemView {
    pub description: String,
    pub lease_item_type: LeaseItemType,
    pub due_date: NaiveDate,
    pub effective_interval: DateInterval,
    pub net_amount: Money,
    pub run_type: InvoiceRunType,
}

impl InvoiceView {
    pub fn from_invoice(invoice: &Invoice) -> Self {
        InvoiceView {
            id: invoice.id,
            number: invoice.number().to_string(),
            status: invoice.status(),
            lease_reference: invoice.lease_reference.clone(),
            seller: invoice.seller.clone(),
            buyer: invoice.buyer.clone(),
            currency: invoice.currency.clone(),
            due_date: invoice.due_date,
            invoice_date: invoice.invoice_date(),
            total: invoice.total(),
            items: invoice
                .items()
                .iter()
                .map(|item| InvoiceItemView {
                    description: item.description.clone(),
                    lease_item_type: item.lease_item_type,
                    due_date: item.due_date,
                    effective_interval: item.effective_interval,
                    net_amount: item.net_amount,
                    run_type: item.run_type,
                })
                .collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// serializable view of a lease item and its term chain
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaseItemView {
    pub id: LeaseItemId,
    pub lease_reference: String,
    pub item_type: LeaseItemType,
    pub sequence: u32,
    pub charge: String,
    pub invoicing_frequency: String,
    pub indexation_frequency: String,
    pub index_series: Option<String>,
    pub terms: Vec<TermView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TermView {
    pub sequence: u32,
    pub interval: DateInterval,
    pub value: Money,
    pub effective_value: Money,
    pub indexable: bool,
    pub indexation_percentage: Option<Percentage>,
    /// `applied`, `pending` or `not_applicable`; none for fixed terms
    pub indexation: Option<String>,
}

impl TermView {
    fn from_term(term: &LeaseTerm) -> Self {
        TermView {
            sequence: term.sequence,
            interval: term.interval(),
            value: term.value,
            effective_value: term.effective_value(),
            indexable: term.indexation().is_some(),
            indexation_percentage: term.indexation_percentage(),
            indexation: term.indexation().map(|i| {
                match i.status() {
                    IndexationStatus::Applied { .. } => "applied",
                    IndexationStatus::Pending => "pending",
                    IndexationStatus::NotApplicable => "not_applicable",
                }
                .to_string()
            }),
        }
    }
}

impl LeaseItemView {
    pub fn from_item(item: &LeaseItem) -> Self {
        LeaseItemView {
            id: item.id,
            lease_reference: item.lease_reference.clone(),
            item_type: item.item_type,
            sequence: item.sequence,
            charge: item.charge.clone(),
            invoicing_frequency: format!("{:?}", item.invoicing_frequency),
            indexation_frequency: format!("{:?}", item.indexation_frequency),
            index_series: item.index_series.clone(),
            terms: item.terms().iter().map(TermView::from_term).collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
