use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Percentage};
use crate::interval::DateInterval;
use crate::types::{InvoiceId, InvoiceRunType, LeaseItemId};

/// all events emitted while verifying leases and calculating invoices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lease events
    TermCreated {
        lease_reference: String,
        lease_item_id: LeaseItemId,
        term_sequence: u32,
        start_date: NaiveDate,
        value: Money,
        timestamp: DateTime<Utc>,
    },
    IndexationApplied {
        lease_reference: String,
        lease_item_id: LeaseItemId,
        term_sequence: u32,
        percentage: Percentage,
        indexed_value: Money,
        timestamp: DateTime<Utc>,
    },
    IndexationPending {
        lease_reference: String,
        lease_item_id: LeaseItemId,
        term_sequence: u32,
        series: String,
        missing_period: DateInterval,
        timestamp: DateTime<Utc>,
    },
    LeaseTerminated {
        lease_reference: String,
        tenancy_end_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    // invoicing events
    InvoiceCreated {
        invoice_id: InvoiceId,
        lease_reference: String,
        due_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    InvoiceItemCalculated {
        invoice_id: InvoiceId,
        lease_item_id: LeaseItemId,
        effective_interval: DateInterval,
        net_amount: Money,
        run_type: InvoiceRunType,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
