pub mod frequency;
pub mod item;
pub mod term;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LeaseItemConfig;
use crate::errors::{LeaseError, Result};
use crate::events::{Event, EventStore};
use crate::index::{IndexValueRepository, IndexationCalculator};
use crate::interval::DateInterval;
use crate::types::{LeaseItemId, LeaseItemType, PaymentMethod};

pub use frequency::{IndexationFrequency, InvoicingFrequency, InvoicingPeriod};
pub use item::{LeaseItem, TermIndexation};
pub use term::{Indexation, IndexationStatus, LeaseTerm, TermKind};

/// a lease between a landlord and a tenant on a unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub reference: String,
    pub name: String,
    pub property_reference: String,
    pub unit_reference: String,
    /// seller on invoices
    pub landlord: String,
    /// buyer on invoices
    pub tenant: String,
    pub payment_method: PaymentMethod,
    pub currency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub tenancy_end_date: Option<NaiveDate>,
    items: Vec<LeaseItem>,
    #[serde(skip)]
    events: EventStore,
}

/// what a verification changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    /// (item, term sequence) of generated terms
    pub created_terms: Vec<(LeaseItemId, u32)>,
    pub indexations: Vec<TermIndexation>,
}

impl VerificationReport {
    pub fn pending(&self) -> impl Iterator<Item = &TermIndexation> {
        self.indexations.iter().filter(|i| i.status == IndexationStatus::Pending)
    }
}

/// builder for leases
pub struct LeaseBuilder {
    reference: String,
    name: Option<String>,
    property_reference: Option<String>,
    unit_reference: Option<String>,
    landlord: Option<String>,
    tenant: Option<String>,
    payment_method: PaymentMethod,
    currency: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl LeaseBuilder {
    pub fn new(reference: &str) -> Self {
        Self {
            reference: reference.to_string(),
            name: None,
            property_reference: None,
            unit_reference: None,
            landlord: None,
            tenant: None,
            payment_method: PaymentMethod::DirectDebit,
            currency: "EUR".to_string(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn property(mut self, property_reference: &str) -> Self {
        self.property_reference = Some(property_reference.to_string());
        self
    }

    pub fn unit(mut self, unit_reference: &str) -> Self {
        self.unit_reference = Some(unit_reference.to_string());
        self
    }

    pub fn landlord(mut self, party: &str) -> Self {
        self.landlord = Some(party.to_string());
        self
    }

    pub fn tenant(mut self, party: &str) -> Self {
        self.tenant = Some(party.to_string());
        self
    }

    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn build(self) -> Result<Lease> {
        if self.reference.trim().is_empty() {
            return Err(LeaseError::validation("lease reference is required"));
        }
        let start_date = self
            .start_date
            .ok_or_else(|| LeaseError::validation(format!("lease {} needs a start date", self.reference)))?;
        DateInterval::new(Some(start_date), self.end_date).validate()?;

        let required = |value: Option<String>, what: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| LeaseError::validation(format!("lease {} needs a {}", self.reference, what)))
        };
        let property_reference = required(self.property_reference, "property")?;
        let unit_reference = required(self.unit_reference, "unit")?;
        let landlord = required(self.landlord, "landlord")?;
        let tenant = required(self.tenant, "tenant")?;

        Ok(Lease {
            name: self.name.unwrap_or_else(|| self.reference.clone()),
            reference: self.reference,
            property_reference,
            unit_reference,
            landlord,
            tenant,
            payment_method: self.payment_method,
            currency: self.currency,
            start_date,
            end_date: self.end_date,
            tenancy_end_date: None,
            items: Vec::new(),
            events: EventStore::new(),
        })
    }
}

impl Lease {
    pub fn builder(reference: &str) -> LeaseBuilder {
        LeaseBuilder::new(reference)
    }

    /// contractual interval
    pub fn interval(&self) -> DateInterval {
        DateInterval::new(Some(self.start_date), self.end_date)
    }

    /// interval during which charges accrue, shortened by termination
    pub fn effective_interval(&self) -> DateInterval {
        DateInterval::new(Some(self.start_date), self.tenancy_end_date.or(self.end_date))
    }

    pub fn items(&self) -> &[LeaseItem] {
        &self.items
    }

    /// add an item with no terms; the sequence is per item type
    pub fn new_item(&mut self, config: LeaseItemConfig) -> Result<LeaseItemId> {
        if config.charge.trim().is_empty() {
            return Err(LeaseError::validation("lease item needs a charge"));
        }
        let sequence = self.items.iter().filter(|i| i.item_type == config.item_type).count() as u32 + 1;
        let item = LeaseItem::new(
            &self.reference,
            config.item_type,
            sequence,
            &config.charge,
            config.invoicing_frequency,
            config.indexation_frequency,
            config.index_series,
        );
        let id = item.id;
        self.items.push(item);
        Ok(id)
    }

    pub fn item(&self, id: LeaseItemId) -> Result<&LeaseItem> {
        self.items
            .iter()
            .find(|i| i.id == id)
            .ok_or(LeaseError::LeaseItemNotFound { id })
    }

    pub fn item_mut(&mut self, id: LeaseItemId) -> Result<&mut LeaseItem> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(LeaseError::LeaseItemNotFound { id })
    }

    pub fn find_first_item_of_type(&self, item_type: LeaseItemType) -> Option<&LeaseItem> {
        self.items.iter().find(|i| i.item_type == item_type)
    }

    /// add a term to an item; the term must start within the lease
    pub fn add_term(&mut self, item_id: LeaseItemId, term: LeaseTerm) -> Result<u32> {
        if !self.interval().contains(term.start_date) {
            return Err(LeaseError::validation(format!(
                "term starting {} is outside lease {} ({})",
                term.start_date,
                self.reference,
                self.interval()
            )));
        }
        self.item_mut(item_id)?.add_term(term)
    }

    /// set the tenancy end date, terms are kept
    pub fn terminate(&mut self, date: NaiveDate, time_provider: &SafeTimeProvider) -> Result<()> {
        if !self.interval().contains(date) {
            return Err(LeaseError::validation(format!(
                "termination date {} is outside lease {} ({})",
                date,
                self.reference,
                self.interval()
            )));
        }

        self.tenancy_end_date = Some(date);
        info!(lease = %self.reference, tenancy_end_date = %date, "lease terminated");
        self.events.emit(Event::LeaseTerminated {
            lease_reference: self.reference.clone(),
            tenancy_end_date: date,
            timestamp: time_provider.now(),
        });
        Ok(())
    }

    /// Generate terms up to `horizon` and reindex every indexable term.
    ///
    /// Works on a copy of the items, the lease is only updated when every
    /// item verified. Missing index values leave the indexation pending.
    pub fn verify_until(
        &mut self,
        horizon: NaiveDate,
        indices: &impl IndexValueRepository,
        calculator: &IndexationCalculator,
        time_provider: &SafeTimeProvider,
    ) -> Result<VerificationReport> {
        let lease_interval = self.effective_interval();
        let mut items = self.items.clone();
        let mut report = VerificationReport::default();

        for item in items.iter_mut() {
            for sequence in item.generate_terms(horizon, &lease_interval)? {
                report.created_terms.push((item.id, sequence));
            }
            report.indexations.extend(item.index_terms(indices, calculator)?);
        }

        self.items = items;
        self.emit_verification_events(&report, time_provider)?;
        Ok(report)
    }

    fn emit_verification_events(&mut self, report: &VerificationReport, time_provider: &SafeTimeProvider) -> Result<()> {
        let now = time_provider.now();

        for (item_id, sequence) in &report.created_terms {
            let term = self
                .item(*item_id)?
                .term(*sequence)
                .ok_or_else(|| LeaseError::DataIntegrity {
                    context: format!("lease {}", self.reference),
                    message: format!("generated term {} not found", sequence),
                })?;
            debug!(lease = %self.reference, term = sequence, start = %term.start_date, "term generated");
            let event = Event::TermCreated {
                lease_reference: self.reference.clone(),
                lease_item_id: *item_id,
                term_sequence: *sequence,
                start_date: term.start_date,
                value: term.value,
                timestamp: now,
            };
            self.events.emit(event);
        }

        for outcome in &report.indexations {
            match (&outcome.status, outcome.missing_period) {
                (IndexationStatus::Applied { percentage, indexed_value }, _) if outcome.changed => {
                    debug!(lease = %self.reference, term = outcome.term_sequence, %percentage, %indexed_value, "indexation applied");
                    self.events.emit(Event::IndexationApplied {
                        lease_reference: self.reference.clone(),
                        lease_item_id: outcome.lease_item_id,
                        term_sequence: outcome.term_sequence,
                        percentage: *percentage,
                        indexed_value: *indexed_value,
                        timestamp: now,
                    });
                }
                (IndexationStatus::Pending, Some(period)) if outcome.changed => {
                    let series = self.item(outcome.lease_item_id)?.index_series.clone().unwrap_or_default();
                    warn!(lease = %self.reference, term = outcome.term_sequence, %series, %period, "index value missing, indexation pending");
                    self.events.emit(Event::IndexationPending {
                        lease_reference: self.reference.clone(),
                        lease_item_id: outcome.lease_item_id,
                        term_sequence: outcome.term_sequence,
                        series,
                        missing_period: period,
                        timestamp: now,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}
