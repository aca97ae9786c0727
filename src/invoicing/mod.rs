pub mod calculation;


use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{LeaseError, Result};
use crate::events::{Event, EventStore};
use crate::index::{IndexValueRepository, IndexationCalculator};
use crate::interval::{previous_day, DateInterval};
use crate::invoice::{InvoiceDraft, InvoiceItem, InvoiceStore};
use crate::lease::{InvoicingPeriod, Lease, LeaseItem, VerificationReport};
use crate::types::{InvoiceCalculationSelection, InvoiceId, InvoiceRunType, LeaseItemId};

pub use calculation::{calculate_period, PeriodCalculation};

/// parameters of one calculation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationParameters {
    pub run_type: InvoiceRunType,
    pub selection: InvoiceCalculationSelection,
    /// due date of invoices created by the run
    pub invoice_due_date: NaiveDate,
    /// first due date of the window, inclusive
    pub start_due_date: NaiveDate,
    /// end of the window, exclusive
    pub next_due_date: NaiveDate,
}

impl CalculationParameters {
    pub fn new(
        run_type: InvoiceRunType,
        selection: InvoiceCalculationSelection,
        invoice_due_date: NaiveDate,
        start_due_date: NaiveDate,
        next_due_date: NaiveDate,
    ) -> Self {
        Self {
            run_type,
            selection,
            invoice_due_date,
            start_due_date,
            next_due_date,
        }
    }

    pub fn normal_run(
        selection: InvoiceCalculationSelection,
        invoice_due_date: NaiveDate,
        start_due_date: NaiveDate,
        next_due_date: NaiveDate,
    ) -> Self {
        Self::new(InvoiceRunType::NormalRun, selection, invoice_due_date, start_due_date, next_due_date)
    }

    pub fn retro_run(
        selection: InvoiceCalculationSelection,
        invoice_due_date: NaiveDate,
        start_due_date: NaiveDate,
        next_due_date: NaiveDate,
    ) -> Self {
        Self::new(InvoiceRunType::RetroRun, selection, invoice_due_date, start_due_date, next_due_date)
    }

    pub fn validate(&self) -> Result<()> {
        if self.next_due_date < self.start_due_date {
            return Err(LeaseError::validation(format!(
                "next due date {} is before start due date {}",
                self.next_due_date, self.start_due_date
            )));
        }
        Ok(())
    }

    fn in_window(&self, due_date: NaiveDate) -> bool {
        self.start_due_date <= due_date && due_date < self.next_due_date
    }
}

/// outcome of a calculation run
#[derive(Debug, Clone, Default)]
pub struct CalculationResult {
    /// invoice receiving the items, none when nothing was emitted
    pub invoice_id: Option<InvoiceId>,
    pub items: Vec<InvoiceItem>,
    /// unapproved items replaced by this run
    pub removed_items: usize,
    pub verification: VerificationReport,
}

impl CalculationResult {
    pub fn total(&self) -> Money {
        self.items.iter().map(|i| i.net_amount).sum()
    }
}

/// invoice calculation service
#[derive(Debug, Clone, Default)]
pub struct InvoiceService {
    calculator: IndexationCalculator,
    events: EventStore,
}

impl InvoiceService {
    /// Uses the indexation rounding of `config`; temporary numbering belongs
    /// to the store, see [`Invoices::from_config`](crate::invoice::Invoices::from_config).
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            calculator: IndexationCalculator::new(config.indexation),
            events: EventStore::new(),
        }
    }

    /// Calculate the selected items of `lease` over the due date window and
    /// write the result into an open invoice.
    ///
    /// The lease is verified up to the last calculated period first. NEW
    /// items previously produced for the same items and periods are
    /// replaced.
    pub fn calculate(
        &mut self,
        lease: &mut Lease,
        params: &CalculationParameters,
        indices: &impl IndexValueRepository,
        invoices: &mut impl InvoiceStore,
        time_provider: &SafeTimeProvider,
    ) -> Result<CalculationResult> {
        params.validate()?;
        info!(
            lease = %lease.reference,
            run_type = ?params.run_type,
            selection = ?params.selection,
            start_due_date = %params.start_due_date,
            next_due_date = %params.next_due_date,
            "invoice calculation started"
        );

        let horizon = self.horizon(lease, params)?;
        let verification = lease.verify_until(horizon, indices, &self.calculator, time_provider)?;

        let lease_interval = lease.effective_interval();
        let mut calculated: Vec<(LeaseItemId, DateInterval)> = Vec::new();
        let mut items = Vec::new();

        for item in self.selected_items(lease, params) {
            let history = invoices.history_for(&lease.reference, item.id);
            for period in self.periods(item, params)? {
                match params.run_type {
                    InvoiceRunType::NormalRun => {
                        if !params.in_window(period.due_date) {
                            continue;
                        }
                        calculated.push((item.id, period.interval));
                        if history.iter().any(|h| h.effective_interval.overlaps(&period.interval)) {
                            debug!(lease = %lease.reference, charge = %item.charge, period = %period.interval, "period already invoiced");
                            continue;
                        }
                        let calculation = calculate_period(item, &period, &lease_interval)?;
                        if !calculation.amount.is_zero() {
                            items.push(self.invoice_item(item, &calculation, calculation.amount, params.run_type));
                        }
                    }
                    InvoiceRunType::RetroRun => {
                        calculated.push((item.id, period.interval));
                        let calculation = calculate_period(item, &period, &lease_interval)?;
                        let invoiced: Money = history
                            .iter()
                            .filter(|h| h.effective_interval.overlaps(&period.interval))
                            .map(|h| h.net_amount)
                            .sum();
                        let delta = calculation.amount - invoiced;
                        if !delta.is_zero() {
                            items.push(self.invoice_item(item, &calculation, delta, params.run_type));
                        }
                    }
                }
            }
        }

        items.sort_by_key(InvoiceItem::ordering_key);

        let removed_items = invoices.remove_new_items(&lease.reference, |existing| {
            calculated
                .iter()
                .any(|(id, period)| existing.lease_item_id == *id && existing.effective_interval.overlaps(period))
        })?;

        let invoice_id = if items.is_empty() {
            None
        } else {
            Some(self.write_items(lease, params, &items, invoices, time_provider)?)
        };

        let result = CalculationResult {
            invoice_id,
            items,
            removed_items,
            verification,
        };
        info!(
            lease = %lease.reference,
            items = result.items.len(),
            removed = result.removed_items,
            total = %result.total(),
            "invoice calculation finished"
        );
        Ok(result)
    }

    fn selected_items<'a>(&self, lease: &'a Lease, params: &CalculationParameters) -> Vec<&'a LeaseItem> {
        lease
            .items()
            .iter()
            .filter(|item| params.selection.includes(item.item_type))
            .collect()
    }

    /// invoicing periods of `item` considered by the run
    fn periods(&self, item: &LeaseItem, params: &CalculationParameters) -> Result<Vec<InvoicingPeriod>> {
        match item.first() {
            Some(first) => item
                .invoicing_frequency
                .periods_due_before(first.start_date, params.next_due_date),
            None => Ok(Vec::new()),
        }
    }

    /// last day any selected period covers
    fn horizon(&self, lease: &Lease, params: &CalculationParameters) -> Result<NaiveDate> {
        let mut horizon = previous_day(params.next_due_date)?;
        for item in self.selected_items(lease, params) {
            for period in self.periods(item, params)? {
                if let Some(end) = period.interval.end() {
                    horizon = horizon.max(end);
                }
            }
        }
        Ok(horizon)
    }

    fn invoice_item(
        &self,
        item: &LeaseItem,
        calculation: &PeriodCalculation,
        net_amount: Money,
        run_type: InvoiceRunType,
    ) -> InvoiceItem {
        InvoiceItem {
            id: Uuid::new_v4(),
            lease_item_id: item.id,
            lease_item_type: item.item_type,
            lease_item_sequence: item.sequence,
            lease_term_start: calculation.lease_term_start,
            due_date: calculation.period.due_date,
            effective_interval: calculation.effective_interval,
            net_amount,
            description: item.charge.clone(),
            run_type,
        }
    }

    fn write_items(
        &mut self,
        lease: &Lease,
        params: &CalculationParameters,
        items: &[InvoiceItem],
        invoices: &mut impl InvoiceStore,
        time_provider: &SafeTimeProvider,
    ) -> Result<InvoiceId> {
        let draft = InvoiceDraft::for_lease(lease, params.invoice_due_date);
        let invoice = match invoices.find_open_invoice(&draft) {
            Some(id) => invoices.invoice_mut(id)?,
            None => {
                let invoice = invoices.create_invoice(draft)?;
                info!(lease = %lease.reference, invoice = %invoice.number(), due_date = %invoice.due_date, "invoice created");
                self.events.emit(Event::InvoiceCreated {
                    invoice_id: invoice.id,
                    lease_reference: lease.reference.clone(),
                    due_date: invoice.due_date,
                    timestamp: time_provider.now(),
                });
                invoice
            }
        };

        invoice.add_items(items.iter().cloned())?;
        let invoice_id = invoice.id;

        let now = time_provider.now();
        for item in items {
            debug!(
                lease = %lease.reference,
                charge = %item.description,
                period = %item.effective_interval,
                amount = %item.net_amount,
                "invoice item calculated"
            );
            self.events.emit(Event::InvoiceItemCalculated {
                invoice_id,
                lease_item_id: item.lease_item_id,
                effective_interval: item.effective_interval,
                net_amount: item.net_amount,
                run_type: item.run_type,
                timestamp: now,
            });
        }
        Ok(invoice_id)
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}
