pub mod budget;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod index;
pub mod interval;
pub mod invoice;
pub mod invoicing;
pub mod lease;
pub mod repository;
pub mod serialization;
pub mod types;

// re-export key types
pub use budget::{Budget, Budgets};
pub use config::{EngineConfig, IndexationConfig, InvoicingConfig, LeaseItemConfig};
pub use decimal::{Money, Percentage};
pub use errors::{LeaseError, Result};
pub use events::{Event, EventStore};
pub use index::{IndexValue, IndexValueRepository, IndexValues, IndexationCalculator, IndexationResult};
pub use interval::DateInterval;
pub use invoice::{Invoice, InvoiceDraft, InvoiceItem, InvoiceStore, Invoices, Numerator};
pub use invoicing::{CalculationParameters, CalculationResult, InvoiceService};
pub use lease::{
    Indexation, IndexationFrequency, IndexationStatus, InvoicingFrequency, Lease, LeaseBuilder, LeaseItem,
    LeaseTerm, TermKind, VerificationReport,
};
pub use repository::{LeaseRepository, Leases};
pub use serialization::{InvoiceView, LeaseItemView};
pub use types::{
    InvoiceCalculationSelection, InvoiceId, InvoiceItemId, InvoiceRunType, InvoiceStatus, LeaseItemId,
    LeaseItemType, PaymentMethod,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
