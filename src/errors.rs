use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::interval::DateInterval;
use crate::types::{InvoiceId, InvoiceStatus, LeaseItemId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeaseError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
    },

    #[error("invalid interval: {interval}")]
    InvalidInterval {
        interval: DateInterval,
    },

    #[error("interval {requested} overlaps existing {existing}")]
    OverlappingInterval {
        existing: DateInterval,
        requested: DateInterval,
    },

    #[error("missing index value for {series} in {period}")]
    MissingIndexValue {
        series: String,
        period: DateInterval,
    },

    #[error("illegal transition: cannot {action} invoice {invoice_id} in status {status:?}")]
    IllegalStateTransition {
        invoice_id: InvoiceId,
        status: InvoiceStatus,
        action: &'static str,
    },

    #[error("data integrity error ({context}): {message}")]
    DataIntegrity {
        context: String,
        message: String,
    },

    #[error("lease not found: {reference}")]
    LeaseNotFound {
        reference: String,
    },

    #[error("lease item not found: {id}")]
    LeaseItemNotFound {
        id: LeaseItemId,
    },

    #[error("invoice not found: {id}")]
    InvoiceNotFound {
        id: Uuid,
    },

    #[error("no invoice numerator for property {property_reference}")]
    NumeratorNotFound {
        property_reference: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LeaseError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        LeaseError::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn date_overflow(date: NaiveDate) -> Self {
        LeaseError::InvalidDate {
            message: format!("date arithmetic out of range from {}", date),
        }
    }

    /// missing index values stall indexation, they never abort a run
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LeaseError::MissingIndexValue { .. })
    }
}

impl From<serde_json::Error> for LeaseError {
    fn from(e: serde_json::Error) -> Self {
        LeaseError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LeaseError>;
