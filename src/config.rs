use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::lease::{IndexationFrequency, InvoicingFrequency};
use crate::types::LeaseItemType;

/// engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub indexation: IndexationConfig,
    #[serde(default)]
    pub invoicing: InvoicingConfig,
}

/// rounding rules for indexation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexationConfig {
    /// decimals kept on the indexation percentage
    pub percentage_scale: u32,
    /// decimals kept on the indexed value
    pub value_scale: u32,
}

impl Default for IndexationConfig {
    fn default() -> Self {
        Self {
            percentage_scale: 1,
            value_scale: 2,
        }
    }
}

/// invoice numbering placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicingConfig {
    pub temporary_number_prefix: String,
    pub temporary_number_width: usize,
}

impl Default for InvoicingConfig {
    fn default() -> Self {
        Self {
            temporary_number_prefix: "Temp *".to_string(),
            temporary_number_width: 8,
        }
    }
}

impl InvoicingConfig {
    /// placeholder shown until an invoice is approved
    pub fn temporary_number(&self, sequence: u64) -> String {
        format!(
            "{}{:0width$}",
            self.temporary_number_prefix,
            sequence,
            width = self.temporary_number_width
        )
    }
}

impl EngineConfig {
    /// load from json, missing sections fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// lease item configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseItemConfig {
    pub item_type: LeaseItemType,
    pub charge: String,
    pub invoicing_frequency: InvoicingFrequency,
    pub indexation_frequency: IndexationFrequency,
    pub index_series: Option<String>,
}

impl LeaseItemConfig {
    /// indexed rent, quarterly in advance, reindexed every calendar year
    pub fn rent(charge: &str, index_series: &str) -> Self {
        Self {
            item_type: LeaseItemType::Rent,
            charge: charge.to_string(),
            invoicing_frequency: InvoicingFrequency::QuarterlyInAdvance,
            indexation_frequency: IndexationFrequency::CalendarYear,
            index_series: Some(index_series.to_string()),
        }
    }

    /// service charge, quarterly in advance, not indexed
    pub fn service_charge(charge: &str) -> Self {
        Self {
            item_type: LeaseItemType::ServiceCharge,
            charge: charge.to_string(),
            invoicing_frequency: InvoicingFrequency::QuarterlyInAdvance,
            indexation_frequency: IndexationFrequency::Never,
            index_series: None,
        }
    }

    /// turnover rent, settled yearly in arrears
    pub fn turnover_rent(charge: &str) -> Self {
        Self {
            item_type: LeaseItemType::TurnoverRent,
            charge: charge.to_string(),
            invoicing_frequency: InvoicingFrequency::YearlyInArrears,
            indexation_frequency: IndexationFrequency::Never,
            index_series: None,
        }
    }

    /// discount, invoiced alongside the rent
    pub fn discount(charge: &str) -> Self {
        Self {
            item_type: LeaseItemType::Discount,
            charge: charge.to_string(),
            invoicing_frequency: InvoicingFrequency::QuarterlyInAdvance,
            indexation_frequency: IndexationFrequency::Never,
            index_series: None,
        }
    }

    pub fn with_invoicing_frequency(mut self, frequency: InvoicingFrequency) -> Self {
        self.invoicing_frequency = frequency;
        self
    }

    pub fn with_indexation_frequency(mut self, frequency: IndexationFrequency) -> Self {
        self.indexation_frequency = frequency;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.indexation.percentage_scale, 1);
        assert_eq!(config.indexation.value_scale, 2);
        assert_eq!(config.invoicing.temporary_number(3), "Temp *00000003");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"indexation": {"percentage_scale": 2, "value_scale": 2}}"#).unwrap();
        assert_eq!(config.indexation.percentage_scale, 2);
        assert_eq!(config.invoicing, InvoicingConfig::default());

        let round_trip = EngineConfig::from_json(&config.to_json_pretty().unwrap()).unwrap();
        assert_eq!(round_trip, config);
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let err = EngineConfig::from_json("{").unwrap_err();
        assert!(matches!(err, crate::errors::LeaseError::Serialization(_)));
    }

    #[test]
    fn test_item_presets() {
        let rent = LeaseItemConfig::rent("ITA_RENT", "ISTAT-FOI");
        assert_eq!(rent.item_type, LeaseItemType::Rent);
        assert_eq!(rent.index_series.as_deref(), Some("ISTAT-FOI"));

        let sc = LeaseItemConfig::service_charge("ITA_SERVICE_CHARGE")
            .with_invoicing_frequency(InvoicingFrequency::MonthlyInAdvance);
        assert_eq!(sc.invoicing_frequency, InvoicingFrequency::MonthlyInAdvance);
        assert_eq!(sc.indexation_frequency, IndexationFrequency::Never);
    }
}
