use serde::{Deserialize, Serialize};

use crate::errors::{LeaseError, Result};

/// per-property invoice number sequence
///
/// The format is printf-like with a single `%d` or zero padded `%0Nd`
/// placeholder, e.g. `OXF-%06d` yields `OXF-000001`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numerator {
    pub property_reference: String,
    pub format: String,
    pub last_increment: u64,
}

/// parsed `%0Nd` placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder {
    start: usize,
    len: usize,
    width: usize,
}

fn parse_format(format: &str) -> Result<Placeholder> {
    let invalid = || {
        LeaseError::validation(format!(
            "invoice number format '{}' needs exactly one %d or %0Nd placeholder",
            format
        ))
    };

    let start = format.find('%').ok_or_else(invalid)?;
    let rest = &format[start + 1..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if !rest[digits.len()..].starts_with('d') {
        return Err(invalid());
    }
    let len = 1 + digits.len() + 1;
    if format[start + len..].contains('%') {
        return Err(invalid());
    }
    if !digits.is_empty() && !digits.starts_with('0') {
        // space padding is not supported
        return Err(invalid());
    }
    let width = if digits.is_empty() {
        0
    } else {
        digits.parse::<usize>().map_err(|_| invalid())?
    };

    Ok(Placeholder { start, len, width })
}

impl Numerator {
    pub fn new(property_reference: &str, format: &str, last_increment: u64) -> Result<Self> {
        parse_format(format)?;
        Ok(Self {
            property_reference: property_reference.to_string(),
            format: format.to_string(),
            last_increment,
        })
    }

    /// render `value` with the numerator's format
    pub fn format_number(&self, value: u64) -> Result<String> {
        let placeholder = parse_format(&self.format)?;
        Ok(format!(
            "{}{:0width$}{}",
            &self.format[..placeholder.start],
            value,
            &self.format[placeholder.start + placeholder.len..],
            width = placeholder.width
        ))
    }

    /// increment and return the formatted number
    pub fn next(&mut self) -> Result<String> {
        let value = self.last_increment + 1;
        let number = self.format_number(value)?;
        self.last_increment = value;
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_numbers() {
        let mut numerator = Numerator::new("OXF", "OXF-%06d", 0).unwrap();
        assert_eq!(numerator.next().unwrap(), "OXF-000001");
        assert_eq!(numerator.next().unwrap(), "OXF-000002");
        assert_eq!(numerator.last_increment, 2);
    }

    #[test]
    fn test_start_value_and_suffix() {
        let mut numerator = Numerator::new("KAL", "INV/%d/KAL", 41).unwrap();
        assert_eq!(numerator.next().unwrap(), "INV/42/KAL");
    }

    #[test]
    fn test_invalid_formats() {
        for format in ["OXF-", "OXF-%s", "%d-%d", "OXF-%6d"] {
            let err = Numerator::new("OXF", format, 0).unwrap_err();
            assert!(matches!(err, LeaseError::Validation { .. }), "{}", format);
        }
    }
}
