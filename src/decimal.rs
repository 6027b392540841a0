//! Exact decimal parsing for loosely formatted money and quantity text.

use std::str::FromStr;

use rust_decimal::Decimal;

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Result of parsing a numeric field.
///
/// Empty input is a valid zero. Anything that is not a plain decimal after
/// normalisation is `Invalid`, which reads as zero but must be reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecimalOutcome {
    Value(Decimal),
    Invalid,
}

impl DecimalOutcome {
    pub fn value(&self) -> Decimal {
        match self {
            DecimalOutcome::Value(v) => *v,
            DecimalOutcome::Invalid => Decimal::ZERO,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, DecimalOutcome::Invalid)
    }
}

/// Drop currency symbols and thousands separators, then trim.
pub fn normalize_number_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn parse_decimal(raw: &str) -> DecimalOutcome {
    let cleaned = normalize_number_text(raw);
    if cleaned.is_empty() {
        return DecimalOutcome::Value(Decimal::ZERO);
    }
    // `Decimal::from_str` accepts `_` digit separators; money text never should.
    if cleaned.contains('_') {
        return DecimalOutcome::Invalid;
    }
    match Decimal::from_str(&cleaned) {
        Ok(v) => DecimalOutcome::Value(v),
        Err(_) => DecimalOutcome::Invalid,
    }
}
