//! Numeric/textual classification of property values.
//!
//! [`classify`] and [`numeric`] are the only places that decide whether a
//! value is a number. Ingestion uses them to fill `value_float`, the query
//! compiler uses them to pick operators, so both always agree.

use serde::{Deserialize, Serialize};

/// Whether a value is filtered numerically or textually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Numeric,
    Textual,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Numeric => f.write_str("numeric"),
            ValueKind::Textual => f.write_str("textual"),
        }
    }
}

/// Parse `value` as a float literal, tolerating surrounding whitespace.
///
/// Integers, signs, exponents, `inf` and `nan` are all accepted.
pub fn numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Classify a property value.
pub fn classify(value: &str) -> ValueKind {
    match numeric(value) {
        Some(_) => ValueKind::Numeric,
        None => ValueKind::Textual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_numeric() {
        for v in ["18", "-3", "+2.5", "1e3", "6.02E23", ".5", "7.", " 42 ", "inf"] {
            assert_eq!(classify(v), ValueKind::Numeric, "{v:?}");
        }
    }

    #[test]
    fn words_are_textual() {
        for v in ["cubic", "", "18 g", "1,5", "0x10", "e5", "--1"] {
            assert_eq!(classify(v), ValueKind::Textual, "{v:?}");
        }
    }

    #[test]
    fn classification_is_stable() {
        for v in ["18", "cubic", "1e-9", " "] {
            assert_eq!(classify(v), classify(v));
        }
    }

    #[test]
    fn numeric_value_matches_classification() {
        assert_eq!(numeric("18"), Some(18.0));
        assert_eq!(numeric("2.5e1"), Some(25.0));
        assert_eq!(numeric("hexagonal"), None);
    }
}
