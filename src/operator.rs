//! Search operator vocabulary.
//!
//! Clients spell comparisons many ways (`"gt"`, `">"`, `"more"`). Every
//! accepted spelling maps to exactly one [`Operator`]; the alias table is
//! built once and is immutable for the life of the process.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

/// Canonical comparison operators used internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    Contains,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Operator {
    /// All canonical operators, in table order.
    pub const ALL: [Operator; 6] = [
        Operator::Equals,
        Operator::Contains,
        Operator::Greater,
        Operator::GreaterOrEqual,
        Operator::Less,
        Operator::LessOrEqual,
    ];

    /// Surface tokens accepted for this operator.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Operator::Equals => &["eq", "==", "=", "match", "matches"],
            Operator::Contains => &["contain", "contains", "contained", "in"],
            Operator::Greater => &[">", "gt", "more"],
            Operator::GreaterOrEqual => &[">=", "gte", "ge"],
            Operator::Less => &["<", "lt", "less"],
            Operator::LessOrEqual => &["<=", "=<", "lte", "le"],
        }
    }

    /// Resolve a client token to its canonical operator.
    ///
    /// Matching is exact and case-sensitive. `None` is the normal answer for
    /// an unrecognised token, not a fault.
    pub fn resolve(token: &str) -> Option<Operator> {
        ALIASES.get(token).copied()
    }

    /// Whether this operator may be applied to values of `kind`.
    pub fn permits(self, kind: ValueKind) -> bool {
        match kind {
            ValueKind::Textual => matches!(self, Operator::Equals | Operator::Contains),
            ValueKind::Numeric => !matches!(self, Operator::Contains),
        }
    }

    /// Evaluate the operator on two floats. `Contains` never holds numerically.
    pub fn compare_f64(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Operator::Equals => lhs == rhs,
            Operator::Contains => false,
            Operator::Greater => lhs > rhs,
            Operator::GreaterOrEqual => lhs >= rhs,
            Operator::Less => lhs < rhs,
            Operator::LessOrEqual => lhs <= rhs,
        }
    }

    /// Evaluate the operator on two strings, ignoring case.
    ///
    /// Ordering operators have no textual meaning and never hold.
    pub fn compare_text(self, lhs: &str, rhs: &str) -> bool {
        match self {
            Operator::Equals => lhs.to_lowercase() == rhs.to_lowercase(),
            Operator::Contains => lhs.to_lowercase().contains(&rhs.to_lowercase()),
            _ => false,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operator::Equals => "equals",
            Operator::Contains => "contains",
            Operator::Greater => "greater",
            Operator::GreaterOrEqual => "greater_or_equal",
            Operator::Less => "less",
            Operator::LessOrEqual => "less_or_equal",
        };
        f.write_str(name)
    }
}

/// Whether a possibly-unresolved operator may be applied to `kind`.
///
/// An unresolved operator is compatible with nothing.
pub fn compatible(operator: Option<Operator>, kind: ValueKind) -> bool {
    operator.is_some_and(|op| op.permits(kind))
}

static ALIASES: LazyLock<HashMap<&'static str, Operator>> = LazyLock::new(|| {
    Operator::ALL
        .iter()
        .flat_map(|&op| op.aliases().iter().map(move |&alias| (alias, op)))
        .collect()
});
